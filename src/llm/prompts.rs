//! Scorecard prompt for finance-sector resume analysis

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub scorecard: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            scorecard: SCORECARD_TEMPLATE.to_string(),
        }
    }
}

/// Parameters for prompt template substitution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptParams {
    pub resume_content: String,
    /// Resume text beyond this many characters is not sent
    pub max_resume_chars: usize,
}

impl PromptTemplates {
    pub fn render_scorecard(&self, params: &PromptParams) -> String {
        let resume = truncate_graphemes(params.resume_content.trim(), params.max_resume_chars);
        log::debug!(
            "Rendering scorecard prompt with {} of {} resume characters",
            resume.chars().count(),
            params.resume_content.chars().count()
        );
        self.scorecard.replace("{resume}", resume)
    }
}

/// Longest prefix of at most `max` grapheme clusters
fn truncate_graphemes(text: &str, max: usize) -> &str {
    match text.grapheme_indices(true).nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

const SCORECARD_TEMPLATE: &str = r#"Você é um consultor de carreira especializado em perfis voltados para o setor financeiro. Sua tarefa é analisar o currículo abaixo com base em competências valorizadas nesse mercado.

**IMPORTANTE: Responda EXATAMENTE no formato especificado.**

**Parte 1 – Análise Quantitativa (JSON)**
- Identifique as principais **áreas de competência profissional** (ex: Finanças, Economia, Risco, Análise de Dados, Excel, Programação, Comunicação, etc.).
- Para cada área, atribua uma nota de **0 a 100**, com base nas evidências fornecidas no texto. **Não infira habilidades não mencionadas.**
- A resposta deve estar no formato JSON conforme exemplo:

[
  {"Área": "Gestão Financeira", "Pontuação": 82},
  {"Área": "Excel Avançado", "Pontuação": 78}
]

**Parte 2 – Análise Qualitativa (em português)**
- **Pontos Fortes:** qualidades mais evidentes
- **Pontos de Melhoria:** pontos que podem ser melhor desenvolvidos ou explicitados
- **Sugestões:** recomendações práticas para aprimorar o currículo para o mercado financeiro

Texto do currículo:
"""
{resume}
""""#;

#[cfg(test)]
mod tests {
    use super::*;

    fn params(resume: &str, max: usize) -> PromptParams {
        PromptParams {
            resume_content: resume.to_string(),
            max_resume_chars: max,
        }
    }

    #[test]
    fn test_scorecard_rendering() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_scorecard(&params("Analista financeiro com Excel e SQL.", 4000));

        assert!(prompt.contains("Analista financeiro com Excel e SQL."));
        assert!(prompt.contains("\"Pontuação\""));
        assert!(prompt.contains("Parte 2"));
        assert!(!prompt.contains("{resume}"));
    }

    #[test]
    fn test_resume_is_truncated() {
        let templates = PromptTemplates::default();
        let long = "ç".repeat(50);
        let prompt = templates.render_scorecard(&params(&long, 10));

        assert!(prompt.contains(&"ç".repeat(10)));
        assert!(!prompt.contains(&"ç".repeat(11)));
    }

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate_graphemes("abc", 10), "abc");
        assert_eq!(truncate_graphemes("abcdef", 3), "abc");
        assert_eq!(truncate_graphemes("", 3), "");
    }
}
