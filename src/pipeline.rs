//! End-to-end scorecard pipeline: resume file to report

use crate::config::Config;
use crate::error::{Result, ScorecardError};
use crate::input::InputManager;
use crate::llm::{CompletionProvider, PromptParams, PromptTemplates};
use crate::output::report::{ReportMetadata, ScorecardReport, SummaryThresholds};
use crate::scoring::{ReferenceTable, ResponseNormalizer};
use log::info;
use std::path::Path;
use std::time::Instant;

/// Raw reply and the report built from it
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub raw_reply: String,
    pub report: ScorecardReport,
}

pub struct ScorecardPipeline<P: CompletionProvider> {
    provider: P,
    normalizer: ResponseNormalizer,
    templates: PromptTemplates,
    thresholds: SummaryThresholds,
    max_resume_chars: usize,
    input_manager: InputManager,
}

impl<P: CompletionProvider> ScorecardPipeline<P> {
    pub fn new(provider: P, config: &Config, reference: ReferenceTable) -> Self {
        let normalizer = ResponseNormalizer::new(reference)
            .with_sort_order(config.scoring.sort_order)
            .with_field_aliases(config.scoring.fields.clone());

        Self {
            provider,
            normalizer,
            templates: PromptTemplates::default(),
            thresholds: SummaryThresholds::from(&config.scoring),
            max_resume_chars: config.prompt.max_resume_chars,
            input_manager: InputManager::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn normalizer(&self) -> &ResponseNormalizer {
        &self.normalizer
    }

    /// Extract the resume, ask the model, and normalize its reply
    pub async fn run(&mut self, resume_path: &Path) -> Result<PipelineOutput> {
        let start_time = Instant::now();

        let resume_text = self.input_manager.extract_text(resume_path).await?;
        info!("Extracted {} characters from {}", resume_text.chars().count(), resume_path.display());

        let prompt = self.templates.render_scorecard(&PromptParams {
            resume_content: resume_text,
            max_resume_chars: self.max_resume_chars,
        });

        info!("Requesting scorecard from {}", self.provider.model_name());
        let completion = self.provider.complete(&prompt).await?;
        if completion.text.trim().is_empty() {
            return Err(ScorecardError::LlmResponse("LLM returned an empty reply".to_string()));
        }

        let result = self.normalizer.normalize(&completion.text)?;
        info!("Normalized {} competencies", result.len());

        let metadata = ReportMetadata::new(
            Some(resume_path.to_string_lossy().to_string()),
            self.provider.model_name(),
            start_time.elapsed().as_millis() as u64,
        );

        Ok(PipelineOutput {
            report: ScorecardReport::new(result, self.thresholds, metadata),
            raw_reply: completion.text,
        })
    }
}

/// Normalize a saved reply without calling any model
pub fn analyze_reply(
    raw: &str,
    normalizer: &ResponseNormalizer,
    thresholds: SummaryThresholds,
    source: Option<String>,
) -> Result<ScorecardReport> {
    let start_time = Instant::now();

    if raw.trim().is_empty() {
        return Err(ScorecardError::InvalidInput("Reply is empty".to_string()));
    }

    let result = normalizer.normalize(raw)?;
    let metadata = ReportMetadata::new(source, "offline", start_time.elapsed().as_millis() as u64);
    Ok(ScorecardReport::new(result, thresholds, metadata))
}
