//! Reference tables of minimum acceptable scores per competency

use crate::error::{Result, ScorecardError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Minimum assigned to competencies the table does not know
pub const DEFAULT_MINIMUM: f64 = 55.0;

/// Finance-sector minimums used when no other table is supplied
const FINANCE_SECTOR_MINIMUMS: &[(&str, f64)] = &[
    ("Finanças", 80.0),
    ("Economia", 85.0),
    ("Mercado Financeiro", 82.0),
    ("Contabilidade", 78.0),
    ("Contabilidade Gerencial", 75.0),
    ("Análise de Demonstrativos Financeiros", 83.0),
    ("Controladoria", 75.0),
    ("Tesouraria", 76.0),
    ("Gestão Orçamentária", 80.0),
    ("Planejamento Financeiro", 82.0),
    ("Análise de Investimentos", 82.0),
    ("Valuation", 83.0),
    ("Modelagem Financeira", 84.0),
    ("Riscos Financeiros", 80.0),
    ("Compliance", 75.0),
    ("Auditoria", 78.0),
    ("Governança Corporativa", 76.0),
    ("Gestão de Ativos", 80.0),
    ("Gestão de Riscos", 80.0),
    ("Excel", 92.0),
    ("Excel Avançado", 90.0),
    ("Power BI", 80.0),
    ("SQL", 75.0),
    ("Python", 78.0),
    ("R", 75.0),
    ("VBA", 70.0),
    ("Access", 65.0),
    ("ETL", 70.0),
    ("Análise de Dados", 82.0),
    ("Business Intelligence", 80.0),
    ("Data Analytics", 82.0),
    ("Big Data", 70.0),
    ("Dashboards", 78.0),
    ("CVM", 75.0),
    ("Bacen", 75.0),
    ("IFRS", 80.0),
    ("Normas Contábeis", 77.0),
    ("Regulação Bancária", 78.0),
    ("Inglês", 85.0),
    ("Espanhol", 70.0),
    ("Comunicação Escrita", 80.0),
    ("Comunicação Oral", 78.0),
    ("Apresentações Executivas", 80.0),
    ("Gestão de Projetos", 75.0),
    ("Liderança", 78.0),
    ("Tomada de Decisão", 80.0),
    ("Pensamento Crítico", 82.0),
    ("Resolução de Problemas", 80.0),
    ("Trabalho em Equipe", 78.0),
    ("Autonomia", 76.0),
    ("Proatividade", 78.0),
    ("Ética Profissional", 85.0),
    ("Organização", 75.0),
];

const DEFAULT_MINIMUM_KEY: &str = "default_minimum";

/// Read-only mapping from competency label to minimum score.
///
/// Labels are matched exactly after trimming. Every minimum, including the
/// fallback, lies in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceTable {
    default_minimum: f64,
    minimums: BTreeMap<String, f64>,
}

/// On-disk layouts accepted by [`ReferenceTable::load`]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReferenceFile {
    Full {
        #[serde(default)]
        default_minimum: Option<f64>,
        minimums: BTreeMap<String, f64>,
    },
    Flat(BTreeMap<String, f64>),
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::finance_sector()
    }
}

impl ReferenceTable {
    /// Empty table with the given fallback minimum
    pub fn new(default_minimum: f64) -> Result<Self> {
        check_range("default_minimum", default_minimum)?;
        Ok(Self {
            default_minimum,
            minimums: BTreeMap::new(),
        })
    }

    /// The built-in finance-sector table
    pub fn finance_sector() -> Self {
        Self {
            default_minimum: DEFAULT_MINIMUM,
            minimums: FINANCE_SECTOR_MINIMUMS
                .iter()
                .map(|(label, minimum)| (label.to_string(), *minimum))
                .collect(),
        }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = Self::new(DEFAULT_MINIMUM)?;
        for (label, minimum) in pairs {
            table.insert(label.as_ref(), minimum)?;
        }
        Ok(table)
    }

    pub fn with_default_minimum(mut self, default_minimum: f64) -> Result<Self> {
        check_range("default_minimum", default_minimum)?;
        self.default_minimum = default_minimum;
        Ok(self)
    }

    pub fn insert(&mut self, label: &str, minimum: f64) -> Result<()> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ScorecardError::Configuration(
                "Reference table labels must not be empty".to_string(),
            ));
        }
        check_range(label, minimum)?;
        self.minimums.insert(label.to_string(), minimum);
        Ok(())
    }

    /// Minimum for `label`, falling back to the table default
    pub fn minimum_for(&self, label: &str) -> f64 {
        self.explicit_minimum(label).unwrap_or(self.default_minimum)
    }

    /// Minimum for `label` only when the table lists it
    pub fn explicit_minimum(&self, label: &str) -> Option<f64> {
        self.minimums.get(label.trim()).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.minimums.contains_key(label.trim())
    }

    pub fn default_minimum(&self) -> f64 {
        self.default_minimum
    }

    pub fn len(&self) -> usize {
        self.minimums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minimums.is_empty()
    }

    /// Entries in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.minimums.iter().map(|(label, minimum)| (label.as_str(), *minimum))
    }

    /// Load a table from a `.toml` or `.json` file.
    ///
    /// Both a flat `label = minimum` mapping and the full layout with
    /// `default_minimum` and a `minimums` section are accepted. A file
    /// without `default_minimum` falls back to [`DEFAULT_MINIMUM`].
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_default(path, DEFAULT_MINIMUM)
    }

    /// Like [`ReferenceTable::load`], with `fallback_default` used when the
    /// file sets no `default_minimum`
    pub fn load_with_default(path: &Path, fallback_default: f64) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference table {}", path.display()))?;

        let file: ReferenceFile = match extension(path).as_deref() {
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                ScorecardError::Configuration(format!("Invalid reference table {}: {}", path.display(), e))
            })?,
            Some("toml") => toml::from_str(&content).map_err(|e| {
                ScorecardError::Configuration(format!("Invalid reference table {}: {}", path.display(), e))
            })?,
            _ => {
                return Err(ScorecardError::UnsupportedFormat(format!(
                    "Reference table must be .toml or .json: {}",
                    path.display()
                )))
            }
        };

        let (default_minimum, minimums) = match file {
            ReferenceFile::Full { default_minimum, minimums } => (default_minimum, minimums),
            ReferenceFile::Flat(mut minimums) => {
                // A top-level default is a setting, not a competency
                let default_minimum = minimums.remove(DEFAULT_MINIMUM_KEY);
                (default_minimum, minimums)
            }
        };

        let mut table = Self::new(default_minimum.unwrap_or(fallback_default))?;
        for (label, minimum) in minimums {
            table.insert(&label, minimum)?;
        }
        Ok(table)
    }

    /// Write the table in the full layout, format chosen by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match extension(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self).map_err(|e| {
                ScorecardError::Configuration(format!("Failed to serialize reference table: {}", e))
            })?,
            _ => {
                return Err(ScorecardError::UnsupportedFormat(format!(
                    "Reference table must be .toml or .json: {}",
                    path.display()
                )))
            }
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn check_range(name: &str, minimum: f64) -> Result<()> {
    if (0.0..=100.0).contains(&minimum) {
        Ok(())
    } else {
        Err(ScorecardError::Configuration(format!(
            "Minimum for '{}' must be between 0 and 100, got {}",
            name, minimum
        )))
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
