//! Response normalizer: raw LLM reply in, ranked competency table out

use crate::scoring::extract::{extract_commentary, extract_structured_section};
use crate::scoring::reference::ReferenceTable;
use crate::scoring::validate::{validate_and_normalize, FieldAliases, ValidEntry};
use crate::scoring::ParseError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetencyStatus {
    MeetsMinimum,
    BelowMinimum,
}

impl CompetencyStatus {
    pub fn from_scores(score: f64, minimum: f64) -> Self {
        if score >= minimum {
            CompetencyStatus::MeetsMinimum
        } else {
            CompetencyStatus::BelowMinimum
        }
    }

    pub fn is_met(&self) -> bool {
        matches!(self, CompetencyStatus::MeetsMinimum)
    }
}

/// Order of the records in an [`AnalysisResult`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Lowest score first, so the areas needing attention lead
    #[default]
    Ascending,
    Descending,
}

/// One scored competency, checked against its minimum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetencyRecord {
    label: String,
    score: f64,
    minimum: f64,
    status: CompetencyStatus,
}

impl CompetencyRecord {
    fn new(label: String, score: f64, minimum: f64) -> Self {
        Self {
            status: CompetencyStatus::from_scores(score, minimum),
            label,
            score,
            minimum,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn status(&self) -> CompetencyStatus {
        self.status
    }

    /// Points missing to reach the minimum, zero when met
    pub fn gap(&self) -> f64 {
        (self.minimum - self.score).max(0.0)
    }
}

/// Outcome of normalizing one LLM reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub records: Vec<CompetencyRecord>,
    /// Mean score of the records listed in the reference table, one decimal
    pub affinity: Option<f64>,
    pub commentary: String,
}

impl AnalysisResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, label: &str) -> Option<&CompetencyRecord> {
        let label = label.trim();
        self.records.iter().find(|r| r.label == label)
    }

    pub fn below_minimum(&self) -> impl Iterator<Item = &CompetencyRecord> {
        self.records.iter().filter(|r| !r.status.is_met())
    }

    pub fn meeting_minimum(&self) -> impl Iterator<Item = &CompetencyRecord> {
        self.records.iter().filter(|r| r.status.is_met())
    }
}

/// Turns raw LLM replies into [`AnalysisResult`]s against one reference table.
///
/// Holds no mutable state; a single instance can serve any number of replies.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    reference: ReferenceTable,
    fields: FieldAliases,
    sort_order: SortOrder,
}

impl ResponseNormalizer {
    pub fn new(reference: ReferenceTable) -> Self {
        Self {
            reference,
            fields: FieldAliases::default(),
            sort_order: SortOrder::default(),
        }
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_field_aliases(mut self, fields: FieldAliases) -> Self {
        self.fields = fields;
        self
    }

    pub fn reference(&self) -> &ReferenceTable {
        &self.reference
    }

    /// Extract, validate and rank the competencies in `raw`
    pub fn normalize(&self, raw: &str) -> std::result::Result<AnalysisResult, ParseError> {
        let entries = extract_structured_section(raw)?;
        let valid = self.validate_and_normalize(&entries)
            .map_err(|kind| ParseError::new(kind, raw))?;

        Ok(self.build_result(valid, raw))
    }

    pub fn validate_and_normalize(
        &self,
        entries: &[serde_json::Value],
    ) -> std::result::Result<Vec<ValidEntry>, crate::scoring::ParseErrorKind> {
        validate_and_normalize(entries, &self.fields)
    }

    /// Attach minimums and status, drop repeated labels, rank, and compute
    /// the affinity and commentary.
    pub fn build_result(&self, entries: Vec<ValidEntry>, raw_text: &str) -> AnalysisResult {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            if !seen.insert(entry.label.clone()) {
                debug!("Ignoring repeated competency '{}' ({})", entry.label, entry.score);
                continue;
            }
            let minimum = self.reference.minimum_for(&entry.label);
            records.push(CompetencyRecord::new(entry.label, entry.score, minimum));
        }

        // Computed in input order so the sort direction cannot change the sum
        let affinity = self.affinity(&records);

        match self.sort_order {
            SortOrder::Ascending => records.sort_by(|a, b| a.score.total_cmp(&b.score)),
            SortOrder::Descending => records.sort_by(|a, b| b.score.total_cmp(&a.score)),
        }

        AnalysisResult {
            records,
            affinity,
            commentary: extract_commentary(raw_text),
        }
    }

    fn affinity(&self, records: &[CompetencyRecord]) -> Option<f64> {
        let matching: Vec<f64> = records
            .iter()
            .filter(|r| self.reference.contains(&r.label))
            .map(|r| r.score)
            .collect();

        if matching.is_empty() {
            return None;
        }

        let mean = matching.iter().sum::<f64>() / matching.len() as f64;
        Some(round_one_decimal(mean))
    }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
