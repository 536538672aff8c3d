//! Report structures built from a normalized analysis

use crate::config::ScoringConfig;
use crate::scoring::normalizer::round_one_decimal;
use crate::scoring::{AnalysisResult, CompetencyRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scorecard report: the normalized result plus derived metrics
#[derive(Debug, Clone, Serialize)]
pub struct ScorecardReport {
    pub result: AnalysisResult,

    /// Headline metrics and distributions
    pub summary: ScorecardSummary,

    /// Report metadata and generation info
    pub metadata: ReportMetadata,
}

/// Display band of a single score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::High => "High",
            Level::Medium => "Medium",
            Level::Low => "Low",
        }
    }
}

/// Verdict on the affinity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AffinityVerdict {
    Excellent,
    Good,
    Low,
    /// No competency matched the reference table
    Unavailable,
}

impl AffinityVerdict {
    pub fn description(&self) -> &'static str {
        match self {
            AffinityVerdict::Excellent => "Excellent fit for the finance sector",
            AffinityVerdict::Good => "Good fit, with room for targeted improvement",
            AffinityVerdict::Low => "Low fit; key finance competencies need strengthening",
            AffinityVerdict::Unavailable => "No competency matched the reference table",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryThresholds {
    pub high_level: f64,
    pub medium_level: f64,
    pub excellent_affinity: f64,
    pub good_affinity: f64,
}

impl Default for SummaryThresholds {
    fn default() -> Self {
        Self {
            high_level: 80.0,
            medium_level: 60.0,
            excellent_affinity: 75.0,
            good_affinity: 60.0,
        }
    }
}

impl From<&ScoringConfig> for SummaryThresholds {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            high_level: config.high_level_threshold,
            medium_level: config.medium_level_threshold,
            excellent_affinity: config.excellent_affinity_threshold,
            good_affinity: config.good_affinity_threshold,
        }
    }
}

impl SummaryThresholds {
    pub fn level_for(&self, score: f64) -> Level {
        if score >= self.high_level {
            Level::High
        } else if score >= self.medium_level {
            Level::Medium
        } else {
            Level::Low
        }
    }

    pub fn verdict_for(&self, affinity: Option<f64>) -> AffinityVerdict {
        match affinity {
            None => AffinityVerdict::Unavailable,
            Some(a) if a >= self.excellent_affinity => AffinityVerdict::Excellent,
            Some(a) if a >= self.good_affinity => AffinityVerdict::Good,
            Some(_) => AffinityVerdict::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorecardSummary {
    pub total_competencies: usize,
    /// Mean of all scores, one decimal
    pub mean_score: f64,
    pub max_score: f64,
    /// Records in the high band
    pub high_count: usize,
    pub level_distribution: LevelDistribution,
    pub meeting_minimum: usize,
    pub below_minimum: usize,
    pub affinity: Option<f64>,
    pub affinity_verdict: AffinityVerdict,
    pub thresholds: SummaryThresholds,
}

impl ScorecardSummary {
    pub fn from_result(result: &AnalysisResult, thresholds: SummaryThresholds) -> Self {
        let total = result.records.len();
        let scores: Vec<f64> = result.records.iter().map(|r| r.score()).collect();

        let mean_score = if total == 0 {
            0.0
        } else {
            round_one_decimal(scores.iter().sum::<f64>() / total as f64)
        };
        let max_score = scores.iter().copied().fold(0.0, f64::max);

        let mut distribution = LevelDistribution::default();
        for score in &scores {
            match thresholds.level_for(*score) {
                Level::High => distribution.high += 1,
                Level::Medium => distribution.medium += 1,
                Level::Low => distribution.low += 1,
            }
        }

        let meeting_minimum = result.meeting_minimum().count();

        Self {
            total_competencies: total,
            mean_score,
            max_score,
            high_count: distribution.high,
            level_distribution: distribution,
            meeting_minimum,
            below_minimum: total - meeting_minimum,
            affinity: result.affinity,
            affinity_verdict: thresholds.verdict_for(result.affinity),
            thresholds,
        }
    }

    pub fn level_of(&self, record: &CompetencyRecord) -> Level {
        self.thresholds.level_for(record.score())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub scorecard_version: String,
    /// Resume or reply file the analysis came from
    pub source_file: Option<String>,
    /// Model that produced the reply, `offline` for saved replies
    pub model_used: String,
    pub processing_time_ms: u64,
}

impl ReportMetadata {
    pub fn new(source_file: Option<String>, model_used: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            generated_at: Utc::now(),
            scorecard_version: env!("CARGO_PKG_VERSION").to_string(),
            source_file,
            model_used: model_used.into(),
            processing_time_ms,
        }
    }

    /// File name of the source, without directories
    pub fn source_name(&self) -> String {
        self.source_file
            .as_deref()
            .map(|s| {
                std::path::Path::new(s)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| s.to_string())
            })
            .unwrap_or_else(|| "-".to_string())
    }
}

impl ScorecardReport {
    pub fn new(result: AnalysisResult, thresholds: SummaryThresholds, metadata: ReportMetadata) -> Self {
        let summary = ScorecardSummary::from_result(&result, thresholds);
        Self {
            result,
            summary,
            metadata,
        }
    }
}
