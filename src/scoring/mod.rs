//! Competency scoring module
//! Turns a free-form LLM reply into a validated, ranked competency table

pub mod extract;
pub mod validate;
pub mod reference;
pub mod normalizer;

use thiserror::Error;

pub use extract::{extract_commentary, extract_structured_section};
pub use normalizer::{AnalysisResult, CompetencyRecord, CompetencyStatus, ResponseNormalizer, SortOrder};
pub use reference::{ReferenceTable, DEFAULT_MINIMUM};
pub use validate::{validate_and_normalize, FieldAliases, ValidEntry};

/// Why a reply could not be turned into a competency table
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("no structured competency data found in the LLM reply")]
    NoStructuredData,

    #[error("structured data was found but no entry had a valid label and a score between 0 and 100")]
    NoValidEntries,
}

/// Normalization failure, carrying the raw reply so it can be shown verbatim
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct ParseError {
    kind: ParseErrorKind,
    raw_reply: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, raw_reply: impl Into<String>) -> Self {
        Self {
            kind,
            raw_reply: raw_reply.into(),
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    pub fn raw_reply(&self) -> &str {
        &self.raw_reply
    }
}
