//! Error handling for the resume scorecard application

use crate::scoring::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScorecardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Text processing error: {0}")]
    TextProcessing(String),

    #[error("LLM request error: {0}")]
    LlmRequest(String),

    #[error("LLM response error: {0}")]
    LlmResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ScorecardError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ScorecardError {
    fn from(err: anyhow::Error) -> Self {
        ScorecardError::InvalidInput(format!("{:#}", err))
    }
}

impl ScorecardError {
    /// Raw LLM reply attached to a normalization failure, if any
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            ScorecardError::Parse(err) => Some(err.raw_reply()),
            _ => None,
        }
    }
}
