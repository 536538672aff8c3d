//! Resume scorecard library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod scoring;

pub use error::{Result, ScorecardError};
pub use config::Config;
pub use scoring::{AnalysisResult, ParseError, ParseErrorKind, ReferenceTable, ResponseNormalizer};
