//! CLI interface for the resume scorecard

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-scorecard")]
#[command(about = "LLM-assisted resume scorecard for the finance sector")]
#[command(long_about = "Score the competencies in a resume with an LLM, check them against finance-sector minimums, and compute an affinity score")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a resume through the LLM
    Analyze {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Reference table file (TOML or JSON) with competency minimums
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output format: console, json, markdown, html, csv
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Save the raw LLM reply, for re-parsing later
        #[arg(long)]
        save_reply: Option<PathBuf>,

        /// List the strongest competencies first
        #[arg(long)]
        descending: bool,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// API key; defaults to the configured environment variable
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Score a saved LLM reply without calling the model
    Parse {
        /// File holding the raw reply
        #[arg(long)]
        reply: PathBuf,

        /// Reference table file (TOML or JSON) with competency minimums
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output format: console, json, markdown, html, csv
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// List the strongest competencies first
        #[arg(long)]
        descending: bool,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,

        /// Source name shown in the report
        #[arg(long)]
        source: Option<String>,
    },

    /// Reference table commands
    Reference {
        #[command(subcommand)]
        action: ReferenceAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ReferenceAction {
    /// List competency minimums
    Show {
        /// Reference table file; the built-in finance table when omitted
        #[arg(long)]
        reference: Option<PathBuf>,
    },

    /// Write the active reference table to a file (TOML or JSON)
    Export {
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        "html" => Ok(crate::config::OutputFormat::Html),
        "csv" => Ok(crate::config::OutputFormat::Csv),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown, html, csv", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
