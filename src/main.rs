//! Resume scorecard: LLM-assisted competency scoring for finance-sector resumes

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_scorecard::cli::{self, Cli, Commands, ConfigAction, ReferenceAction};
use resume_scorecard::config::{Config, OutputFormat};
use resume_scorecard::error::{Result, ScorecardError};
use resume_scorecard::llm::OpenAiClient;
use resume_scorecard::output::formatter::{save_report_to_file, ReportGenerator};
use resume_scorecard::output::report::{ScorecardReport, SummaryThresholds};
use resume_scorecard::pipeline::{analyze_reply, ScorecardPipeline};
use resume_scorecard::scoring::{ResponseNormalizer, SortOrder};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        // The reply is shown as-is so it can be fixed and re-parsed
        if let Some(raw) = e.raw_reply() {
            eprint!("{}", raw_reply_block(raw));
        }
        process::exit(1);
    }
}

/// Header plus the unmodified reply, written to stderr as one block
fn raw_reply_block(raw: &str) -> String {
    format!("\n--- Raw LLM reply ---\n{}\n", raw)
}

/// How a finished report is rendered and where it goes
struct OutputOptions {
    output: Option<String>,
    detailed: bool,
    save: Option<PathBuf>,
}

async fn run_command(command: Commands, mut config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            reference,
            output,
            save,
            save_reply,
            descending,
            detailed,
            model,
            api_key,
        } => {
            info!("Starting resume scorecard analysis");

            // Credentials are checked before any file is read
            let api_key = config.api_key(api_key)?;
            if let Some(model) = model {
                config.llm.model = model;
            }
            if descending {
                config.scoring.sort_order = SortOrder::Descending;
            }

            cli::validate_file_extension(&resume, &["pdf", "txt", "md", "markdown"])
                .map_err(|e| ScorecardError::InvalidInput(format!("Resume file: {}", e)))?;

            let reference_table = config.reference_table(reference.as_deref())?;
            let client = OpenAiClient::new(config.llm.clone(), api_key)?;
            let mut pipeline = ScorecardPipeline::new(client, &config, reference_table);

            println!("🚀 Resume scorecard analysis");
            println!("📄 Resume: {}", resume.display());
            println!("🤖 Model: {}", config.llm.model);

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .map_err(|e| ScorecardError::OutputFormatting(e.to_string()))?,
            );
            spinner.set_message("Analyzing resume...");
            spinner.enable_steady_tick(Duration::from_millis(100));

            let outcome = pipeline.run(&resume).await;
            spinner.finish_and_clear();

            let output_report = match outcome {
                Ok(out) => {
                    if let Some(path) = &save_reply {
                        save_report_to_file(&out.raw_reply, path)?;
                        println!("💾 Raw reply saved to: {}", path.display());
                    }
                    out.report
                }
                Err(e) => {
                    if let (Some(path), Some(raw)) = (&save_reply, e.raw_reply()) {
                        save_report_to_file(raw, path)?;
                        println!("💾 Raw reply saved to: {}", path.display());
                    }
                    return Err(e);
                }
            };

            emit_report(&output_report, &config, OutputOptions { output, detailed, save })?;
        }

        Commands::Parse {
            reply,
            reference,
            output,
            save,
            descending,
            detailed,
            source,
        } => {
            info!("Parsing saved reply: {}", reply.display());
            if descending {
                config.scoring.sort_order = SortOrder::Descending;
            }

            let raw = tokio::fs::read_to_string(&reply).await?;
            let normalizer = ResponseNormalizer::new(config.reference_table(reference.as_deref())?)
                .with_sort_order(config.scoring.sort_order)
                .with_field_aliases(config.scoring.fields.clone());

            let source = source.or_else(|| Some(reply.to_string_lossy().to_string()));
            let report = analyze_reply(&raw, &normalizer, SummaryThresholds::from(&config.scoring), source)?;

            emit_report(&report, &config, OutputOptions { output, detailed, save })?;
        }

        Commands::Reference { action } => match action {
            ReferenceAction::Show { reference } => {
                let table = config.reference_table(reference.as_deref())?;
                println!("📋 Reference Table ({} competencies)\n", table.len());
                let width = table.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
                for (label, minimum) in table.iter() {
                    println!("  {:<width$}  {:>5.1}", label, minimum, width = width);
                }
                println!("\nDefault minimum for unlisted competencies: {:.1}", table.default_minimum());
            }

            ReferenceAction::Export { path } => {
                let table = config.reference_table(None)?;
                table.save(&path)?;
                println!("✅ Reference table written to: {}", path.display());
            }
        },

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("⚙️  Current Configuration ({})\n", config_path.display());
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| ScorecardError::Configuration(format!("Failed to serialize config: {}", e)))?;
                println!("{}", content);
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save_to(config_path)?;
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },
    }

    Ok(())
}

fn emit_report(report: &ScorecardReport, config: &Config, options: OutputOptions) -> Result<()> {
    let format = match options.output {
        Some(name) => cli::parse_output_format(&name).map_err(ScorecardError::InvalidInput)?,
        None => config.output.format,
    };

    // Escape codes stay out of saved files
    let use_colors = config.output.color_output && options.save.is_none();
    let generator = ReportGenerator::with_options(
        use_colors,
        options.detailed || config.output.detailed,
        config.output.pretty_json,
        true,
        true,
    );
    let content = generator.generate_report(report, &format)?;

    match options.save {
        Some(path) => {
            save_report_to_file(&content, &path)?;
            println!("💾 Report saved to: {}", path.display());
            if format != OutputFormat::Console {
                info!("Saved {:?} report ({} bytes)", format, content.len());
            }
        }
        None => print!("{}", content),
    }

    Ok(())
}
