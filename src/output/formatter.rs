//! Output formatters for scorecard reports

use crate::config::OutputFormat;
use crate::error::{Result, ScorecardError};
use crate::output::report::*;
use crate::scoring::{CompetencyRecord, CompetencyStatus};
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting scorecard reports
pub trait OutputFormatter {
    fn format_report(&self, report: &ScorecardReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors and level badges
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct HtmlFormatter {
    include_styles: bool,
}

/// One row per competency, for spreadsheets
pub struct CsvFormatter;

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
    csv_formatter: CsvFormatter,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Resume Scorecard</title>
    {% if include_styles %}
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            background: #f8f9fa;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        .header {
            text-align: center;
            margin-bottom: 30px;
            border-bottom: 3px solid #007acc;
            padding-bottom: 20px;
        }
        .metrics {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
            gap: 15px;
            margin: 20px 0;
        }
        .metric {
            background: #f8f9fa;
            padding: 15px;
            border-radius: 6px;
            border-left: 4px solid #007acc;
        }
        .section h2 {
            color: #007acc;
            border-bottom: 2px solid #e9ecef;
            padding-bottom: 10px;
        }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 8px; border-bottom: 1px solid #e9ecef; text-align: left; }
        .level-high { color: #28a745; font-weight: bold; }
        .level-medium { color: #b8860b; font-weight: bold; }
        .level-low { color: #dc3545; font-weight: bold; }
        .status-below { color: #dc3545; }
        .commentary {
            background: #f8f9fa;
            padding: 15px;
            border-radius: 6px;
            border-left: 4px solid #17a2b8;
            white-space: pre-wrap;
        }
        .metadata {
            background: #e9ecef;
            padding: 15px;
            border-radius: 6px;
            margin-top: 30px;
            font-size: 0.9em;
            color: #6c757d;
        }
    </style>
    {% endif %}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>📊 Resume Scorecard</h1>
            <p>Generated: {{ generated_at }} | Processing time: {{ processing_time }}ms</p>
        </div>

        <div class="section">
            <h2>Summary</h2>
            <div class="metrics">
                <div class="metric"><h4>Mean score</h4><p><strong>{{ mean_score }}</strong></p></div>
                <div class="metric"><h4>High level</h4><p><strong>{{ high_count }}</strong></p></div>
                <div class="metric"><h4>Competencies</h4><p><strong>{{ total }}</strong></p></div>
                <div class="metric"><h4>Max score</h4><p><strong>{{ max_score }}</strong></p></div>
            </div>
            <p><strong>Finance affinity:</strong> {{ affinity }} ({{ verdict }})</p>
        </div>

        <div class="section">
            <h2>Competencies</h2>
            <table>
                <tr><th>Competency</th><th>Score</th><th>Minimum</th><th>Status</th><th>Level</th></tr>
                {% for row in rows %}
                <tr>
                    <td>{{ row.label }}</td>
                    <td>{{ row.score }}</td>
                    <td>{{ row.minimum }}</td>
                    <td class="{{ row.status_class }}">{{ row.status }}</td>
                    <td class="{{ row.level_class }}">{{ row.level }}</td>
                </tr>
                {% endfor %}
            </table>
        </div>

        {% if has_commentary %}
        <div class="section">
            <h2>Qualitative analysis</h2>
            <div class="commentary">{{ commentary }}</div>
        </div>
        {% endif %}

        <div class="metadata">
            <p><strong>ℹ️ Generated by Resume Scorecard v{{ version }}</strong></p>
            <p><strong>Model:</strong> {{ model }} | <strong>Source:</strong> {{ source }}</p>
        </div>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    generated_at: String,
    processing_time: u64,
    mean_score: String,
    high_count: usize,
    total: usize,
    max_score: String,
    affinity: String,
    verdict: String,
    rows: Vec<HtmlRow>,
    commentary: String,
    has_commentary: bool,
    version: String,
    model: String,
    source: String,
}

struct HtmlRow {
    label: String,
    score: String,
    minimum: String,
    status: String,
    status_class: &'static str,
    level: &'static str,
    level_class: &'static str,
}

/// Scores print at full precision; rounding could carry a score across its minimum
fn format_score(value: f64) -> String {
    value.to_string()
}

/// Points to a minimum, two decimals at most
fn format_gap(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn format_affinity(affinity: Option<f64>) -> String {
    match affinity {
        Some(value) => format!("{:.1}%", value),
        None => "n/a".to_string(),
    }
}

fn status_label(status: CompetencyStatus) -> &'static str {
    match status {
        CompetencyStatus::MeetsMinimum => "OK",
        CompetencyStatus::BelowMinimum => "Below minimum",
    }
}

fn verdict_label(verdict: AffinityVerdict) -> &'static str {
    match verdict {
        AffinityVerdict::Excellent => "Excellent",
        AffinityVerdict::Good => "Good",
        AffinityVerdict::Low => "Low",
        AffinityVerdict::Unavailable => "Unavailable",
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_level_badge(&self, level: Level) -> String {
        let color = match level {
            Level::High => Color::Green,
            Level::Medium => Color::Yellow,
            Level::Low => Color::Red,
        };

        if self.use_colors {
            format!("[{}]", level.as_str().to_uppercase().color(color).bold())
        } else {
            format!("[{}]", level.as_str().to_uppercase())
        }
    }

    fn format_status(&self, status: CompetencyStatus) -> String {
        match (status, self.use_colors) {
            (CompetencyStatus::MeetsMinimum, true) => format!("✔️ {}", status_label(status).green()),
            (CompetencyStatus::BelowMinimum, true) => status_label(status).red().to_string(),
            (_, false) => status_label(status).to_string(),
        }
    }

    fn format_verdict(&self, verdict: AffinityVerdict) -> String {
        let color = match verdict {
            AffinityVerdict::Excellent => Color::Green,
            AffinityVerdict::Good => Color::Yellow,
            AffinityVerdict::Low => Color::Red,
            AffinityVerdict::Unavailable => Color::BrightBlack,
        };
        self.colorize(verdict.description(), color)
    }

    fn format_record(&self, record: &CompetencyRecord, level: Level, width: usize) -> String {
        format!(
            "  {:<width$}  {:>5}  {:>5}  {:<9} {}\n",
            record.label(),
            format_score(record.score()),
            format_score(record.minimum()),
            self.format_level_badge(level),
            self.format_status(record.status()),
            width = width
        )
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &ScorecardReport) -> Result<String> {
        let mut output = String::new();
        let summary = &report.summary;

        output.push_str(&self.format_header("📊 RESUME SCORECARD", 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.processing_time_ms
        ));

        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!("Mean score: {}\n", format_score(summary.mean_score)));
        output.push_str(&format!("High level (>= {}): {}\n", format_score(summary.thresholds.high_level), summary.high_count));
        output.push_str(&format!("Competencies: {}\n", summary.total_competencies));
        output.push_str(&format!("Max score: {}\n", format_score(summary.max_score)));
        output.push_str(&format!(
            "Finance affinity: {} - {}\n",
            self.colorize(&format_affinity(summary.affinity), Color::Cyan),
            self.format_verdict(summary.affinity_verdict)
        ));

        output.push_str(&self.format_header("Competencies", 2));
        let width = report
            .result
            .records
            .iter()
            .map(|r| r.label().chars().count())
            .max()
            .unwrap_or(0)
            .max("Competency".len());
        output.push_str(&format!(
            "  {:<width$}  {:>5}  {:>5}  {:<9} {}\n",
            "Competency",
            "Score",
            "Min",
            "Level",
            "Status",
            width = width
        ));
        for record in &report.result.records {
            output.push_str(&self.format_record(record, summary.level_of(record), width));
        }
        output.push_str(&format!(
            "\n{} meeting minimum, {} below\n",
            summary.meeting_minimum, summary.below_minimum
        ));

        if self.detailed {
            output.push_str(&self.format_header("📊 Detailed Analysis", 2));

            output.push_str(&self.format_header("Level Distribution", 3));
            let distribution = &summary.level_distribution;
            output.push_str(&format!(
                "High: {} | Medium: {} | Low: {}\n",
                distribution.high, distribution.medium, distribution.low
            ));

            let gaps: Vec<_> = report.result.below_minimum().collect();
            if !gaps.is_empty() {
                output.push_str(&self.format_header("🎯 Gaps to Minimum", 3));
                for record in gaps {
                    output.push_str(&format!(
                        "  • {} {}\n",
                        self.colorize(record.label(), Color::Yellow),
                        self.colorize(&format!("(+{} points)", format_gap(record.gap())), Color::BrightBlack)
                    ));
                }
            }
        }

        if !report.result.commentary.is_empty() {
            output.push_str(&self.format_header("🧠 Qualitative Analysis", 2));
            output.push_str(&report.result.commentary);
            output.push('\n');
        }

        output.push_str(&format!(
            "\n{} Generated by Resume Scorecard v{} | Model: {} | Source: {}\n",
            self.colorize("ℹ️", Color::Blue),
            report.metadata.scorecard_version,
            report.metadata.model_used,
            report.metadata.source_name()
        ));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &ScorecardReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }

    fn create_template_data(&self, report: &ScorecardReport) -> HtmlTemplate {
        let summary = &report.summary;

        let rows = report
            .result
            .records
            .iter()
            .map(|record| {
                let level = summary.level_of(record);
                HtmlRow {
                    label: record.label().to_string(),
                    score: format_score(record.score()),
                    minimum: format_score(record.minimum()),
                    status: status_label(record.status()).to_string(),
                    status_class: if record.status().is_met() { "status-ok" } else { "status-below" },
                    level: level.as_str(),
                    level_class: match level {
                        Level::High => "level-high",
                        Level::Medium => "level-medium",
                        Level::Low => "level-low",
                    },
                }
            })
            .collect();

        HtmlTemplate {
            include_styles: self.include_styles,
            generated_at: report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            processing_time: report.metadata.processing_time_ms,
            mean_score: format_score(summary.mean_score),
            high_count: summary.high_count,
            total: summary.total_competencies,
            max_score: format_score(summary.max_score),
            affinity: format_affinity(summary.affinity),
            verdict: verdict_label(summary.affinity_verdict).to_string(),
            rows,
            commentary: report.result.commentary.clone(),
            has_commentary: !report.result.commentary.is_empty(),
            version: report.metadata.scorecard_version.clone(),
            model: report.metadata.model_used.clone(),
            source: report.metadata.source_name(),
        }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &ScorecardReport) -> Result<String> {
        self.create_template_data(report)
            .render()
            .map_err(|e| ScorecardError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_level_badge(level: Level) -> &'static str {
        match level {
            Level::High => "🟢 High",
            Level::Medium => "🟡 Medium",
            Level::Low => "🔴 Low",
        }
    }

    /// Pipes would end the table cell early
    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &ScorecardReport) -> Result<String> {
        let mut output = String::new();
        let summary = &report.summary;

        output.push_str("# 📊 Resume Scorecard\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Processing Time:** {}ms\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.processing_time_ms
            ));
            output.push_str(&format!(
                "**Source:** `{}` | **Model:** {}\n\n",
                report.metadata.source_name(),
                report.metadata.model_used
            ));
        }

        output.push_str("## Summary\n\n");
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        output.push_str(&format!("| Mean score | {} |\n", format_score(summary.mean_score)));
        output.push_str(&format!("| High level | {} |\n", summary.high_count));
        output.push_str(&format!("| Competencies | {} |\n", summary.total_competencies));
        output.push_str(&format!("| Max score | {} |\n", format_score(summary.max_score)));
        output.push_str(&format!(
            "| Finance affinity | {} ({}) |\n\n",
            format_affinity(summary.affinity),
            verdict_label(summary.affinity_verdict)
        ));

        output.push_str("## Competencies\n\n");
        output.push_str("| Competency | Score | Minimum | Status | Level |\n");
        output.push_str("|------------|-------|---------|--------|-------|\n");
        for record in &report.result.records {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                Self::escape_cell(record.label()),
                format_score(record.score()),
                format_score(record.minimum()),
                status_label(record.status()),
                Self::markdown_level_badge(summary.level_of(record))
            ));
        }
        output.push('\n');

        if !report.result.commentary.is_empty() {
            output.push_str("## 🧠 Qualitative Analysis\n\n");
            output.push_str(&report.result.commentary);
            output.push_str("\n\n");
        }

        if self.include_metadata {
            output.push_str("---\n\n");
            output.push_str(&format!(
                "*Generated by Resume Scorecard v{}*\n",
                report.metadata.scorecard_version
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl OutputFormatter for CsvFormatter {
    fn format_report(&self, report: &ScorecardReport) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let to_err = |e: csv::Error| ScorecardError::OutputFormatting(format!("CSV error: {}", e));

        writer
            .write_record(["label", "score", "minimum", "status", "level"])
            .map_err(to_err)?;
        for record in &report.result.records {
            let status = match record.status() {
                CompetencyStatus::MeetsMinimum => "MEETS_MINIMUM",
                CompetencyStatus::BelowMinimum => "BELOW_MINIMUM",
            };
            let score = record.score().to_string();
            let minimum = record.minimum().to_string();
            writer
                .write_record([
                    record.label(),
                    score.as_str(),
                    minimum.as_str(),
                    status,
                    report.summary.level_of(record).as_str(),
                ])
                .map_err(to_err)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ScorecardError::OutputFormatting(format!("CSV error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| ScorecardError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Csv
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
            html_formatter: HtmlFormatter::new(true),
            csv_formatter: CsvFormatter,
        }
    }

    pub fn with_options(
        use_colors: bool,
        detailed: bool,
        pretty_json: bool,
        include_metadata: bool,
        include_html_styles: bool,
    ) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
            html_formatter: HtmlFormatter::new(include_html_styles),
            csv_formatter: CsvFormatter,
        }
    }

    pub fn generate_report(&self, report: &ScorecardReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
            OutputFormat::Html => self.html_formatter.format_report(report),
            OutputFormat::Csv => self.csv_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: &OutputFormat, source_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(source_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Html => "html",
        OutputFormat::Csv => "csv",
    };

    format!("{}_scorecard{}.{}", base_name, timestamp_suffix, extension)
}
