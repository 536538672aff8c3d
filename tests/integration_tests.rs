//! Integration tests for the resume scorecard

use resume_scorecard::config::Config;
use resume_scorecard::error::{Result, ScorecardError};
use resume_scorecard::input::InputManager;
use resume_scorecard::llm::{Completion, CompletionProvider, OpenAiClient};
use resume_scorecard::output::formatter::ReportGenerator;
use resume_scorecard::config::OutputFormat;
use resume_scorecard::pipeline::ScorecardPipeline;
use resume_scorecard::scoring::{CompetencyStatus, ParseErrorKind, ReferenceTable, SortOrder};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Replies with a fixed text and remembers the last prompt
struct MockProvider {
    reply: String,
    last_prompt: Mutex<Option<String>>,
}

impl MockProvider {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            last_prompt: Mutex::new(None),
        }
    }
}

impl CompletionProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(Completion {
            text: self.reply.clone(),
            usage: None,
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

fn sample_reply() -> String {
    std::fs::read_to_string("tests/fixtures/sample_reply.txt").unwrap()
}

fn pipeline(reply: &str) -> ScorecardPipeline<MockProvider> {
    ScorecardPipeline::new(MockProvider::new(reply), &Config::default(), ReferenceTable::finance_sector())
}

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("Maria Silva"));
    assert!(text.contains("Excel avançado"));
    assert!(text.contains("CPA-20"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.md");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("Maria Silva"));
    assert!(text.contains("Python & SQL"));
    // Should not contain markdown formatting
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_caching_functionality() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    assert_eq!(manager.cache_size(), 0);
    let first = manager.extract_text(path).await.unwrap();
    assert_eq!(manager.cache_size(), 1);
    let second = manager.extract_text(path).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(manager.cache_size(), 1);

    manager.clear_cache();
    assert_eq!(manager.cache_size(), 0);
}

#[tokio::test]
async fn test_unsupported_and_missing_files() {
    let mut manager = InputManager::new();

    let unsupported = manager.extract_text(Path::new("tests/fixtures/unsupported.xyz")).await;
    assert!(matches!(unsupported, Err(ScorecardError::UnsupportedFormat(_))));

    let missing = manager.extract_text(Path::new("tests/fixtures/nope.txt")).await;
    assert!(matches!(missing, Err(ScorecardError::InvalidInput(_))));
}

#[tokio::test]
async fn test_blank_resume_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, "  \n\t\n").unwrap();

    let mut manager = InputManager::new();
    let result = manager.extract_text(&path).await;
    assert!(matches!(result, Err(ScorecardError::InvalidInput(_))));
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    let mut pipeline = pipeline(&sample_reply());
    let output = pipeline.run(Path::new("tests/fixtures/sample_resume.txt")).await.unwrap();
    let report = &output.report;

    assert_eq!(report.result.len(), 4);
    // Ascending by score
    let scores: Vec<f64> = report.result.records.iter().map(|r| r.score()).collect();
    assert_eq!(scores, vec![65.0, 70.0, 84.0, 88.0]);

    // Comunicação is not in the finance table, so it falls back to 55 and is
    // left out of the affinity
    let comunicacao = report.result.record("Comunicação").unwrap();
    assert_eq!(comunicacao.minimum(), 55.0);
    assert_eq!(comunicacao.status(), CompetencyStatus::MeetsMinimum);
    assert_eq!(report.result.affinity, Some(79.0));

    let excel = report.result.record("Excel Avançado").unwrap();
    assert_eq!(excel.status(), CompetencyStatus::BelowMinimum);
    assert_eq!(excel.gap(), 2.0);

    assert!(report.result.commentary.contains("Pontos Fortes"));
    assert_eq!(report.metadata.model_used, "mock-model");
    assert_eq!(output.raw_reply, sample_reply());
}

#[tokio::test]
async fn test_prompt_carries_resume() {
    let mut pipeline = pipeline(&sample_reply());
    pipeline.run(Path::new("tests/fixtures/sample_resume.txt")).await.unwrap();

    let prompt = pipeline.provider().last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("Banco Horizonte"));
    assert!(prompt.contains("\"Pontuação\""));
}

#[tokio::test]
async fn test_pipeline_descending_order() {
    let mut config = Config::default();
    config.scoring.sort_order = SortOrder::Descending;
    let mut pipeline = ScorecardPipeline::new(
        MockProvider::new(&sample_reply()),
        &config,
        ReferenceTable::finance_sector(),
    );

    let output = pipeline.run(Path::new("tests/fixtures/sample_resume.md")).await.unwrap();
    assert_eq!(output.report.result.records[0].label(), "Excel Avançado");
}

#[tokio::test]
async fn test_pipeline_reports_refusal() {
    let refusal = "Desculpe, não posso avaliar este currículo.";
    let mut pipeline = pipeline(refusal);

    let err = pipeline.run(Path::new("tests/fixtures/sample_resume.txt")).await.unwrap_err();
    assert_eq!(err.raw_reply(), Some(refusal));
    match err {
        ScorecardError::Parse(parse) => assert_eq!(parse.kind(), ParseErrorKind::NoStructuredData),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_pipeline_reports_invalid_scores() {
    let mut pipeline = pipeline(r#"[{"Área": "Excel", "Pontuação": 150}]"#);

    let err = pipeline.run(Path::new("tests/fixtures/sample_resume.txt")).await.unwrap_err();
    match err {
        ScorecardError::Parse(parse) => assert_eq!(parse.kind(), ParseErrorKind::NoValidEntries),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_pipeline_rejects_blank_reply() {
    let mut pipeline = pipeline("   ");
    let err = pipeline.run(Path::new("tests/fixtures/sample_resume.txt")).await.unwrap_err();
    assert!(matches!(err, ScorecardError::LlmResponse(_)));
}

#[tokio::test]
async fn test_every_format_renders() {
    let mut pipeline = pipeline(&sample_reply());
    let output = pipeline.run(Path::new("tests/fixtures/sample_resume.txt")).await.unwrap();
    let generator = ReportGenerator::with_options(false, true, true, true, true);

    for format in [
        OutputFormat::Console,
        OutputFormat::Json,
        OutputFormat::Markdown,
        OutputFormat::Html,
        OutputFormat::Csv,
    ] {
        let content = generator.generate_report(&output.report, &format).unwrap();
        assert!(content.contains("Planejamento Financeiro"), "{:?} output is missing a row", format);
    }
}

/// Serves the given HTTP responses in order, one per connection
async fn serve(responses: Vec<(u16, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    format!("http://{}/v1", address)
}

async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buffer.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
    })
    .to_string()
}

fn test_client(api_base: String) -> OpenAiClient {
    let mut settings = Config::default().llm;
    settings.api_base = api_base;
    settings.timeout_secs = 5;
    OpenAiClient::new(settings, "sk-test".to_string())
        .unwrap()
        .with_retry_base_delay(Duration::from_millis(10))
}

#[tokio::test]
async fn test_client_retries_server_errors() {
    let api_base = serve(vec![
        (503, r#"{"error": {"message": "overloaded"}}"#.to_string()),
        (429, r#"{"error": {"message": "rate limited"}}"#.to_string()),
        (200, completion_body("[{\"Área\": \"SQL\", \"Pontuação\": 80}]")),
    ])
    .await;

    let completion = test_client(api_base).complete("prompt").await.unwrap();
    assert!(completion.text.contains("SQL"));
    assert_eq!(completion.usage.unwrap().total_tokens, 120);
}

#[tokio::test]
async fn test_client_fails_fast_on_client_error() {
    let api_base = serve(vec![
        (401, r#"{"error": {"message": "Invalid API key"}}"#.to_string()),
        (200, completion_body("never reached")),
    ])
    .await;

    let err = test_client(api_base).complete("prompt").await.unwrap_err();
    match err {
        ScorecardError::LlmRequest(message) => {
            assert!(message.contains("401"));
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_client_gives_up_after_max_retries() {
    let api_base = serve(vec![
        (500, "boom".to_string()),
        (500, "boom".to_string()),
        (500, "boom".to_string()),
    ])
    .await;

    let err = test_client(api_base).complete("prompt").await.unwrap_err();
    assert!(matches!(err, ScorecardError::LlmRequest(message) if message.contains("500")));
}

#[tokio::test]
async fn test_client_rejects_empty_content() {
    let api_base = serve(vec![(200, completion_body(""))]).await;

    let err = test_client(api_base).complete("prompt").await.unwrap_err();
    assert!(matches!(err, ScorecardError::LlmResponse(_)));
}
