//! Integration tests for cite-rename
//!
//! These tests drive the whole pipeline against mock collaborators and a
//! mock HTTP server, checking what ends up on disk and in the log.

use cite_rename::config::Config;
use cite_rename::models::{ExtractedGuess, PipelineState, RecordBuilder};
use cite_rename::pipeline::{JsonlLog, LogLevel, MemoryLog, RenameCoordinator};
use cite_rename::sources::{
    CiniiSearchClient, MockExtractor, MockReply, MockSearch, OpenAiExtractor,
};
use cite_rename::utils::{HttpClient, SanitizeMode};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn scenario_a_record() -> cite_rename::BibliographicRecord {
    RecordBuilder::new()
        .author("Tanaka")
        .date("2019-05-01")
        .title("Study X")
        .journal("J. Foo")
        .issue("3")
        .volume("12")
        .pages("1", "10")
        .build()
}

fn config_with_output(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.paths.output_dir = output_dir.to_path_buf();
    config
}

fn write_source(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4 placeholder").unwrap();
    path
}

#[tokio::test]
async fn test_document_renamed_to_citation() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();
    let source = write_source(dir.path(), "scan001.pdf");

    let log = Arc::new(MemoryLog::new());
    let coordinator = RenameCoordinator::new(
        &config_with_output(&out),
        Arc::new(MockExtractor::returning(ExtractedGuess::new("Study X", "Tanaka"))),
        Arc::new(MockSearch::returning(scenario_a_record())),
        log.clone(),
    );

    let outcome = coordinator.process(&source, "Study X\nTanaka").await;

    let expected = "Tanaka, 2019, 「Study X」J. Foo（3）12, p.1-10.pdf";
    assert_eq!(outcome.state, PipelineState::Done);
    assert!(outcome.renamed());
    assert_eq!(outcome.rename.as_ref().unwrap().final_name, expected);
    assert!(out.join(expected).exists());
    assert!(!source.exists());

    let renamed = log.of_kind("renamed");
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].old_name, "scan001.pdf");
    assert_eq!(renamed[0].new_name.as_deref(), Some(expected));
}

#[tokio::test]
async fn test_not_found_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "scan002.pdf");

    let log = Arc::new(MemoryLog::new());
    let coordinator = RenameCoordinator::new(
        &config_with_output(dir.path()),
        Arc::new(MockExtractor::returning(ExtractedGuess::new(
            "Unknown Paper",
            "Nobody",
        ))),
        Arc::new(MockSearch::not_found()),
        log.clone(),
    );

    let outcome = coordinator.process(&source, "text").await;

    assert_eq!(outcome.state, PipelineState::Aborted);
    assert_eq!(outcome.stage_reached, PipelineState::Searching);
    assert!(outcome.rename.is_none());
    assert!(source.exists());

    let entries = log.of_kind("not_found");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Error);
    assert!(entries[0].message.contains("Unknown Paper"));
    assert!(entries[0].message.contains("Nobody"));
}

#[tokio::test]
async fn test_reserved_character_falls_back_to_sanitized_name() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();
    let source = write_source(dir.path(), "scan003.pdf");

    let record = RecordBuilder::new()
        .author("Tanaka")
        .date("2020")
        .title("Input/Output")
        .journal("J. Foo")
        .pages("5", "9")
        .build();

    let log = Arc::new(MemoryLog::new());
    let coordinator = RenameCoordinator::new(
        &config_with_output(&out),
        Arc::new(MockExtractor::returning(ExtractedGuess::new("Input/Output", "Tanaka"))),
        Arc::new(MockSearch::returning(record)),
        log.clone(),
    );

    let outcome = coordinator.process(&source, "text").await;

    let attempted = "Tanaka, 2020, 「Input/Output」J. Foo, p.5-9.pdf";
    let sanitized = "Tanaka, 2020, 「Input Output」J. Foo, p.5-9.pdf";
    assert_eq!(outcome.state, PipelineState::Fallback);
    assert!(outcome.renamed());
    assert_eq!(outcome.rename.as_ref().unwrap().final_name, sanitized);
    assert!(out.join(sanitized).exists());
    assert!(!source.exists());

    let fallback = log.of_kind("fallback");
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].attempted_name.as_deref(), Some(attempted));

    let renamed = log.of_kind("renamed");
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].attempted_name.as_deref(), Some(attempted));
    assert_eq!(renamed[0].new_name.as_deref(), Some(sanitized));
}

#[tokio::test]
async fn test_fullwidth_fallback() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "scan004.pdf");

    let mut config = config_with_output(dir.path());
    config.rename.sanitize_mode = SanitizeMode::Fullwidth;

    let coordinator = RenameCoordinator::new(
        &config,
        Arc::new(MockExtractor::returning(ExtractedGuess::new("A/B", "C"))),
        Arc::new(MockSearch::returning(
            RecordBuilder::new().author("C").title("A/B").build(),
        )),
        Arc::new(MemoryLog::new()),
    );

    let outcome = coordinator.process(&source, "text").await;

    assert_eq!(outcome.state, PipelineState::Fallback);
    assert_eq!(
        outcome.rename.as_ref().unwrap().final_name,
        "C, , 「A／B」, p.-.pdf"
    );
}

#[tokio::test]
async fn test_existing_target_is_not_overwritten() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "scan005.pdf");
    let existing = dir.path().join("Tanaka, 2019, 「Study X」J. Foo（3）12, p.1-10.pdf");
    std::fs::write(&existing, b"keep me").unwrap();

    let log = Arc::new(MemoryLog::new());
    let coordinator = RenameCoordinator::new(
        &config_with_output(dir.path()),
        Arc::new(MockExtractor::returning(ExtractedGuess::new("Study X", "Tanaka"))),
        Arc::new(MockSearch::returning(scenario_a_record())),
        log.clone(),
    );

    let outcome = coordinator.process(&source, "text").await;

    assert_eq!(outcome.state, PipelineState::Aborted);
    assert!(!outcome.renamed());
    assert!(source.exists());
    assert_eq!(std::fs::read(&existing).unwrap(), b"keep me");
    assert_eq!(log.of_kind("rename_failed").len(), 1);
}

#[tokio::test]
async fn test_run_directory_continues_after_failures() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    let out = dir.path().join("output");
    std::fs::create_dir(&input).unwrap();
    write_source(&input, "a.pdf");
    write_source(&input, "b.pdf");
    std::fs::write(input.join("notes.txt"), b"skip").unwrap();

    let extractor = Arc::new(MockExtractor::new(MockReply::Parse("unused".to_string())));
    let log = Arc::new(MemoryLog::new());
    let coordinator = RenameCoordinator::new(
        &config_with_output(&out),
        extractor.clone(),
        Arc::new(MockSearch::returning(scenario_a_record())),
        log.clone(),
    );

    let mut seen = Vec::new();
    let summary = coordinator
        .run_directory(&input, 1000, |outcome| seen.push(outcome.source.clone()))
        .await
        .unwrap();

    // Placeholder bytes are not a readable PDF, so both stop at extraction
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.count(PipelineState::Aborted), 2);
    assert_eq!(summary.renamed(), 0);
    assert_eq!(seen, vec![input.join("a.pdf"), input.join("b.pdf")]);
    assert_eq!(extractor.calls(), 0);
    assert_eq!(log.of_kind("extract").len(), 2);
    assert!(out.is_dir());
    assert!(input.join("a.pdf").exists());
}

#[tokio::test]
async fn test_run_directory_missing_input() {
    let dir = tempdir().unwrap();
    let coordinator = RenameCoordinator::new(
        &config_with_output(dir.path()),
        Arc::new(MockExtractor::returning(ExtractedGuess::default())),
        Arc::new(MockSearch::not_found()),
        Arc::new(MemoryLog::new()),
    );

    let result = coordinator
        .run_directory(&dir.path().join("missing"), 1000, |_| {})
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_jsonl_log_records_run() {
    let dir = tempdir().unwrap();
    let source = write_source(dir.path(), "scan006.pdf");
    let log = Arc::new(JsonlLog::timestamped(&dir.path().join("log")).unwrap());

    let coordinator = RenameCoordinator::new(
        &config_with_output(dir.path()),
        Arc::new(MockExtractor::returning(ExtractedGuess::new("Study X", "Tanaka"))),
        Arc::new(MockSearch::not_found()),
        log.clone(),
    );
    coordinator.process(&source, "text").await;

    let entries = JsonlLog::read_entries(log.path()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, "not_found");
    assert_eq!(entries[0].old_name, "scan006.pdf");
}

#[tokio::test]
async fn test_end_to_end_with_http_services() {
    let mut server = mockito::Server::new_async().await;

    let completion = serde_json::json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": "{\"title\": \"Study X\", \"author\": \"Tanaka\"}"
            }
        }]
    });
    let llm = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion.to_string())
        .create_async()
        .await;
    let search = server
        .mock("GET", "/all")
        .match_query(mockito::Matcher::UrlEncoded("q".into(), "Study X".into()))
        .with_status(200)
        .with_body(
            r#"<div class="listitem xfolkentry">
                 <a class="taggedlink" href="/crid/1390001">Study X</a>
               </div>"#,
        )
        .create_async()
        .await;
    let detail = server
        .mock("GET", "/crid/1390001")
        .with_status(200)
        .with_body(
            r#"<html><head>
                 <meta name="citation_title" content="Study X">
                 <meta name="citation_author" content="Tanaka">
                 <meta name="citation_date" content="2019-05-01">
                 <meta name="citation_journal_title" content="J. Foo">
                 <meta name="citation_issue" content="3">
                 <meta name="citation_volume" content="12">
                 <meta name="citation_firstpage" content="1">
                 <meta name="citation_lastpage" content="10">
               </head></html>"#,
        )
        .create_async()
        .await;

    let dir = tempdir().unwrap();
    let mut config = config_with_output(dir.path());
    config.llm.endpoint = format!("{}/v1/chat/completions", server.url());
    config.llm.api_key = Some("test-key".to_string());
    config.search.base_url = server.url();
    config.search.retry_wait_ms = 1;

    let client = HttpClient::with_config(&config.http).unwrap();
    let extractor = OpenAiExtractor::new(&config.llm, client.clone()).unwrap();
    let cinii = CiniiSearchClient::new(&config.search, client);
    let coordinator = RenameCoordinator::new(
        &config,
        Arc::new(extractor),
        Arc::new(cinii),
        Arc::new(MemoryLog::new()),
    )
    .dry_run(true);

    let source = write_source(dir.path(), "scan007.pdf");
    let outcome = coordinator.process(&source, "Study X\nTanaka").await;

    llm.assert_async().await;
    search.assert_async().await;
    detail.assert_async().await;
    assert_eq!(outcome.state, PipelineState::Done);
    assert_eq!(
        outcome.citation.as_deref(),
        Some("Tanaka, 2019, 「Study X」J. Foo（3）12, p.1-10")
    );
    assert!(source.exists());
}

#[tokio::test]
async fn test_dry_run_documents_leave_filesystem_alone() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("output");
    let first = write_source(dir.path(), "a.pdf");
    let second = write_source(dir.path(), "b.pdf");

    let log = Arc::new(MemoryLog::new());
    let coordinator = RenameCoordinator::new(
        &config_with_output(&out),
        Arc::new(MockExtractor::returning(ExtractedGuess::new("Study X", "Tanaka"))),
        Arc::new(MockSearch::returning(scenario_a_record())),
        log.clone(),
    )
    .dry_run(true);

    let mut done = 0;
    let summary = coordinator
        .run_documents(vec![first.clone(), second.clone()], 1000, |_| done += 1)
        .await
        .unwrap();

    assert_eq!(done, 2);
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.renamed(), 0);
    assert!(!out.exists());
    assert!(first.exists() && second.exists());
}
