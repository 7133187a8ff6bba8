// tests/watcher_events.rs
//
// Drives the real notify watcher on a temporary project.

#![cfg(target_os = "linux")]

mod common;
use crate::common::{ConfigFileBuilder, TaskConfigBuilder, init_tracing, with_timeout, write_tree};

use std::time::Duration;

use tokio::sync::mpsc;

use assetpipe::config::ConfigFile;
use assetpipe::engine::RuntimeEvent;
use assetpipe::types::TriggerReason;
use assetpipe::watch::{WatchDispatcher, spawn_watcher};

fn style_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new("scss:compile")
                .source("style", "*.scss")
                .copy()
                .build(),
        )
        .with_watch("src/assets/scss/**/*.scss", &["scss:compile"])
        .with_debounce_ms(1_000)
        .build()
}

/// Collect whatever arrives on `rx` within `window`.
async fn drain_for(rx: &mut mpsc::Receiver<RuntimeEvent>, window: Duration) -> Vec<RuntimeEvent> {
    let mut out = Vec::new();
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn reading_a_watched_file_triggers_nothing() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path(), &[("src/assets/scss/other.scss", "a {}")]);

    let dispatcher = WatchDispatcher::from_config(&style_config()).unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    let _handle = spawn_watcher(tmp.path(), dispatcher, tx).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let contents = std::fs::read_to_string(tmp.path().join("src/assets/scss/other.scss")).unwrap();
    assert_eq!(contents, "a {}");

    let events = drain_for(&mut rx, Duration::from_millis(400)).await;
    assert!(events.is_empty(), "unexpected triggers: {events:?}");
}

#[tokio::test]
async fn writing_a_watched_file_triggers_its_task_once() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    write_tree(
        tmp.path(),
        &[
            ("src/assets/scss/style.scss", "body {}"),
            ("src/index.html", "<main/>"),
        ],
    );

    let dispatcher = WatchDispatcher::from_config(&style_config()).unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    let _handle = spawn_watcher(tmp.path(), dispatcher, tx).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Not matched by any rule.
    std::fs::write(tmp.path().join("src/index.html"), "<main>changed</main>").unwrap();
    std::fs::write(tmp.path().join("src/assets/scss/style.scss"), "body { color: red; }").unwrap();

    let first = with_timeout(rx.recv()).await.unwrap();
    match first {
        RuntimeEvent::TaskTriggered { task, reason } => {
            assert_eq!(task, "scss:compile");
            assert_eq!(reason, TriggerReason::FileWatch);
        }
        other => panic!("expected TaskTriggered, got {other:?}"),
    }

    // Create/modify/close notifications for the same write fall inside the
    // debounce window.
    let rest = drain_for(&mut rx, Duration::from_millis(400)).await;
    assert!(rest.is_empty(), "unexpected extra triggers: {rest:?}");
}
