// tests/pipeline_runner.rs

mod common;
use crate::common::{
    ConfigFileBuilder, FailingTransform, RecordingNotifier, TaskConfigBuilder, init_tracing,
    with_timeout,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetpipe::build_scheduler;
use assetpipe::config::{ConfigFile, TransformConfig};
use assetpipe::dag::{Registry, Scheduler, TaskAction, TaskSource};
use assetpipe::errors::AssetpipeError;
use assetpipe::exec::ServiceSupervisor;
use assetpipe::fs::mock::MockFileSystem;
use assetpipe::pipeline::PipelineRunner;

const ROOT: &str = "/site";

fn setup(cfg: &ConfigFile, fs: &MockFileSystem) -> (Scheduler, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let scheduler = build_scheduler(
        cfg,
        Path::new(ROOT),
        Arc::new(fs.clone()),
        Arc::new(notifier.clone()),
        Arc::new(ServiceSupervisor::new()),
    )
    .unwrap();
    (scheduler, notifier)
}

fn html_config(reload: bool) -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new("html")
                .source("html", "**/*.html")
                .copy()
                .reload(reload)
                .build(),
        )
        .build()
}

#[tokio::test]
async fn copy_preserves_relative_paths_and_notifies() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/html/about.html", "<h1>about</h1>");
    fs.add_file("/site/src/html/blog/post.html", "<p>post</p>");
    fs.add_file("/site/src/html/notes.txt", "skip me");

    let (scheduler, notifier) = setup(&html_config(true), &fs);
    let ctx = with_timeout(scheduler.run("html")).await.unwrap();

    assert_eq!(
        fs.contents("/site/dist/html/blog/post.html"),
        Some(b"<p>post</p>".to_vec())
    );
    assert!(fs.contents("/site/dist/html/notes.txt").is_none());

    let expected = vec![
        PathBuf::from("/site/dist/html/about.html"),
        PathBuf::from("/site/dist/html/blog/post.html"),
    ];
    assert_eq!(ctx.changed().to_vec(), expected);
    assert_eq!(notifier.calls(), vec![("html".to_string(), expected)]);
}

#[tokio::test]
async fn unchanged_outputs_are_neither_written_nor_reported() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/html/about.html", "same");
    fs.add_file("/site/src/html/contact.html", "v1");

    let (scheduler, notifier) = setup(&html_config(true), &fs);
    with_timeout(scheduler.run("html")).await.unwrap();

    fs.add_file("/site/src/html/contact.html", "v2");
    let ctx = with_timeout(scheduler.run("html")).await.unwrap();

    assert_eq!(
        ctx.changed().to_vec(),
        vec![PathBuf::from("/site/dist/html/contact.html")]
    );
    assert_eq!(notifier.calls().len(), 2);

    let ctx = with_timeout(scheduler.run("html")).await.unwrap();
    assert!(ctx.changed().is_empty());
    assert_eq!(notifier.calls().len(), 2);
}

#[tokio::test]
async fn reload_disabled_task_does_not_notify() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/html/about.html", "a");

    let (scheduler, notifier) = setup(&html_config(false), &fs);
    with_timeout(scheduler.run("html")).await.unwrap();

    assert!(fs.contents("/site/dist/html/about.html").is_some());
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn failing_transform_leaves_destination_untouched() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/assets/scss/style.scss", "body { color: red }");
    fs.add_file("/site/src/assets/scss/theme.scss", "a { color: blue }");
    fs.add_file("/site/dist/assets/css/style.css", "old");
    let before = fs.file_paths();

    let mut registry = Registry::new();
    registry
        .register(
            "scss:compile",
            vec![],
            TaskAction::Pipeline {
                sources: vec![
                    TaskSource::new("/site/src/assets/scss", "*.scss", "/site/dist/assets/css")
                        .unwrap(),
                ],
                transform: Arc::new(FailingTransform::new("Undefined variable: $brand")),
                reload: true,
            },
        )
        .unwrap();

    let notifier = RecordingNotifier::new();
    let runner = PipelineRunner::new(
        Arc::new(fs.clone()),
        Arc::new(notifier.clone()),
        Arc::new(ServiceSupervisor::new()),
    );
    let scheduler = Scheduler::new(Arc::new(registry), Arc::new(runner));

    let err = with_timeout(scheduler.run("scss:compile")).await.unwrap_err();

    match &err {
        AssetpipeError::Transform { task, source } => {
            assert_eq!(task, "scss:compile");
            assert!(source.to_string().contains("$brand"));
        }
        other => panic!("expected Transform error, got {other:?}"),
    }
    assert_eq!(fs.file_paths(), before);
    assert_eq!(
        fs.contents("/site/dist/assets/css/style.css"),
        Some(b"old".to_vec())
    );
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn write_failure_is_a_filesystem_error_for_the_task() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/html/about.html", "a");
    fs.fail_writes_to("/site/dist/html/about.html");

    let (scheduler, notifier) = setup(&html_config(true), &fs);
    let err = with_timeout(scheduler.run("html")).await.unwrap_err();

    assert!(matches!(err, AssetpipeError::Filesystem { ref task, .. } if task == "html"));
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn clean_then_concat_builds_a_bundle() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/site/dist/assets/js/stale.js", "old bundle");
    fs.add_file("/site/src/assets/js/b.js", "var b;");
    fs.add_file("/site/src/assets/js/a.js", "var a;");

    let cfg = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("clean").clean(&["script"]).build())
        .with_task(
            TaskConfigBuilder::new("script:concat")
                .after("clean")
                .source("script", "*.js")
                .transform(TransformConfig::Concat {
                    output: "main.js".into(),
                    separator: ";\n".into(),
                })
                .build(),
        )
        .build();

    let (scheduler, notifier) = setup(&cfg, &fs);
    with_timeout(scheduler.run("script:concat")).await.unwrap();

    assert!(fs.contents("/site/dist/assets/js/stale.js").is_none());
    assert_eq!(
        fs.contents("/site/dist/assets/js/main.js"),
        Some(b"var a;;\nvar b;".to_vec())
    );
    assert_eq!(
        notifier.calls(),
        vec![(
            "script:concat".to_string(),
            vec![PathBuf::from("/site/dist/assets/js/main.js")]
        )]
    );
}

#[tokio::test]
async fn include_expands_partials_relative_to_file() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/site/src/index.html",
        "<body>@@include('partials/header.inc')</body>",
    );
    fs.add_file("/site/src/partials/header.inc", "<nav>@@include(\"logo.inc\")</nav>");
    fs.add_file("/site/src/partials/logo.inc", "LOGO");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new("fileinclude")
                .source("index", "*.html")
                .transform(TransformConfig::Include {
                    prefix: "@@".into(),
                    basepath: "@file".into(),
                })
                .build(),
        )
        .build();

    let (scheduler, _notifier) = setup(&cfg, &fs);
    with_timeout(scheduler.run("fileinclude")).await.unwrap();

    assert_eq!(
        fs.contents("/site/dist/index.html"),
        Some(b"<body><nav>LOGO</nav></body>".to_vec())
    );
}

#[tokio::test]
async fn top_level_source_pattern_skips_nested_files() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/assets/scss/style.scss", "body {}");
    fs.add_file("/site/src/assets/scss/partials/_vars.scss", "$c: red;");
    fs.add_file("/site/src/index.html", "<main/>");
    fs.add_file("/site/src/html/about.html", "about");

    let cfg = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("scss").source("style", "*.scss").copy().build())
        .with_task(TaskConfigBuilder::new("idx").source("index", "*.html").copy().build())
        .with_task(
            TaskConfigBuilder::new("partials")
                .source("style", "**/*.scss")
                .copy()
                .build(),
        )
        .build();

    let (scheduler, _notifier) = setup(&cfg, &fs);

    let ctx = with_timeout(scheduler.run("scss")).await.unwrap();
    assert_eq!(
        ctx.changed().to_vec(),
        vec![PathBuf::from("/site/dist/assets/css/style.scss")]
    );

    let ctx = with_timeout(scheduler.run("idx")).await.unwrap();
    assert_eq!(ctx.changed().to_vec(), vec![PathBuf::from("/site/dist/index.html")]);
    assert!(fs.contents("/site/dist/html/about.html").is_none());

    let ctx = with_timeout(scheduler.run("partials")).await.unwrap();
    assert_eq!(
        ctx.changed().to_vec(),
        vec![PathBuf::from("/site/dist/assets/css/partials/_vars.scss")]
    );
}

#[tokio::test]
async fn execute_runs_a_single_source() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/assets/font/a.woff", "font");
    fs.add_file("/site/src/assets/images/logo.png", "png");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new("static")
                .source("fonts", "*")
                .source("images", "*")
                .copy()
                .build(),
        )
        .build();

    let notifier = RecordingNotifier::new();
    let registry = Registry::from_config(&cfg, Path::new(ROOT), Arc::new(fs.clone())).unwrap();
    let runner = PipelineRunner::new(
        Arc::new(fs.clone()),
        Arc::new(notifier.clone()),
        Arc::new(ServiceSupervisor::new()),
    );

    let task = registry.resolve("static").unwrap();
    let TaskAction::Pipeline { sources, .. } = task.action() else {
        panic!("expected pipeline task");
    };

    let report = with_timeout(runner.execute(&task, &sources[1])).await.unwrap();

    assert_eq!(
        report.changed,
        vec![PathBuf::from("/site/dist/assets/images/logo.png")]
    );
    assert!(fs.contents("/site/dist/assets/font/a.woff").is_none());
    assert_eq!(notifier.calls().len(), 1);
}

#[tokio::test]
async fn group_tasks_only_order_their_predecessors() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/html/a.html", "a");

    let cfg = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("html").source("html", "*.html").copy().build())
        .with_task(TaskConfigBuilder::new("default").after("html").build())
        .build();

    let (scheduler, _notifier) = setup(&cfg, &fs);
    let ctx = with_timeout(scheduler.run("default")).await.unwrap();

    assert_eq!(ctx.completed().to_vec(), vec!["html".to_string(), "default".to_string()]);
    assert!(fs.contents("/site/dist/html/a.html").is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn command_transform_failure_is_tagged_with_task() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/assets/scss/style.scss", "body {");

    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new("scss:compile")
                .source("style", "*.scss")
                .transform(TransformConfig::Command {
                    cmd: "echo 'Error: expected \"}\"' >&2; exit 65".into(),
                    extension: Some("css".into()),
                })
                .build(),
        )
        .build();

    let (scheduler, _notifier) = setup(&cfg, &fs);
    let err = with_timeout(scheduler.run("scss:compile")).await.unwrap_err();

    assert_eq!(err.task(), Some("scss:compile"));
    assert!(err.to_string().contains("65"));
    assert!(fs.contents("/site/dist/assets/css/style.css").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn service_task_starts_once() {
    let fs = MockFileSystem::new();
    let services = Arc::new(ServiceSupervisor::new());

    let cfg = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("nodemon:start").service("sleep 5").build())
        .build();

    let tmp = tempfile::tempdir().unwrap();
    let scheduler = build_scheduler(
        &cfg,
        tmp.path(),
        Arc::new(fs),
        Arc::new(RecordingNotifier::new()),
        Arc::clone(&services),
    )
    .unwrap();

    with_timeout(scheduler.run("nodemon:start")).await.unwrap();
    with_timeout(scheduler.run("nodemon:start")).await.unwrap();

    assert_eq!(services.running().await, vec!["nodemon:start".to_string()]);
    services.shutdown().await;
}
