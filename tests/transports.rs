use journey_log::{
    codec::JsonObject,
    context::ContextFormatter,
    timezone::FixedTimezone,
    transport::{BackgroundTransport, ConsoleTransport, COMBINED_LOG, ERROR_LOG},
    *,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::{
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex},
};
use test_log::test;
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;

fn config(log_dir: &Path) -> Config {
    Config {
        environment: "production".to_owned(),
        timezone: Some("Europe/Lisbon".to_owned()),
        log_dir: log_dir.to_owned(),
        service: "code-connect".to_owned(),
        console: Some(false),
        ..Default::default()
    }
}

async fn read_records(path: &Path) -> Vec<JsonObject> {
    let file = tokio::fs::File::open(path).await.unwrap();
    let mut reader = FramedRead::new(file, JsonLinesCodec::new());
    let mut records = Vec::new();
    while let Some(obj) = reader.next().await {
        records.push(obj.unwrap());
    }
    records
}

fn operations(records: &[JsonObject]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["operation"].as_str().unwrap())
        .collect()
}

#[test(tokio::test)]
async fn full_mode_writes_combined_and_error_logs() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    let events = EventEmitter::new(&config(&log_dir));
    assert_eq!(events.transports().mode(), Mode::Full);
    assert_eq!(events.transports().names(), vec!["file"]);

    events.login(Some("u1"), Outcome::Success);
    events.api_access(
        None,
        ApiResource::Post,
        "/api/posts/[slug]",
        ApiOutcome::Unauthorized,
        Metadata::new(),
    );
    events.submit_comment(Some("u1"), 42, Outcome::failure("db down"));

    let combined = read_records(&log_dir.join(COMBINED_LOG)).await;
    assert_eq!(
        operations(&combined),
        vec!["LOGIN_SUCCESS", "API_UNAUTHORIZED", "SUBMIT_COMMENT"]
    );
    let first = &combined[0];
    assert_eq!(first["level"], json!("info"));
    assert_eq!(first["message"], json!("[EVENT] AUTH → LOGIN_SUCCESS"));
    assert_eq!(first["service"], json!("code-connect"));
    assert_eq!(first["environment"], json!("production"));
    assert_eq!(
        first["timezone"],
        json!({"server": "Europe/Lisbon", "user": "Europe/Lisbon"})
    );

    let errors = read_records(&log_dir.join(ERROR_LOG)).await;
    assert_eq!(operations(&errors), vec!["SUBMIT_COMMENT"]);
    assert_eq!(errors[0]["type"], json!("EVENT_ERROR"));
    assert_eq!(errors[0]["postId"], json!(42));
    assert_eq!(
        errors[0]["message"],
        json!("[EVENT_ERROR] INTERACTION → SUBMIT_COMMENT: db down")
    );
}

#[test(tokio::test)]
async fn durable_files_are_appended_across_emitters() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());

    EventEmitter::new(&cfg).logout(Some("u1"));
    EventEmitter::new(&cfg).logout(Some("u2"));

    let combined = read_records(&dir.path().join(COMBINED_LOG)).await;
    let users: Vec<&Value> = combined.iter().map(|r| &r["userId"]).collect();
    assert_eq!(users, vec![&json!("u1"), &json!("u2")]);
}

#[test]
fn read_only_filesystem_is_console_only() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    let mut cfg = config(&log_dir);
    cfg.apply_lookup(|key| (key == "VERCEL").then(|| "1".to_owned()))
        .unwrap();
    assert!(cfg.read_only_fs);

    let events = EventEmitter::new(&cfg);
    assert_eq!(events.transports().mode(), Mode::ConsoleOnly);
    assert_eq!(events.transports().degraded(), None);

    events.emit_error(
        Step::Auth,
        Operation::LoginFailed,
        None,
        "bad credentials",
        Metadata::new(),
    );
    assert!(!log_dir.exists());
}

#[derive(Clone, Default)]
struct SharedStream(Arc<Mutex<Vec<u8>>>);

impl Write for SharedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedStream {
    fn records(&self) -> Vec<Value> {
        let text = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
        text.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }
}

#[test]
fn unwritable_log_dir_degrades_to_console() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let cfg = Config {
        console: Some(true),
        level: Level::Error,
        ..config(&blocker.join("logs"))
    };
    let (out, err) = (SharedStream::default(), SharedStream::default());
    let console = ConsoleTransport::with_writers(Box::new(out.clone()), Box::new(err.clone()));
    let transports = select_transports_with(&cfg.runtime_context(), Arc::new(console));
    assert_eq!(transports.mode(), Mode::ConsoleOnly);
    assert_eq!(transports.names(), vec!["console"]);
    assert!(transports.degraded().is_some());

    let events = EventEmitter::with_transports(&cfg, transports);
    events.submit_comment(Some("u2"), 42, Outcome::failure("db down"));

    assert!(out.records().is_empty());
    let records = err.records();
    assert_eq!(records.len(), 2);

    let degraded = &records[0];
    assert_eq!(degraded["type"], json!("EVENT_WARNING"));
    assert_eq!(degraded["step"], json!("SYSTEM"));
    assert_eq!(degraded["operation"], json!("TRANSPORT_DEGRADED"));
    assert_eq!(degraded["userId"], json!("anonymous"));
    assert_eq!(degraded["mode"], json!("console-only"));
    assert!(degraded["warning"].as_str().unwrap().contains("not writable"));

    let error = &records[1];
    assert_eq!(error["type"], json!("EVENT_ERROR"));
    assert_eq!(error["operation"], json!("SUBMIT_COMMENT"));
    assert_eq!(error["postId"], json!(42));
    assert_eq!(error["error"], json!("db down"));
    assert!(dir.path().join("not-a-dir").is_file());
}

#[test]
fn healthy_transports_report_no_degradation() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        console: Some(true),
        ..config(dir.path())
    };
    let (out, err) = (SharedStream::default(), SharedStream::default());
    let console = ConsoleTransport::with_writers(Box::new(out.clone()), Box::new(err.clone()));
    let transports = select_transports_with(&cfg.runtime_context(), Arc::new(console));
    assert_eq!(transports.mode(), Mode::Full);
    assert_eq!(transports.names(), vec!["console", "file"]);

    let events = EventEmitter::with_transports(&cfg, transports);
    assert!(err.records().is_empty());
    events.like_post(Some("u1"), 7);
    let records = out.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["operation"], json!("LIKE_POST"));
}

#[test(tokio::test)]
async fn background_transport_preserves_order() {
    let (background, handle) = BackgroundTransport::spawn(Vec::<u8>::new());
    let transports = Transports::new(Mode::ConsoleOnly, vec![Arc::new(background) as Arc<dyn Transport>]);
    let formatter = ContextFormatter::new("test", None, &FixedTimezone::new("UTC"));
    let events = EventEmitter::from_parts(formatter, transports, Level::Info);

    for post_id in 0..20 {
        events.like_post(Some("u1"), post_id);
    }
    drop(events);

    let bytes = handle.await.unwrap().unwrap();
    let mut reader = FramedRead::new(bytes.as_slice(), JsonLinesCodec::new());
    let mut post_ids = Vec::new();
    while let Some(obj) = reader.next().await {
        let obj = obj.unwrap();
        assert_eq!(obj["type"], json!("EVENT"));
        post_ids.push(obj["postId"].as_i64().unwrap());
    }
    assert_eq!(post_ids, (0..20).collect::<Vec<i64>>());
}

#[test]
fn yaml_configuration() {
    let cfg = Config::from_yaml_str(
        "environment: staging\nlevel: warn\nread-only-fs: true\nservice: code-connect\n",
    )
    .unwrap();
    assert_eq!(cfg.environment, "staging");
    assert_eq!(cfg.level, Level::Warn);
    assert!(cfg.read_only_fs);
    assert_eq!(select_transports(&cfg.runtime_context()).mode(), Mode::ConsoleOnly);
}
