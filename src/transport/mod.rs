//! Destinations for event records and the once-per-process choice between them.

use crate::{
    error::Error,
    types::{EventRecord, Level, Operation, RecordKind, Step},
};
use derive_more::Display;
use serde_json::{Map, Value};
use std::{
    fmt,
    io::{self, Write},
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::Arc,
};
use tracing::{debug, warn};

pub use background::BackgroundTransport;
pub use console::ConsoleTransport;
#[cfg(feature = "files")]
pub use file::{FileTransport, COMBINED_LOG, ERROR_LOG};
pub use memory::MemoryTransport;

pub mod background;
pub mod console;
#[cfg(feature = "files")]
pub mod file;
pub mod memory;

/// One fully formatted line handed to every transport.
#[derive(Clone, PartialEq, Debug)]
pub struct LogLine {
    pub level: Level,
    /// Summary used by durable transports, e.g. `[EVENT] AUTH → LOGIN_SUCCESS`.
    pub message: String,
    /// The flattened record, `type` discriminator first.
    pub fields: Map<String, Value>,
}

impl LogLine {
    pub fn record_type(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl From<&EventRecord> for LogLine {
    fn from(record: &EventRecord) -> Self {
        LogLine {
            level: record.level,
            message: record.message(),
            fields: record.to_json(),
        }
    }
}

pub trait Transport: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Writes one line. A line is written whole or not at all.
    fn write(&self, line: &LogLine) -> Result<(), Error>;
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Mode {
    /// Single-line JSON on stdout/stderr only.
    #[display("console-only")]
    ConsoleOnly,
    /// Console plus the durable append-only files.
    #[display("full")]
    Full,
}

/// What the selector needs to know about the hosting process.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct RuntimeContext {
    pub read_only_fs: bool,
    pub log_dir: PathBuf,
    pub console: bool,
    pub service: String,
}

/// The selected set of transports. Writing never fails observably.
#[derive(Clone, Debug)]
pub struct Transports {
    mode: Mode,
    sinks: Vec<Arc<dyn Transport>>,
    degraded: Option<String>,
}

impl Transports {
    pub fn new(mode: Mode, sinks: Vec<Arc<dyn Transport>>) -> Self {
        Self {
            mode,
            sinks,
            degraded: None,
        }
    }

    pub fn console_only(console: bool) -> Self {
        Self::with_console(console.then(|| Arc::new(ConsoleTransport::stdio()) as Arc<dyn Transport>))
    }

    fn with_console(console: Option<Arc<dyn Transport>>) -> Self {
        Self::new(Mode::ConsoleOnly, console.into_iter().collect())
    }

    /// Adds a transport to the fan-out.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.sinks.push(transport);
        self
    }

    fn with_degraded(mut self, reason: String) -> Self {
        self.degraded = Some(reason);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Why full mode was abandoned, if it was.
    pub fn degraded(&self) -> Option<&str> {
        self.degraded.as_deref()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Fans the line out to every transport. Failures and panics inside a
    /// transport are swallowed and reported with a minimal line on stderr.
    pub fn write(&self, line: &LogLine) {
        for sink in self.sinks.iter() {
            match panic::catch_unwind(AssertUnwindSafe(|| sink.write(line))) {
                Ok(Ok(())) => (),
                Ok(Err(e)) => {
                    debug!(transport = sink.name(), error = %e, "Log transport write failed");
                    write_failure_indicator(sink.name(), &e.to_string());
                }
                Err(_) => {
                    debug!(transport = sink.name(), "Log transport panicked");
                    write_failure_indicator(sink.name(), "transport panicked");
                }
            }
        }
    }
}

/// Best-effort last resort when a transport fails.
pub(crate) fn write_failure_indicator(transport: &str, error: &str) {
    let mut fields = Map::new();
    fields.insert("type".into(), RecordKind::Error.to_string().into());
    fields.insert("level".into(), Level::Error.to_string().into());
    fields.insert("step".into(), Step::System.to_string().into());
    fields.insert("operation".into(), "LOG_TRANSPORT_FAILED".into());
    fields.insert("transport".into(), transport.into());
    fields.insert("error".into(), error.into());
    if let Ok(mut bytes) = serde_json::to_vec(&fields) {
        bytes.push(b'\n');
        let _ = io::stderr().lock().write_all(&bytes);
    }
}

/// Decides, once per process, where event records go.
///
/// Console-only when the filesystem is read-only or the durable backend is not
/// compiled in; full mode otherwise. A durable backend that fails to open
/// degrades to console-only with a single warning.
pub fn select_transports(ctx: &RuntimeContext) -> Transports {
    select_transports_with(ctx, Arc::new(ConsoleTransport::stdio()))
}

/// Like [`select_transports`], with `console` standing in for the standard streams.
/// It is dropped when the context mutes the console.
pub fn select_transports_with(ctx: &RuntimeContext, console: Arc<dyn Transport>) -> Transports {
    let console = Transports::with_console(ctx.console.then_some(console));
    if ctx.read_only_fs {
        debug!("Read-only filesystem, using console-only transports");
        return console;
    }

    match durable_transport(ctx) {
        None => {
            debug!("No durable log backend available, using console-only transports");
            console
        }
        Some(Ok(durable)) => {
            let mut full = console.with_transport(durable);
            full.mode = Mode::Full;
            full
        }
        Some(Err(e)) => {
            warn!(
                log_dir = %ctx.log_dir.display(),
                error = %e,
                operation = %Operation::TransportDegraded,
                "Unable to open file transports, using console only"
            );
            console.with_degraded(e.to_string())
        }
    }
}

#[cfg(feature = "files")]
fn durable_transport(ctx: &RuntimeContext) -> Option<Result<Arc<dyn Transport>, Error>> {
    Some(
        FileTransport::open(&ctx.log_dir, ctx.service.clone())
            .map(|f| Arc::new(f) as Arc<dyn Transport>),
    )
}

#[cfg(not(feature = "files"))]
fn durable_transport(_ctx: &RuntimeContext) -> Option<Result<Arc<dyn Transport>, Error>> {
    None
}
