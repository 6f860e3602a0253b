use crate::{
    config::Config,
    context::ContextFormatter,
    transport::{select_transports, LogLine, Transports},
    types::{is_canonical, ErrorInput, EventRecord, Level, Metadata, Operation, Step},
};
use once_cell::sync::OnceCell;
use tracing::warn;

static GLOBAL: OnceCell<EventEmitter> = OnceCell::new();

/// Merges context, taxonomy and metadata into event records and hands them to
/// the selected transports.
///
/// Emitting never fails and never panics outward: every internal fault is
/// absorbed by the transports.
#[derive(Clone, Debug)]
pub struct EventEmitter {
    formatter: ContextFormatter,
    transports: Transports,
    threshold: Level,
}

impl EventEmitter {
    /// Selects transports for this process from the configuration.
    pub fn new(cfg: &Config) -> Self {
        Self::with_transports(cfg, select_transports(&cfg.runtime_context()))
    }

    /// Builds the emitter on already selected transports. When they were degraded
    /// to console-only, one `SYSTEM`/`TRANSPORT_DEGRADED` warning record is written
    /// to them whatever the verbosity threshold.
    pub fn with_transports(cfg: &Config, transports: Transports) -> Self {
        let emitter = Self::from_parts(ContextFormatter::from_config(cfg), transports, cfg.level);
        if let Some(reason) = emitter.transports.degraded() {
            let metadata = Metadata::new()
                .with("logDir", cfg.log_dir.display().to_string())
                .with("mode", emitter.transports.mode().to_string());
            let record = EventRecord::new(
                Level::Warn,
                Step::System,
                Operation::TransportDegraded,
                emitter.formatter.format(None, metadata),
            )
            .with_warning(reason.to_owned());
            emitter.transports.write(&LogLine::from(&record));
        }
        emitter
    }

    pub fn from_parts(formatter: ContextFormatter, transports: Transports, threshold: Level) -> Self {
        Self {
            formatter,
            transports,
            threshold,
        }
    }

    pub fn formatter(&self) -> &ContextFormatter {
        &self.formatter
    }

    pub fn transports(&self) -> &Transports {
        &self.transports
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    pub fn emit_event<S, O>(&self, step: S, operation: O, actor: Option<&str>, metadata: Metadata)
    where
        S: Into<Step>,
        O: Into<Operation>,
    {
        self.emit(Level::Info, step.into(), operation.into(), actor, metadata, |r| r);
    }

    pub fn emit_warning<S, O, W>(
        &self,
        step: S,
        operation: O,
        actor: Option<&str>,
        warning: W,
        metadata: Metadata,
    ) where
        S: Into<Step>,
        O: Into<Operation>,
        W: Into<String>,
    {
        let warning = warning.into();
        self.emit(Level::Warn, step.into(), operation.into(), actor, metadata, |r| {
            r.with_warning(warning)
        });
    }

    pub fn emit_error<S, O, E>(
        &self,
        step: S,
        operation: O,
        actor: Option<&str>,
        error: E,
        metadata: Metadata,
    ) where
        S: Into<Step>,
        O: Into<Operation>,
        E: Into<ErrorInput>,
    {
        let error = error.into();
        self.emit(Level::Error, step.into(), operation.into(), actor, metadata, |r| {
            r.with_error(error)
        });
    }

    /// Technical detail, only written when the threshold is `debug`.
    pub fn emit_debug<S, O>(&self, step: S, operation: O, actor: Option<&str>, metadata: Metadata)
    where
        S: Into<Step>,
        O: Into<Operation>,
    {
        self.emit(Level::Debug, step.into(), operation.into(), actor, metadata, |r| r);
    }

    fn emit<F>(
        &self,
        level: Level,
        step: Step,
        operation: Operation,
        actor: Option<&str>,
        metadata: Metadata,
        detail: F,
    ) where
        F: FnOnce(EventRecord) -> EventRecord,
    {
        if !level.enabled_at(self.threshold) {
            return;
        }
        if !is_canonical(&step, &operation) {
            warn!(%step, %operation, "Event outside the step/operation taxonomy, logged verbatim");
        }

        let envelope = self.formatter.format(actor, metadata);
        let record = detail(EventRecord::new(level, step, operation, envelope));
        self.transports.write(&LogLine::from(&record));
    }
}

/// Installs the process-wide emitter. The first call wins; later emitters are
/// handed back.
pub fn init(emitter: EventEmitter) -> Result<(), EventEmitter> {
    GLOBAL.set(emitter)
}

/// The process-wide emitter, built from the environment on first use when
/// [`init`] was never called.
pub fn global() -> &'static EventEmitter {
    GLOBAL.get_or_init(|| {
        let cfg = Config::from_env().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid logging configuration, falling back to defaults");
            Config::default()
        });
        EventEmitter::new(&cfg)
    })
}

pub fn emit_event<S, O>(step: S, operation: O, actor: Option<&str>, metadata: Metadata)
where
    S: Into<Step>,
    O: Into<Operation>,
{
    global().emit_event(step, operation, actor, metadata)
}

pub fn emit_warning<S, O, W>(step: S, operation: O, actor: Option<&str>, warning: W, metadata: Metadata)
where
    S: Into<Step>,
    O: Into<Operation>,
    W: Into<String>,
{
    global().emit_warning(step, operation, actor, warning, metadata)
}

pub fn emit_error<S, O, E>(step: S, operation: O, actor: Option<&str>, error: E, metadata: Metadata)
where
    S: Into<Step>,
    O: Into<Operation>,
    E: Into<ErrorInput>,
{
    global().emit_error(step, operation, actor, error, metadata)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        timezone::FixedTimezone,
        transport::{MemoryTransport, Mode, Transport},
    };
    use serde_json::json;
    use std::sync::Arc;

    fn emitter(threshold: Level) -> (EventEmitter, Arc<MemoryTransport>) {
        let memory = Arc::new(MemoryTransport::new());
        let transports = Transports::new(Mode::ConsoleOnly, vec![memory.clone() as Arc<dyn Transport>]);
        let formatter = ContextFormatter::new("test", None, &FixedTimezone::new("UTC"));
        (
            EventEmitter::from_parts(formatter, transports, threshold),
            memory,
        )
    }

    #[test]
    fn threshold_filters_levels() {
        let (em, memory) = emitter(Level::Warn);
        em.emit_event(Step::View, Operation::ViewHome, Some("u1"), Metadata::new());
        em.emit_debug(Step::System, "CACHE_MISS", None, Metadata::new());
        em.emit_warning(Step::Api, Operation::ApiUnauthorized, None, "no session", Metadata::new());
        em.emit_error(Step::Auth, Operation::LoginFailed, None, "bad credentials", Metadata::new());
        let levels: Vec<Level> = memory.lines().iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![Level::Warn, Level::Error]);
    }

    #[test]
    fn debug_threshold_lets_everything_through() {
        let (em, memory) = emitter(Level::Debug);
        em.emit_debug(Step::System, "CACHE_MISS", None, Metadata::new());
        let lines = memory.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].record_type(), Some("EVENT"));
        assert_eq!(lines[0].get("level"), Some(&json!("debug")));
    }

    #[test]
    fn free_form_pairs_pass_through_verbatim() {
        let (em, memory) = emitter(Level::Info);
        em.emit_event("checkout", "payment_captured", Some("u9"), Metadata::new());
        let line = &memory.lines()[0];
        assert_eq!(line.get("step"), Some(&json!("checkout")));
        assert_eq!(line.get("operation"), Some(&json!("payment_captured")));
        assert_eq!(line.message, "[EVENT] checkout → payment_captured");
    }

    #[test]
    fn warnings_carry_the_warning_text() {
        let (em, memory) = emitter(Level::Info);
        em.emit_warning(
            Step::Api,
            Operation::ApiGetPostFailed,
            Some("u1"),
            "Post not found",
            Metadata::new().with("statusCode", 404),
        );
        let line = &memory.lines()[0];
        assert_eq!(line.record_type(), Some("EVENT_WARNING"));
        assert_eq!(line.get("warning"), Some(&json!("Post not found")));
        assert_eq!(line.get("statusCode"), Some(&json!(404)));
        assert_eq!(
            line.message,
            "[EVENT_WARNING] API → API_GET_POST_FAILED: Post not found"
        );
    }
}
