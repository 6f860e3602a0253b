use crate::types::{ActorId, ErrorInput, Level, Metadata, Operation, RecordKind, Step};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by the envelope. Caller metadata can never overwrite them.
pub const RESERVED_KEYS: &[&str] = &[
    "type",
    "level",
    "step",
    "operation",
    "userId",
    "timestamp",
    "timezone",
    "environment",
    "warning",
    "error",
    "stack",
    "message",
    "service",
];

/// Prefix applied to caller metadata keys that collide with [`RESERVED_KEYS`].
pub const RESERVED_KEY_PREFIX: &str = "meta_";

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct Timezone {
    /// Timezone of the emitting process.
    pub server: String,
    /// Timezone of the acting user, the server's when unknown.
    pub user: String,
}

/// Fields common to every event, produced by the context formatter.
#[derive(Clone, PartialEq, Debug)]
pub struct Envelope {
    /// ISO-8601 instant of emission.
    pub timestamp: String,
    pub actor_id: ActorId,
    pub timezone: Timezone,
    pub environment: String,
    /// Caller metadata, already stripped of hints, personal data and reserved keys.
    pub metadata: Metadata,
}

/// A single structured log line describing one domain occurrence.
#[derive(Clone, PartialEq, Debug)]
pub struct EventRecord {
    pub kind: RecordKind,
    pub level: Level,
    pub step: Step,
    pub operation: Operation,
    pub warning: Option<String>,
    pub error: Option<ErrorInput>,
    pub envelope: Envelope,
}

impl EventRecord {
    pub fn new(level: Level, step: Step, operation: Operation, envelope: Envelope) -> Self {
        Self {
            kind: level.into(),
            level,
            step,
            operation,
            warning: None,
            error: None,
            envelope,
        }
    }

    pub fn with_warning(mut self, warning: String) -> Self {
        self.warning = Some(warning);
        self
    }

    pub fn with_error(mut self, error: ErrorInput) -> Self {
        self.error = Some(error);
        self
    }

    pub fn actor_id(&self) -> &ActorId {
        &self.envelope.actor_id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.envelope.metadata
    }

    /// Human readable summary, e.g. `[EVENT_ERROR] AUTH → LOGIN_FAILED: bad credentials`.
    pub fn message(&self) -> String {
        let mut msg = format!("[{}] {} → {}", self.kind, self.step, self.operation);
        if let Some(w) = self.warning.as_ref() {
            msg.push_str(": ");
            msg.push_str(w);
        }
        if let Some(e) = self.error.as_ref() {
            msg.push_str(": ");
            msg.push_str(e.message());
        }
        msg
    }

    /// Flattens the record into the JSON object written by the transports.
    /// Envelope fields come first, caller metadata last.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("type".into(), self.kind.to_string().into());
        obj.insert("level".into(), self.level.to_string().into());
        obj.insert("step".into(), self.step.to_string().into());
        obj.insert("operation".into(), self.operation.as_str().into());
        obj.insert("userId".into(), self.envelope.actor_id.as_str().into());
        obj.insert("timestamp".into(), self.envelope.timestamp.clone().into());
        let mut timezone = Map::new();
        timezone.insert("server".into(), self.envelope.timezone.server.clone().into());
        timezone.insert("user".into(), self.envelope.timezone.user.clone().into());
        obj.insert("timezone".into(), Value::Object(timezone));
        obj.insert(
            "environment".into(),
            self.envelope.environment.clone().into(),
        );
        if let Some(w) = self.warning.as_ref() {
            obj.insert("warning".into(), w.clone().into());
        }
        if let Some(e) = self.error.as_ref() {
            obj.insert("error".into(), e.message().into());
            obj.insert("stack".into(), e.stack().into());
        }
        let metadata = &self.envelope.metadata;
        for (key, value) in metadata.iter() {
            if is_reserved_key(key) {
                let mut renamed = format!("{RESERVED_KEY_PREFIX}{key}");
                while obj.contains_key(&renamed) || metadata.contains_key(&renamed) {
                    renamed.insert_str(0, RESERVED_KEY_PREFIX);
                }
                obj.insert(renamed, value.clone());
            } else {
                obj.insert(key.clone(), value.clone());
            }
        }
        obj
    }
}
