use derive_more::Display;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

pub use fault::ErrorInput;
pub use metadata::Metadata;
pub use record::{Envelope, EventRecord, Timezone};
pub use taxonomy::{is_canonical, Operation, Step};

pub mod fault;
pub mod metadata;
pub mod record;
pub mod taxonomy;

/// Severity of an event record, numbered the way npm-style loggers number them:
/// lower is more severe.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Default,
    Display,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    #[display("error")]
    Error = 0,
    #[display("warn")]
    #[serde(alias = "warning")]
    Warn = 1,
    #[default]
    #[display("info")]
    Info = 2,
    #[display("debug")]
    Debug = 3,
}

impl Level {
    /// Returns true if a record at this level passes the given verbosity threshold.
    pub fn enabled_at(self, threshold: Level) -> bool {
        u8::from(self) <= u8::from(threshold)
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            _ => Err(Error::InvalidLevel(s.to_owned())),
        }
    }
}

/// The `type` discriminator log collectors key on.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Serialize)]
pub enum RecordKind {
    #[display("EVENT")]
    #[serde(rename = "EVENT")]
    Event,
    #[display("EVENT_WARNING")]
    #[serde(rename = "EVENT_WARNING")]
    Warning,
    #[display("EVENT_ERROR")]
    #[serde(rename = "EVENT_ERROR")]
    Error,
}

impl From<Level> for RecordKind {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => RecordKind::Error,
            Level::Warn => RecordKind::Warning,
            Level::Info | Level::Debug => RecordKind::Event,
        }
    }
}

/// Identifier of the acting user.
///
/// Falls back to [`ActorId::ANONYMOUS`] for missing or blank identifiers, and for
/// anything shaped like an email address so that a raw address never reaches a log.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn anonymous() -> Self {
        ActorId(Self::ANONYMOUS.to_owned())
    }

    pub fn new<S: AsRef<str>>(id: S) -> Self {
        let id = id.as_ref().trim();
        if id.is_empty() || id.contains('@') {
            Self::anonymous()
        } else {
            ActorId(id.to_owned())
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl From<Option<&str>> for ActorId {
    fn from(id: Option<&str>) -> Self {
        id.map(ActorId::new).unwrap_or_default()
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        ActorId::new(id)
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        ActorId::new(id)
    }
}
