use crate::{
    config::Config,
    timezone::{resolve_timezone, FixedTimezone, SystemTimezone, TimezoneLookup},
    types::{ActorId, Envelope, Metadata, Timezone},
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

/// Metadata key carrying a previously detected user timezone. Consumed by the
/// formatter, never logged.
pub const USER_TIMEZONE_HINT: &str = "userTimezoneHint";

/// Older call sites pass the hint under this name.
pub const USER_TIMEZONE_ALIAS: &str = "userTimezone";

pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Builds the envelope shared by every event.
#[derive(Clone, Debug)]
pub struct ContextFormatter {
    environment: String,
    server: FixedTimezone,
}

impl ContextFormatter {
    /// `server_timezone` overrides the ambient zone looked up through `lookup`.
    pub fn new<S: Into<String>>(
        environment: S,
        server_timezone: Option<String>,
        lookup: &dyn TimezoneLookup,
    ) -> Self {
        let environment = environment.into();
        let environment = if environment.trim().is_empty() {
            DEFAULT_ENVIRONMENT.to_owned()
        } else {
            environment
        };
        let server = resolve_timezone(server_timezone.as_deref(), lookup);
        Self {
            environment,
            server: FixedTimezone::new(server),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.environment.clone(), cfg.timezone.clone(), &SystemTimezone)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn server_timezone(&self) -> &str {
        self.server.0.as_deref().unwrap_or(crate::timezone::FALLBACK_TIMEZONE)
    }

    /// Produces the envelope for `actor`, merging `extra` after the reserved fields.
    /// Timezone hints are consumed and personal data keys dropped.
    pub fn format(&self, actor: Option<&str>, mut extra: Metadata) -> Envelope {
        let hint = take_hint(&mut extra, USER_TIMEZONE_HINT);
        let alias = take_hint(&mut extra, USER_TIMEZONE_ALIAS);
        let user = resolve_timezone(hint.or(alias).as_deref(), &self.server);

        let redacted = extra.redact_pii();
        if redacted > 0 {
            debug!(redacted, "Dropped personal data keys from event metadata");
        }

        Envelope {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            actor_id: ActorId::from(actor),
            timezone: Timezone {
                server: self.server_timezone().to_owned(),
                user,
            },
            environment: self.environment.clone(),
            metadata: extra,
        }
    }
}

fn take_hint(extra: &mut Metadata, key: &str) -> Option<String> {
    match extra.remove(key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::DateTime;

    fn formatter() -> ContextFormatter {
        ContextFormatter::new("production", None, &FixedTimezone::new("Europe/Lisbon"))
    }

    #[test]
    fn envelope_is_complete() {
        let env = formatter().format(Some("u1"), Metadata::new());
        assert!(DateTime::parse_from_rfc3339(&env.timestamp).is_ok());
        assert!(env.timestamp.ends_with('Z'));
        assert_eq!(env.actor_id.as_str(), "u1");
        assert_eq!(env.environment, "production");
        assert_eq!(env.timezone.server, "Europe/Lisbon");
        assert_eq!(env.timezone.user, "Europe/Lisbon");
    }

    #[test]
    fn missing_actor_is_anonymous() {
        let env = formatter().format(None, Metadata::new());
        assert!(env.actor_id.is_anonymous());
        let env = formatter().format(Some(""), Metadata::new());
        assert!(env.actor_id.is_anonymous());
    }

    #[test]
    fn hint_is_consumed_and_stripped() {
        let extra = Metadata::new()
            .with(USER_TIMEZONE_HINT, "America/Sao_Paulo")
            .with("postId", 3);
        let env = formatter().format(Some("u1"), extra);
        assert_eq!(env.timezone.user, "America/Sao_Paulo");
        assert!(!env.metadata.contains_key(USER_TIMEZONE_HINT));
        assert!(env.metadata.contains_key("postId"));

        let extra = Metadata::new().with(USER_TIMEZONE_ALIAS, "Asia/Tokyo");
        let env = formatter().format(Some("u1"), extra);
        assert_eq!(env.timezone.user, "Asia/Tokyo");
        assert!(env.metadata.is_empty());
    }

    #[test]
    fn server_override_and_defaults() {
        let f = ContextFormatter::new("", Some("UTC".to_owned()), &FixedTimezone::new("Asia/Tokyo"));
        assert_eq!(f.environment(), DEFAULT_ENVIRONMENT);
        assert_eq!(f.server_timezone(), "UTC");

        let f = ContextFormatter::new("test", None, &FixedTimezone::unavailable());
        assert_eq!(f.server_timezone(), "UTC");
    }

    #[test]
    fn personal_data_is_dropped() {
        let extra = Metadata::new()
            .with("email", "jane@example.com")
            .with("password", "hunter2");
        let env = formatter().format(None, extra);
        assert!(env.metadata.is_empty());
    }
}
