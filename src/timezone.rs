//! Timezone resolution for event envelopes.

use std::{env, fmt, fs, path::Path};

/// Returned whenever no timezone can be determined.
pub const FALLBACK_TIMEZONE: &str = "UTC";

/// Source of the ambient timezone of the host.
pub trait TimezoneLookup: Send + Sync + fmt::Debug {
    /// The IANA name of the ambient timezone, `None` when it can't be determined.
    fn lookup(&self) -> Option<String>;
}

/// Reads the host configuration: `TZ`, then `/etc/timezone`, then the target
/// of the `/etc/localtime` symlink.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemTimezone;

impl TimezoneLookup for SystemTimezone {
    fn lookup(&self) -> Option<String> {
        from_tz_var()
            .or_else(|| {
                fs::read_to_string("/etc/timezone")
                    .ok()
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
            })
            .or_else(|| {
                fs::read_link("/etc/localtime")
                    .ok()
                    .and_then(|p| zone_from_path(&p))
            })
    }
}

/// A lookup that always yields the same zone, or nothing.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct FixedTimezone(pub Option<String>);

impl FixedTimezone {
    pub fn new<S: Into<String>>(zone: S) -> Self {
        FixedTimezone(Some(zone.into()))
    }

    /// A lookup that always fails.
    pub fn unavailable() -> Self {
        FixedTimezone(None)
    }
}

impl TimezoneLookup for FixedTimezone {
    fn lookup(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolves the effective timezone of an event.
///
/// A non-blank `hint` (e.g. captured from a client cookie) is returned unchanged,
/// otherwise the ambient zone, otherwise [`FALLBACK_TIMEZONE`].
pub fn resolve_timezone(hint: Option<&str>, lookup: &dyn TimezoneLookup) -> String {
    if let Some(hint) = hint.filter(|h| !h.trim().is_empty()) {
        return hint.to_owned();
    }
    lookup
        .lookup()
        .filter(|tz| !tz.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_TIMEZONE.to_owned())
}

fn from_tz_var() -> Option<String> {
    let tz = env::var("TZ").ok()?;
    let tz = tz.trim().trim_start_matches(':');
    if tz.is_empty() {
        None
    } else if tz.starts_with('/') {
        zone_from_path(Path::new(tz))
    } else {
        Some(tz.to_owned())
    }
}

/// Extracts `Area/City` from a path into the zoneinfo database.
fn zone_from_path(path: &Path) -> Option<String> {
    let path = path.to_str()?;
    let (_, zone) = path.split_once("zoneinfo/")?;
    (!zone.is_empty()).then(|| zone.to_owned())
}
