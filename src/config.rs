use crate::{context::DEFAULT_ENVIRONMENT, error::Error, transport::RuntimeContext, types::Level};
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};

/// Deployment environment name.
pub const ENV_ENVIRONMENT: &str = "APP_ENV";
/// Verbosity threshold (`error`, `warn`, `info`, `debug`).
pub const ENV_LEVEL: &str = "LOG_LEVEL";
/// Explicit server timezone override.
pub const ENV_TIMEZONE: &str = "LOG_TIMEZONE";
/// Truthy when the deployment filesystem is read-only or ephemeral.
pub const ENV_READ_ONLY_FS: &str = "LOG_READ_ONLY_FS";
/// Set to `1` by Vercel deployments, which have a read-only filesystem.
pub const ENV_VERCEL: &str = "VERCEL";
pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_SERVICE: &str = "LOG_SERVICE";

/// Environment name under which console output is muted by default.
pub const TEST_ENVIRONMENT: &str = "test";

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_SERVICE: &str = "app";

/// Process-wide logging configuration.
///
/// Every field is optional in YAML; environment variables take precedence over
/// the file when applied with [`Config::apply_env`].
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Deployment environment tag stamped on every record.
    pub environment: String,
    /// Records less severe than this are dropped.
    pub level: Level,
    /// Server timezone override, the host's zone when unset.
    pub timezone: Option<String>,
    /// No durable filesystem: forces console-only transports.
    pub read_only_fs: bool,
    /// Directory holding `combined.log` and `error.log`.
    pub log_dir: PathBuf,
    /// Service tag stamped on durable log lines.
    pub service: String,
    /// Console output, defaults to on outside the test environment.
    pub console: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            level: Level::default(),
            timezone: None,
            read_only_fs: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            service: DEFAULT_SERVICE.to_owned(),
            console: None,
        }
    }
}

impl Config {
    pub fn from_yaml_str(s: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let cfg_str = fs::read_to_string(path)?;
        Self::from_yaml_str(&cfg_str)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        cfg.apply_lookup(lookup)?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) -> Result<(), Error> {
        self.apply_lookup(|key| env::var(key).ok())
    }

    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(environment) = var(ENV_ENVIRONMENT) {
            self.environment = environment.trim().to_owned();
        }
        if let Some(level) = var(ENV_LEVEL) {
            self.level = level.parse()?;
        }
        if let Some(tz) = var(ENV_TIMEZONE) {
            self.timezone = Some(tz.trim().to_owned());
        }
        if var(ENV_READ_ONLY_FS).is_some_and(|v| is_truthy(&v))
            || var(ENV_VERCEL).is_some_and(|v| v.trim() == "1")
        {
            self.read_only_fs = true;
        }
        if let Some(dir) = var(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(service) = var(ENV_SERVICE) {
            self.service = service.trim().to_owned();
        }
        Ok(())
    }

    pub fn console_enabled(&self) -> bool {
        self.console
            .unwrap_or(self.environment != TEST_ENVIRONMENT)
    }

    pub fn runtime_context(&self) -> RuntimeContext {
        RuntimeContext {
            read_only_fs: self.read_only_fs,
            log_dir: self.log_dir.clone(),
            console: self.console_enabled(),
            service: self.service.clone(),
        }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
