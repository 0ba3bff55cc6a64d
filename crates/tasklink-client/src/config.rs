//! Client configuration: TOML file, environment overrides, defaults.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use crate::connection::{Endpoint, Timeouts};

const LOCAL_CONFIG_FILE: &str = "tasklink.toml";
const CONFIG_DIR: &str = "tasklink";
const CONFIG_FILE: &str = "config.toml";
const MAX_TIMEOUT_SECS: u64 = 300;

/// Environment variable overriding the server host.
pub const ENV_HOST: &str = "TASKLINK_HOST";
/// Environment variable overriding the server port.
pub const ENV_PORT: &str = "TASKLINK_PORT";

/// Top-level client configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Server location.
    #[serde(default)]
    pub server: ServerConfig,
    /// Socket timeouts.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Filter evaluation.
    #[serde(default)]
    pub filter: FilterConfig,
}

impl ClientConfig {
    /// Load configuration from an explicit file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded client configuration");
        Ok(config)
    }

    /// Look for `tasklink.toml` in `workdir`, then the per-user config file,
    /// and fall back to defaults when neither exists.
    ///
    /// # Errors
    /// Returns an error when a discovered file is invalid.
    pub fn discover(workdir: impl AsRef<Path>) -> Result<Self> {
        let local = workdir.as_ref().join(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::from_path(local);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_path(path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply `TASKLINK_HOST` / `TASKLINK_PORT` from the process environment.
    ///
    /// # Errors
    /// Returns an error when the port does not parse or the result is invalid.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let mut fetch = |key: &'static str| env::var(key).ok();
        self.apply_env_overrides_with(&mut fetch)
    }

    fn apply_env_overrides_with(
        &mut self,
        fetch: &mut impl FnMut(&'static str) -> Option<String>,
    ) -> Result<()> {
        if let Some(host) = env_value_with(ENV_HOST, fetch) {
            self.server.host = host;
        }
        if let Some(port) = env_value_with(ENV_PORT, fetch) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PORT} is not a valid port: {port}"))?;
        }
        self.validate()
    }

    /// Replace host and/or port, then validate the result.
    ///
    /// # Errors
    /// Returns an error when the resulting endpoint is invalid.
    pub fn override_endpoint(&mut self, host: Option<String>, port: Option<u16>) -> Result<()> {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self.validate()
    }

    /// Endpoint of the configured server.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.server.host.clone(), self.server.port)
    }

    /// Socket timeouts derived from the connection block.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_secs(self.connection.connect_timeout_secs),
            read: Duration::from_secs(self.connection.read_timeout_secs),
            write: Duration::from_secs(self.connection.write_timeout_secs),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            bail!("server.host must not be empty");
        }
        if self.server.port == 0 {
            bail!("server.port must not be 0");
        }
        for (name, secs) in [
            ("connect_timeout_secs", self.connection.connect_timeout_secs),
            ("read_timeout_secs", self.connection.read_timeout_secs),
            ("write_timeout_secs", self.connection.write_timeout_secs),
        ] {
            if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
                bail!("connection.{name} must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {secs}");
            }
        }
        Ok(())
    }
}

/// Location of the task server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host name or address.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

const fn default_port() -> u16 {
    8189
}

/// Socket timeouts in whole seconds.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Dial timeout.
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Per-read timeout.
    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Per-write timeout.
    #[serde(default = "default_timeout_secs")]
    pub write_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_timeout_secs(),
            read_timeout_secs: default_timeout_secs(),
            write_timeout_secs: default_timeout_secs(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    10
}

/// Where filters are evaluated. Fixed for the lifetime of a client.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Run the predicate pipeline over the local snapshot.
    #[default]
    Local,
    /// Send a `FILTER` command and return the server's answer.
    Server,
}

/// Filter block.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Where filters run.
    #[serde(default)]
    pub mode: FilterMode,
}

/// Returns the per-user configuration file path.
///
/// On Linux: `~/.config/tasklink/config.toml`
/// On macOS: `~/Library/Application Support/tasklink/config.toml`
/// On Windows: `%APPDATA%\tasklink\config.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

fn env_value_with(
    key: &'static str,
    fetch: &mut impl FnMut(&'static str) -> Option<String>,
) -> Option<String> {
    fetch(key).filter(|value| !value.trim().is_empty())
}
