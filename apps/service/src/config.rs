use std::time::Duration;
use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tracing::warn;

/// Period between two probes. Fixed, not configurable.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to read config file {}", .0.display())]
    ReadFailed(path::PathBuf, #[source] std::io::Error),
    #[error("Failed to write config file {}", .0.display())]
    WriteFailed(path::PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseFailed(String),
    #[error("Could not determine a config directory")]
    ConfigPathUnavailable,
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA name used for day boundaries, unknown names mean UTC
    pub timezone: String,
    pub probe: ProbeConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub target: String,
    pub timeout_seconds: u64,
    /// Synthesize measurements instead of pinging
    pub mock: bool,
    pub mock_failure_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: path::PathBuf,
    pub retention_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/netpulse/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("netpulse/config.toml"))
}

/// Parse an override, keeping `current` when the value is garbage
fn parse_override<T: std::str::FromStr>(name: &str, raw: &str, current: T) -> T {
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(variable = name, value = raw, "Ignoring unparseable environment override");
            current
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "UTC".into(),
            probe: ProbeConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { target: "8.8.8.8".into(), timeout_seconds: 5, mock: false, mock_failure_probability: 0.05 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: "./data".into(), retention_days: 30 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 5000 }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Configuration State:")?;
        write_title_1(f, "General")?;
        write_1(f, "Timezone", &self.timezone)?;
        write_1(f, "Probe Interval", &format!("{}s", PROBE_INTERVAL.as_secs()))?;
        write_title_1(f, "Probe")?;
        write_1(f, "Target", &self.probe.target)?;
        write_1(f, "Timeout", &format!("{}s", self.probe.timeout_seconds))?;
        write_1(f, "Mock Mode", &self.probe.mock)?;
        if self.probe.mock {
            write_1(f, "Mock Failure Probability", &self.probe.mock_failure_probability)?;
        }
        write_title_1(f, "Storage")?;
        write_1(f, "Data Directory", &self.storage.data_dir.display())?;
        write_1(f, "Retention", &format!("{} days", self.storage.retention_days))?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/netpulse/config.toml
    ///  or the specified path, with the name config.toml if one does not exist.
    /// Falls back to defaults when the default location is unknown or
    /// unwritable.
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let explicit = optional_path.is_some();
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            match default_config_path() {
                Ok(path) => path,
                Err(Error::ConfigPathUnavailable) => return Ok(Self::default()),
                Err(e) => return Err(e),
            }
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|err| Error::ReadFailed(config_path.clone(), err))?;
            Self::from_toml(&raw_string)
        } else {
            let config = Self::default();
            match config.write_config(&config_path) {
                Ok(()) => {}
                // Read-only homes are common in containers
                Err(err) if !explicit => warn!("Using default configuration: {err}"),
                Err(err) => return Err(err),
            }
            Ok(config)
        }
    }

    /// Parse a TOML document, missing keys take their defaults
    pub fn from_toml(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw).map_err(|err| Error::ParseFailed(err.to_string()))
    }

    /// Load from file, then apply process environment overrides
    pub fn load(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let mut config = Self::from_config(optional_path)?;
        config.apply_overrides(|name| env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply the deployment environment variables on top of the file values.
    ///
    /// `lookup` is `std::env::var` in production.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(tz) = lookup("TIMEZONE") {
            self.timezone = tz;
        }
        if let Some(target) = lookup("PING_TARGET") {
            self.probe.target = target;
        }
        if let Some(mock) = lookup("MOCK_PING") {
            self.probe.mock = mock.trim().eq_ignore_ascii_case("true");
        }
        if let Some(days) = lookup("CLEANUP_DAYS") {
            self.storage.retention_days =
                parse_override("CLEANUP_DAYS", &days, self.storage.retention_days);
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.storage.data_dir = dir.into();
        }
        if let Some(bind) = lookup("BIND") {
            self.server.bind = bind;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_override("PORT", &port, self.server.port);
        }
    }

    /// Reject values the core cannot run with
    pub fn validate(&self) -> Result<(), Error> {
        if self.probe.target.trim().is_empty() {
            return Err(Error::Invalid("probe target cannot be empty".into()));
        }
        if self.probe.timeout_seconds == 0 {
            return Err(Error::Invalid("probe timeout must be at least one second".into()));
        }
        if !(0.0..=1.0).contains(&self.probe.mock_failure_probability) {
            return Err(Error::Invalid(format!(
                "mock failure probability {} is outside [0, 1]",
                self.probe.mock_failure_probability
            )));
        }
        Ok(())
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|err| Error::ParseFailed(err.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::WriteFailed(parent.to_path_buf(), err))?;
        }

        std::fs::write(path, config_str).map_err(|err| Error::WriteFailed(path.to_path_buf(), err))
    }
}
