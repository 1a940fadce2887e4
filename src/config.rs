//! Server configuration
//!
//! Values come from an optional YAML file and are then overridden by
//! environment variables. Everything has a default, so an empty file (or no
//! file at all) yields a runnable configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_ENV: &str = "MAGENTA_CONFIG";

/// File looked up in the working directory when `MAGENTA_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "magenta.yaml";

/// Which protocol accepted connections speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// HTTP/1.0 static file serving
    #[default]
    Http,
    /// Line-oriented GET/SET/CLEAR/ALL word dictionary
    Dictionary,
}

impl FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "dictionary" => Ok(Protocol::Dictionary),
            other => anyhow::bail!("unknown protocol '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pending connection queue length passed to `listen(2)`
    pub backlog: u32,
    pub protocol: Protocol,
    /// Seconds an HTTP connection may sit idle before its request arrives.
    /// Dictionary sessions ignore it.
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8124,
            backlog: 128,
            protocol: Protocol::Http,
            read_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory that request targets are resolved against
    pub web_root: PathBuf,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from("public"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

impl Config {
    /// Loads the configuration file (if any) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => Self::default(),
        };

        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_yaml(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        // serde_yaml rejects an empty document, treat it as "all defaults"
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let cfg = serde_yaml::from_str(raw).context("failed to parse YAML config")?;
        Ok(cfg)
    }

    /// Overrides file values with `HOST`, `PORT`, `BACKLOG`, `WEB_ROOT` and `PROTOCOL`.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
        }

        if let Ok(backlog) = std::env::var("BACKLOG") {
            self.server.backlog = backlog
                .parse()
                .with_context(|| format!("BACKLOG must be a positive integer, got '{}'", backlog))?;
        }

        if let Ok(root) = std::env::var("WEB_ROOT") {
            self.static_files.web_root = PathBuf::from(root);
        }

        if let Ok(protocol) = std::env::var("PROTOCOL") {
            self.server.protocol = protocol.parse()?;
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Idle limit for a connection awaiting its request; 0 disables it.
    pub fn read_timeout(&self) -> Duration {
        match self.server.read_timeout_secs {
            0 => Duration::MAX,
            secs => Duration::from_secs(secs),
        }
    }
}
