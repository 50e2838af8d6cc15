use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use trim_pipeline::PipelineConfig;
use trim_transport::wire;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind: String,
    /// Bounded-copy executable, looked up on `PATH` when not absolute.
    pub ffmpeg: PathBuf,
    /// Defaults to the system temp directory.
    pub temp_dir: Option<PathBuf>,
    pub timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub accepted_types: Vec<String>,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
            ffmpeg: PathBuf::from("ffmpeg"),
            temp_dir: None,
            timeout_secs: 60,
            max_upload_bytes: 10 * 1024 * 1024,
            accepted_types: vec![wire::MIME_MPEG.to_string()],
            log_filter: "trim_server=info,trim_pipeline=info,warn".into(),
        }
    }
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os("TRIM_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("audio-trim").join("config.toml"))
    }

    /// Load from `$TRIM_CONFIG` or the user config dir, then apply `TRIM_BIND`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load() -> anyhow::Result<Self> {
        let config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(config.with_bind_override(std::env::var("TRIM_BIND").ok()))
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn with_bind_override(mut self, bind: Option<String>) -> Self {
        if let Some(bind) = bind.filter(|b| !b.trim().is_empty()) {
            self.bind = bind;
        }
        self
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("invalid bind address {:?}", self.bind))
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            temp_dir: self.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            accepted_types: self.accepted_types.clone(),
        }
    }
}
