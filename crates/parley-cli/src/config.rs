//! Configuration: optional `config.toml` with per-tool sections

use anyhow::{Context, Result, bail};
use parley_a2a::{ConnectionConfig, PollConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Agent endpoint used by `parley-chat` when none is given on the command line
    pub agent_url: Option<String>,
    pub chat: ChatConfig,
    pub validate: ValidateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub timeout_secs: u64,
    pub max_polls: u32,
    pub poll_interval_secs: f64,
    pub history_length: u32,
    pub accepted_output_modes: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_polls: 10,
            poll_interval_secs: 2.0,
            history_length: 100,
            accepted_output_modes: vec!["text/plain".to_string(), "application/json".to_string()],
        }
    }
}

impl ChatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_config(&self) -> Result<PollConfig> {
        let interval = Duration::try_from_secs_f64(self.poll_interval_secs)
            .with_context(|| format!("Invalid poll interval: {}", self.poll_interval_secs))?;
        Ok(PollConfig {
            max_polls: self.max_polls,
            interval,
            history_length: self.history_length,
        })
    }

    /// Non-streaming JSON-RPC with manual polling
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            accepted_output_modes: self.accepted_output_modes.clone(),
            polling: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidateConfig {
    pub timeout_secs: u64,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Default config location, e.g. `~/.config/parley/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("parley").join("config.toml"))
}

/// Load configuration
///
/// An explicitly given path must exist. The default location is optional and
/// falls back to built-in defaults when absent.
pub fn load_config(explicit: Option<&Path>) -> Result<ParleyConfig> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(ParleyConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ParleyConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}
