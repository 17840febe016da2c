//! Demo configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slotted_core::RenderConfig;

/// Demo configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Markup and flushing.
    #[serde(default)]
    pub render: RenderConfig,

    /// Demo page latencies.
    #[serde(default)]
    pub page: PageConfig,
}

impl DemoConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        config
            .render
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_addr")]
    pub addr: String,
}

fn default_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

/// How long each deferred value on the demo page takes to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default = "default_title_delay")]
    pub title_delay_ms: u64,

    #[serde(default = "default_content_delay")]
    pub content_delay_ms: u64,

    #[serde(default = "default_nested_delay")]
    pub nested_delay_ms: u64,
}

fn default_title_delay() -> u64 {
    2_000
}

fn default_content_delay() -> u64 {
    1_000
}

fn default_nested_delay() -> u64 {
    500
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title_delay_ms: default_title_delay(),
            content_delay_ms: default_content_delay(),
            nested_delay_ms: default_nested_delay(),
        }
    }
}
