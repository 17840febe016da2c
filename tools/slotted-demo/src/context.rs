//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::config::DemoConfig;
use crate::output::Output;

const CONFIG_NAMES: [&str; 3] = ["slotted.toml", ".slotted.toml", "slotted.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// Demo configuration.
    pub config: DemoConfig,
    /// Output handler.
    pub output: Output,
}

impl Context {
    /// Load context from an explicit config file, or the nearest one found
    /// from the working directory upwards.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let config = match config_path {
            Some(path) => DemoConfig::load(Path::new(path))?,
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                match find_config(&cwd) {
                    Some(path) => {
                        debug!(path = %path.display(), "using config file");
                        DemoConfig::load(&path)?
                    }
                    None => DemoConfig::default(),
                }
            }
        };

        Ok(Self { config, output })
    }
}

/// Find the nearest config file in `start` or its ancestors.
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_NAMES {
            let config_path = current.join(name);
            if config_path.is_file() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
