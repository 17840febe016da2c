//! Render and flush configuration.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// How rendered chunks are grouped into transport frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Every chunk becomes its own frame.
    #[default]
    EachChunk,
    /// Chunks that are already available are merged into one frame,
    /// up to `max_bytes`. A frame is always flushed before the renderer
    /// suspends on a pending value.
    Coalesce { max_bytes: usize },
}

impl FlushPolicy {
    /// Byte threshold at which a frame is flushed (0 = flush every chunk).
    pub fn max_buffer(&self) -> usize {
        match self {
            Self::EachChunk => 0,
            Self::Coalesce { max_bytes } => *max_bytes,
        }
    }
}

/// Configuration for a render invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Prefix for placeholder slot names (e.g. `slot_` gives `slot_0`).
    #[serde(default = "default_slot_prefix")]
    pub slot_prefix: String,
    /// Frame grouping for the output adapter.
    #[serde(default)]
    pub flush: FlushPolicy,
}

fn default_slot_prefix() -> String {
    "slot_".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            slot_prefix: default_slot_prefix(),
            flush: FlushPolicy::default(),
        }
    }
}

impl RenderConfig {
    /// Create a configuration with default markup and flushing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slot name prefix.
    pub fn with_slot_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.slot_prefix = prefix.into();
        self
    }

    /// Set the flush policy.
    pub fn with_flush(mut self, flush: FlushPolicy) -> Self {
        self.flush = flush;
        self
    }

    /// Check that the slot prefix can be written into a `name="..."`
    /// attribute value as is.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.slot_prefix.is_empty() {
            return Err(RenderError::InvalidConfig(
                "slot_prefix must not be empty".to_string(),
            ));
        }
        let unsafe_char = |c: char| {
            matches!(c, '"' | '\'' | '<' | '>' | '&') || c.is_whitespace() || c.is_control()
        };
        if let Some(c) = self.slot_prefix.chars().find(|&c| unsafe_char(c)) {
            return Err(RenderError::InvalidConfig(format!(
                "slot_prefix {:?} contains {:?}",
                self.slot_prefix, c
            )));
        }
        Ok(())
    }
}
