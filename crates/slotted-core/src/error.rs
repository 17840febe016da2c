//! Error and chunk sequence types shared by the engine and its transports.

use futures::stream::BoxStream;

/// Lazy sequence of rendered text chunks.
///
/// A chunk sequence is finite and can only be consumed once. It ends either
/// normally or with a single terminal [`RenderError`].
pub type ChunkStream = BoxStream<'static, Result<String, RenderError>>;

/// Errors produced while composing or streaming a document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Literal and interpolation counts do not line up.
    #[error(
        "Expected one more literal than interpolations, got {literals} literal(s) and {interpolations} interpolation(s)"
    )]
    StructuralArity {
        literals: usize,
        interpolations: usize,
    },

    /// A deferred value settled with an error.
    #[error("Deferred value {} failed: {source}", slot_label(.slot))]
    DeferredValueFailure {
        /// Slot the value was placed in, `None` when rendered in order.
        slot: Option<usize>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No handler accepts '{0}'")]
    NoHandler(String),

    #[error("Invalid render config: {0}")]
    InvalidConfig(String),
}

fn slot_label(slot: &Option<usize>) -> String {
    match slot {
        Some(slot) => format!("for slot {}", slot),
        None => "(in order)".to_string(),
    }
}

impl RenderError {
    /// Build an arity error from the two sequence lengths.
    pub fn arity(literals: usize, interpolations: usize) -> Self {
        Self::StructuralArity {
            literals,
            interpolations,
        }
    }

    /// Wrap the failure of a deferred value.
    pub fn deferred(slot: Option<usize>, source: anyhow::Error) -> Self {
        Self::DeferredValueFailure { slot, source }
    }

    /// Slot of the failed deferred value, if this is a placed deferred failure.
    pub fn failed_slot(&self) -> Option<usize> {
        match self {
            Self::DeferredValueFailure { slot, .. } => *slot,
            _ => None,
        }
    }
}
