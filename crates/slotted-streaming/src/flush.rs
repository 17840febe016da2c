//! Explicit flush control - no implicit buffering.

use slotted_core::FlushPolicy;

/// Accumulates rendered chunks into transport frames.
#[derive(Debug)]
pub struct FlushController {
    policy: FlushPolicy,
    buffer: Vec<u8>,
    /// Maximum bytes to buffer (0 = immediate flush).
    max_buffer: usize,
}

impl FlushController {
    /// Create a new flush controller with given policy.
    pub fn new(policy: FlushPolicy) -> Self {
        Self {
            policy,
            buffer: Vec::new(),
            max_buffer: policy.max_buffer(),
        }
    }

    /// Append a chunk to the pending frame.
    pub fn push(&mut self, chunk: &str) {
        self.buffer.extend_from_slice(chunk.as_bytes());
    }

    /// Bytes waiting to be flushed.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is waiting to be flushed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if the pending frame must be flushed now.
    pub fn should_flush(&self) -> bool {
        !self.buffer.is_empty() && (self.max_buffer == 0 || self.buffer.len() >= self.max_buffer)
    }

    /// Take the pending frame, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get current policy.
    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }
}

impl Default for FlushController {
    fn default() -> Self {
        Self::new(FlushPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_chunk_flushes_every_push() {
        let mut controller = FlushController::default();
        assert!(!controller.should_flush());

        controller.push("<div>");
        assert!(controller.should_flush());
        assert_eq!(controller.take(), b"<div>".to_vec());
        assert!(controller.is_empty());
    }

    #[test]
    fn test_coalesce_waits_for_threshold() {
        let mut controller = FlushController::new(FlushPolicy::Coalesce { max_bytes: 8 });

        controller.push("<p>");
        assert!(!controller.should_flush());
        assert_eq!(controller.pending_bytes(), 3);

        controller.push("hello</p>");
        assert!(controller.should_flush());
        assert_eq!(controller.take(), b"<p>hello</p>".to_vec());
        assert_eq!(controller.policy(), FlushPolicy::Coalesce { max_bytes: 8 });
    }

    #[test]
    fn test_empty_chunk_does_not_flush() {
        let mut controller = FlushController::default();
        controller.push("");
        assert!(!controller.should_flush());
    }
}
