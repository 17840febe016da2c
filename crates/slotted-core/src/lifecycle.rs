//! Render lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Nothing has been written yet.
    Start,
    /// The first frame (the skeleton) has been flushed.
    SkeletonSent,
    /// Further frames have been flushed after the skeleton.
    Streaming(usize),
    /// The chunk sequence ended normally and the body was closed.
    Completion,
    /// The chunk sequence failed; the body was left unterminated.
    Aborted(String),
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark. The first mark under a name wins.
    pub fn mark(&mut self, name: &str) {
        self.marks
            .entry(name.to_string())
            .or_insert_with(Instant::now);
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Offset of a named mark from the start.
    pub fn mark_offset(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Get time to the first flushed frame.
    pub fn time_to_first_frame(&self) -> Option<Duration> {
        self.mark_offset("first_frame")
    }

    /// Get time to completion.
    pub fn time_to_complete(&self) -> Option<Duration> {
        self.mark_offset("complete")
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called when a lifecycle phase occurs.
    fn on_phase(&self, phase: LifecyclePhase, elapsed: Duration);
}
