//! Driving response bodies into a transport sink.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Sink, SinkExt, StreamExt};
use slotted_core::{LifecycleObserver, LifecyclePhase, RenderError, TimingContext};
use tracing::{debug, warn};

use crate::body::ByteStream;

/// State of the body writer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WriterState {
    /// Nothing written yet.
    Initial,
    /// At least one frame has been written.
    Streaming,
    /// Body finished and the sink was closed.
    Completed,
    /// Body failed; the sink was left open.
    Aborted(String),
}

/// Writes a response body into any `Sink<Vec<u8>>`.
///
/// On success the sink is closed. On failure the writer stops without
/// closing it, so the transport sees an unterminated body.
pub struct BodyWriter<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    inner: S,
    state: WriterState,
    timing: TimingContext,
    frames_sent: usize,
    bytes_sent: usize,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl<S, E> BodyWriter<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    /// Create a new body writer.
    pub fn new(sink: S, timing: TimingContext) -> Self {
        Self {
            inner: sink,
            state: WriterState::Initial,
            timing,
            frames_sent: 0,
            bytes_sent: 0,
            observer: None,
        }
    }

    /// Report lifecycle phases to an observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Write every frame of `body`, then close the sink.
    ///
    /// Returns the number of bytes written.
    pub async fn write_body(&mut self, mut body: ByteStream) -> Result<usize, RenderError> {
        if self.state != WriterState::Initial {
            return Err(RenderError::Transport(
                "Body already written".to_string(),
            ));
        }

        while let Some(frame) = body.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(frames = self.frames_sent, error = %err, "response body aborted");
                    self.abort(err.to_string());
                    return Err(err);
                }
            };
            self.send_frame(frame).await?;
        }

        if let Err(e) = self.inner.close().await {
            self.abort(e.to_string());
            return Err(RenderError::Transport(e.to_string()));
        }
        self.timing.mark("complete");
        self.state = WriterState::Completed;
        self.notify(LifecyclePhase::Completion);
        debug!(
            frames = self.frames_sent,
            bytes = self.bytes_sent,
            "response body complete"
        );

        Ok(self.bytes_sent)
    }

    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<(), RenderError> {
        let len = frame.len();
        if let Err(e) = self.inner.send(frame).await {
            self.abort(e.to_string());
            return Err(RenderError::Transport(e.to_string()));
        }

        self.frames_sent += 1;
        self.bytes_sent += len;
        if self.state == WriterState::Initial {
            self.timing.mark("first_frame");
            self.state = WriterState::Streaming;
            self.notify(LifecyclePhase::SkeletonSent);
        } else {
            self.notify(LifecyclePhase::Streaming(self.frames_sent));
        }

        Ok(())
    }

    fn abort(&mut self, reason: String) {
        self.state = WriterState::Aborted(reason.clone());
        self.notify(LifecyclePhase::Aborted(reason));
    }

    fn notify(&self, phase: LifecyclePhase) {
        if let Some(observer) = &self.observer {
            observer.on_phase(phase, self.timing.elapsed());
        }
    }

    /// Number of frames written.
    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }

    /// Number of bytes written.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Get the current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        match &self.state {
            WriterState::Initial => LifecyclePhase::Start,
            WriterState::Streaming if self.frames_sent == 1 => LifecyclePhase::SkeletonSent,
            WriterState::Streaming => LifecyclePhase::Streaming(self.frames_sent),
            WriterState::Completed => LifecyclePhase::Completion,
            WriterState::Aborted(reason) => LifecyclePhase::Aborted(reason.clone()),
        }
    }

    /// Get timing context reference.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}
