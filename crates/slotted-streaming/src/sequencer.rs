//! Reporting pending values in the order they settle.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FusedStream, FuturesUnordered, Stream, StreamExt};
use slotted_core::RenderError;
use tokio::runtime::Handle;

use crate::node::Deferred;

/// A deferred value waiting for its slot.
#[derive(Debug)]
pub struct PendingSlot {
    /// Slot index in the boundary's flat slot space.
    pub slot: usize,
    /// The value that fills the slot.
    pub value: Deferred,
}

impl PendingSlot {
    /// Pair a value with its slot.
    pub fn new(slot: usize, value: Deferred) -> Self {
        Self { slot, value }
    }
}

/// A settled value and the slot it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub slot: usize,
    pub text: String,
}

type SlotFuture = BoxFuture<'static, (usize, anyhow::Result<String>)>;

// Without a runtime the value can only make progress while it is polled here.
fn detach(runtime: Option<&Handle>, slot: usize, value: Deferred) -> SlotFuture {
    match runtime {
        Some(runtime) => {
            let task = runtime.spawn(value);
            async move {
                let result = match task.await {
                    Ok(result) => result,
                    Err(join) => Err(anyhow::Error::new(join)),
                };
                (slot, result)
            }
            .boxed()
        }
        None => value.map(move |result| (slot, result)).boxed(),
    }
}

/// Stream of pending values in real completion order.
///
/// Every value is registered once in a single completion queue; each poll
/// reports the next value to settle and drops it from the pending set. The
/// stream ends when the set is empty, or right after the first failure.
///
/// Inside a tokio runtime each value is spawned as its own task when it is
/// registered. Dropping the stream, or ending it on a failure, only stops
/// reporting: values still in flight run to completion and their results
/// are discarded.
pub struct ResolutionOrder {
    pending: FuturesUnordered<SlotFuture>,
    failed: bool,
}

impl ResolutionOrder {
    /// Register every pending value.
    pub fn new(pending: impl IntoIterator<Item = PendingSlot>) -> Self {
        let runtime = Handle::try_current().ok();
        let pending = pending
            .into_iter()
            .map(|PendingSlot { slot, value }| detach(runtime.as_ref(), slot, value))
            .collect();

        Self {
            pending,
            failed: false,
        }
    }

    /// Number of values that have not been reported yet.
    pub fn remaining(&self) -> usize {
        if self.failed {
            0
        } else {
            self.pending.len()
        }
    }

    /// Whether every value has been reported (or a failure ended the stream).
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

impl Stream for ResolutionOrder {
    type Item = Result<Resolved, RenderError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.failed {
            return Poll::Ready(None);
        }

        match ready!(self.pending.poll_next_unpin(cx)) {
            Some((slot, Ok(text))) => Poll::Ready(Some(Ok(Resolved { slot, text }))),
            Some((slot, Err(source))) => {
                self.failed = true;
                Poll::Ready(Some(Err(RenderError::deferred(Some(slot), source))))
            }
            None => Poll::Ready(None),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (0, Some(remaining))
    }
}

impl FusedStream for ResolutionOrder {
    fn is_terminated(&self) -> bool {
        self.failed || self.pending.is_terminated()
    }
}
