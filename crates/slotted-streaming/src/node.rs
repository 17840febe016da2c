//! Composite nodes: the data model of a template invocation.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt};
use slotted_core::{ChunkStream, RenderError};

use crate::interleave::{zip_segments, Segment};

/// A text value that settles exactly once, possibly with an error.
///
/// Values built with [`Deferred::new`] or [`Deferred::try_new`] are lazy
/// until a renderer takes them over; the out-of-order renderer then runs each
/// one as its own task, so it finishes even if the render is abandoned.
/// [`Deferred::spawn`] starts the work right away on the tokio runtime.
pub struct Deferred(BoxFuture<'static, anyhow::Result<String>>);

impl Deferred {
    /// Wrap an infallible text future.
    pub fn new<F, T>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        T: Into<String>,
    {
        Self(future.map(|text| Ok::<String, anyhow::Error>(text.into())).boxed())
    }

    /// Wrap a fallible text future.
    pub fn try_new<F, T>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<String>,
    {
        Self(future.map(|result| result.map(Into::<String>::into)).boxed())
    }

    /// A value that has already resolved.
    pub fn ready(text: impl Into<String>) -> Self {
        Self(futures::future::ready(Ok(text.into())).boxed())
    }

    /// A value that has already failed.
    pub fn failed(error: anyhow::Error) -> Self {
        Self(futures::future::ready(Err(error)).boxed())
    }

    /// Start the work on the current tokio runtime.
    ///
    /// The task keeps running if the render is dropped before the value is
    /// consumed; its result is then discarded.
    pub fn spawn<F, T>(future: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<String> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        Self::try_new(async move {
            match handle.await {
                Ok(result) => result.map(Into::<String>::into),
                Err(join) => Err(anyhow::Error::new(join)),
            }
        })
    }
}

impl Future for Deferred {
    type Output = anyhow::Result<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

/// A value interpolated between two literal fragments.
pub enum Interpolation {
    /// Text that is available now.
    Immediate(String),
    /// Text that becomes available later.
    Deferred(Deferred),
    /// A nested template sharing the enclosing slot space.
    Nested(Composite),
    /// An already-rendered chunk sequence.
    ///
    /// In-order rendering splices it in place. Out-of-order rendering treats
    /// it as one deferred value holding its full text.
    Streamed(ChunkStream),
}

impl fmt::Debug for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(text) => f.debug_tuple("Immediate").field(text).finish(),
            Self::Deferred(deferred) => deferred.fmt(f),
            Self::Nested(node) => f.debug_tuple("Nested").field(node).finish(),
            Self::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

impl From<String> for Interpolation {
    fn from(text: String) -> Self {
        Self::Immediate(text)
    }
}

impl From<&str> for Interpolation {
    fn from(text: &str) -> Self {
        Self::Immediate(text.to_string())
    }
}

impl From<Deferred> for Interpolation {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}

impl From<Composite> for Interpolation {
    fn from(node: Composite) -> Self {
        Self::Nested(node)
    }
}

impl From<ChunkStream> for Interpolation {
    fn from(stream: ChunkStream) -> Self {
        Self::Streamed(stream)
    }
}

/// A template invocation: literal fragments with interpolations between them.
///
/// Always holds exactly one more literal than interpolations.
#[derive(Debug)]
pub struct Composite {
    literals: Vec<String>,
    interpolations: Vec<Interpolation>,
}

impl Composite {
    /// Create a composite, checking the literal/interpolation arity.
    pub fn new<L, I>(literals: L, interpolations: I) -> Result<Self, RenderError>
    where
        L: IntoIterator,
        L::Item: Into<String>,
        I: IntoIterator<Item = Interpolation>,
    {
        let literals: Vec<String> = literals.into_iter().map(Into::into).collect();
        let interpolations: Vec<Interpolation> = interpolations.into_iter().collect();

        if literals.len() != interpolations.len() + 1 {
            return Err(RenderError::arity(literals.len(), interpolations.len()));
        }
        Ok(Self {
            literals,
            interpolations,
        })
    }

    /// Start building a composite in document order.
    pub fn builder() -> CompositeBuilder {
        CompositeBuilder::new()
    }

    /// Literal fragments.
    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    /// Interpolated values.
    pub fn interpolations(&self) -> &[Interpolation] {
        &self.interpolations
    }

    /// Consume the node into its interleaved segments.
    pub fn into_segments(self) -> Vec<Segment<Interpolation>> {
        zip_segments(self.literals, self.interpolations)
    }
}

/// Builder that appends text and interpolations in document order.
///
/// Adjacent text is merged and an empty literal is inserted between adjacent
/// interpolations, so the result always satisfies the arity invariant.
#[derive(Debug)]
pub struct CompositeBuilder {
    literals: Vec<String>,
    interpolations: Vec<Interpolation>,
}

impl CompositeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            literals: vec![String::new()],
            interpolations: Vec::new(),
        }
    }

    /// Append literal template text.
    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        if let Some(last) = self.literals.last_mut() {
            last.push_str(text.as_ref());
        }
        self
    }

    /// Append any interpolation.
    pub fn value(mut self, value: impl Into<Interpolation>) -> Self {
        self.interpolations.push(value.into());
        self.literals.push(String::new());
        self
    }

    /// Append text that is already available.
    pub fn immediate(self, text: impl Into<String>) -> Self {
        self.value(Interpolation::Immediate(text.into()))
    }

    /// Append a deferred value.
    pub fn deferred(self, deferred: Deferred) -> Self {
        self.value(Interpolation::Deferred(deferred))
    }

    /// Append a nested composite.
    pub fn nested(self, node: Composite) -> Self {
        self.value(Interpolation::Nested(node))
    }

    /// Append a rendered chunk sequence.
    pub fn streamed(self, stream: ChunkStream) -> Self {
        self.value(Interpolation::Streamed(stream))
    }

    /// Build the composite.
    pub fn build(self) -> Composite {
        Composite {
            literals: self.literals,
            interpolations: self.interpolations,
        }
    }
}

impl Default for CompositeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
