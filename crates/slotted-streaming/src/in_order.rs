//! Declaration-order rendering.

use async_stream::try_stream;
use futures::stream::{Stream, StreamExt};
use slotted_core::{ChunkStream, RenderError};

use crate::interleave::Segment;
use crate::markup::Markup;
use crate::node::{Composite, Interpolation};
use crate::out_of_order::render_out_of_order;

/// Render a composite in declaration order.
///
/// Literal and immediate text is yielded as is. Each deferred value is
/// awaited before anything after it is produced, so total latency is the sum
/// of the top-level deferred latencies. Nested composites are rendered out
/// of order and spliced in place; embedded chunk sequences are spliced in
/// place.
pub fn render_in_order(node: Composite, markup: &Markup) -> ChunkStream {
    in_order_chunks(node, markup.clone()).boxed()
}

/// Compose a template and render it in order with default markup.
pub fn stream_in_order<L, I>(literals: L, interpolations: I) -> Result<ChunkStream, RenderError>
where
    L: IntoIterator,
    L::Item: Into<String>,
    I: IntoIterator<Item = Interpolation>,
{
    let node = Composite::new(literals, interpolations)?;
    Ok(render_in_order(node, &Markup::default()))
}

fn in_order_chunks(
    node: Composite,
    markup: Markup,
) -> impl Stream<Item = Result<String, RenderError>> + Send + 'static {
    try_stream! {
        for segment in node.into_segments() {
            match segment {
                Segment::Literal(text) | Segment::Value(Interpolation::Immediate(text)) => {
                    if !text.is_empty() {
                        yield text;
                    }
                }
                Segment::Value(Interpolation::Deferred(value)) => {
                    let text = value.await.map_err(|source| RenderError::deferred(None, source))?;
                    yield text;
                }
                Segment::Value(Interpolation::Nested(child)) => {
                    let mut chunks = render_out_of_order(child, &markup);
                    while let Some(chunk) = chunks.next().await {
                        yield chunk?;
                    }
                }
                Segment::Value(Interpolation::Streamed(mut chunks)) => {
                    while let Some(chunk) = chunks.next().await {
                        yield chunk?;
                    }
                }
            }
        }
    }
}
