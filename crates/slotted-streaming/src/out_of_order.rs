//! Skeleton-first rendering with fill-ins in completion order.
//!
//! A boundary is rendered in two phases that form one chunk sequence:
//!
//! 1. The skeleton: every literal and immediate value verbatim, with a
//!    placeholder for each deferred value. Nested composites are flattened
//!    into the same slot space: the child numbers its own slots from zero,
//!    and for each of them the parent emits a forwarding slot that maps its
//!    own (re-based) slot onto the child's.
//! 2. The fill-ins: one fragment per deferred value, in the order the values
//!    settle, followed by the closing container tag.

use async_stream::try_stream;
use futures::stream::{Stream, StreamExt, TryStreamExt};
use slotted_core::{ChunkStream, RenderError};
use tracing::{debug, trace, warn};

use crate::interleave::Segment;
use crate::markup::{Markup, CONTAINER_CLOSE, CONTAINER_OPEN, SKELETON_CLOSE, SKELETON_OPEN};
use crate::node::{Composite, Deferred, Interpolation};
use crate::sequencer::{PendingSlot, ResolutionOrder, Resolved};

/// Skeleton of one boundary and the values its slots wait on.
#[derive(Debug)]
pub(crate) struct Skeleton {
    /// Container and skeleton region, without the closing container tag.
    pub html: String,
    /// Pending values; `pending[i].slot == i`.
    pub pending: Vec<PendingSlot>,
}

/// Build the skeleton of a boundary, numbering its slots from zero.
pub(crate) fn skeleton(node: Composite, markup: &Markup) -> Skeleton {
    let mut html = String::from(CONTAINER_OPEN);
    html.push_str(SKELETON_OPEN);
    let mut pending = Vec::new();

    for segment in node.into_segments() {
        match segment {
            Segment::Literal(text) | Segment::Value(Interpolation::Immediate(text)) => {
                html.push_str(&text);
            }
            Segment::Value(Interpolation::Deferred(value)) => {
                reserve(&mut html, &mut pending, value, markup);
            }
            Segment::Value(Interpolation::Streamed(stream)) => {
                reserve(&mut html, &mut pending, collect_text(stream), markup);
            }
            Segment::Value(Interpolation::Nested(child)) => {
                let base = pending.len();
                let nested = skeleton(child, markup);

                html.push_str(&nested.html);
                for PendingSlot { slot, value } in nested.pending {
                    html.push_str(&markup.forward(base + slot, slot));
                    pending.push(PendingSlot::new(base + slot, value));
                }
                html.push_str(CONTAINER_CLOSE);
            }
        }
    }

    html.push_str(SKELETON_CLOSE);
    Skeleton { html, pending }
}

fn reserve(html: &mut String, pending: &mut Vec<PendingSlot>, value: Deferred, markup: &Markup) {
    let slot = pending.len();
    html.push_str(&markup.placeholder(slot));
    pending.push(PendingSlot::new(slot, value));
}

// An embedded chunk sequence is its own boundary; its whole output fills one slot.
fn collect_text(stream: ChunkStream) -> Deferred {
    Deferred::try_new(async move {
        let chunks: Vec<String> = stream.try_collect().await?;
        Ok::<_, anyhow::Error>(chunks.concat())
    })
}

/// Render a composite out of order.
///
/// The first chunk is the complete skeleton. Each following chunk is a
/// fill-in, in the order the deferred values settle, and the last one
/// closes the container. If a deferred value fails, the sequence ends with
/// that error right after the fill-ins already produced.
pub fn render_out_of_order(node: Composite, markup: &Markup) -> ChunkStream {
    out_of_order_chunks(node, markup.clone()).boxed()
}

/// Compose a template and render it out of order with default markup.
pub fn stream_out_of_order<L, I>(literals: L, interpolations: I) -> Result<ChunkStream, RenderError>
where
    L: IntoIterator,
    L::Item: Into<String>,
    I: IntoIterator<Item = Interpolation>,
{
    let node = Composite::new(literals, interpolations)?;
    Ok(render_out_of_order(node, &Markup::default()))
}

fn out_of_order_chunks(
    node: Composite,
    markup: Markup,
) -> impl Stream<Item = Result<String, RenderError>> + Send + 'static {
    try_stream! {
        let Skeleton { html, pending } = skeleton(node, &markup);
        debug!(slots = pending.len(), bytes = html.len(), "skeleton ready");
        yield html;

        let mut order = ResolutionOrder::new(pending);
        while let Some(resolved) = order.next().await {
            let Resolved { slot, text } = resolved.map_err(|err| {
                warn!(error = %err, "fill-in phase aborted");
                err
            })?;
            trace!(slot, remaining = order.remaining(), "fill-in");
            yield markup.fill_in(slot, &text);
        }

        yield CONTAINER_CLOSE.to_string();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;

    fn after(ms: u64, text: &'static str) -> Deferred {
        Deferred::new(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            text
        })
    }

    fn fail_after(ms: u64) -> Deferred {
        Deferred::try_new(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Err::<String, _>(anyhow::anyhow!("upstream timed out"))
        })
    }

    async fn drain(mut stream: ChunkStream) -> (Vec<String>, Option<RenderError>) {
        let mut chunks = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => chunks.push(chunk),
                Err(err) => {
                    assert!(stream.next().await.is_none(), "stream continued after error");
                    return (chunks, Some(err));
                }
            }
        }
        (chunks, None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_skeleton_then_fill_in() {
        let start = Instant::now();
        let mut stream = stream_out_of_order(
            ["<a>", "<b>", "<c>"],
            vec![Interpolation::from("X"), Interpolation::from(after(10, "Y"))],
        )
        .unwrap();

        let skeleton = stream.next().await.unwrap().unwrap();
        assert_eq!(
            skeleton,
            r#"<div><template shadowrootmode="open"><a>X<b><slot name="slot_0"></slot><c></template>"#
        );
        assert_eq!(start.elapsed(), Duration::ZERO);

        let fill_in = stream.next().await.unwrap().unwrap();
        assert_eq!(fill_in, r#"<div slot="slot_0">Y</div>"#);
        assert!(start.elapsed() >= Duration::from_millis(10));

        assert_eq!(stream.next().await.unwrap().unwrap(), "</div>");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_ins_follow_completion_order() {
        let node = Composite::builder()
            .text("<p>")
            .deferred(after(30, "one"))
            .deferred(after(10, "two"))
            .deferred(after(20, "three"))
            .text("</p>")
            .build();

        let (chunks, err) = drain(render_out_of_order(node, &Markup::default())).await;

        assert!(err.is_none());
        assert_eq!(
            &chunks[1..],
            &[
                r#"<div slot="slot_1">two</div>"#.to_string(),
                r#"<div slot="slot_2">three</div>"#.to_string(),
                r#"<div slot="slot_0">one</div>"#.to_string(),
                "</div>".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_settled_values_are_not_inlined() {
        let node = Composite::builder()
            .text("<h1>")
            .deferred(Deferred::ready("Title"))
            .text("</h1>")
            .build();

        let (chunks, _) = drain(render_out_of_order(node, &Markup::default())).await;

        assert!(!chunks[0].contains("Title"));
        assert!(chunks[0].contains(r#"<slot name="slot_0"></slot>"#));
        assert_eq!(chunks[1], r#"<div slot="slot_0">Title</div>"#);
    }

    #[tokio::test]
    async fn test_without_deferred_values() {
        let node = Composite::builder().text("<p>").immediate("static").text("</p>").build();

        let (chunks, err) = drain(render_out_of_order(node, &Markup::default())).await;

        assert!(err.is_none());
        assert_eq!(
            chunks,
            vec![
                r#"<div><template shadowrootmode="open"><p>static</p></template>"#.to_string(),
                "</div>".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_nested_slots_are_rebased() {
        let list = Composite::builder()
            .text("<ul><li>")
            .deferred(after(5, "five"))
            .text("</li><li>")
            .deferred(after(1, "one"))
            .text("</li></ul>")
            .build();
        let page = Composite::builder()
            .text("<h1>")
            .deferred(after(20, "title"))
            .text("</h1>")
            .nested(list)
            .build();

        let (chunks, err) = drain(render_out_of_order(page, &Markup::default())).await;

        assert!(err.is_none());
        assert_eq!(
            chunks,
            vec![
                concat!(
                    r#"<div><template shadowrootmode="open">"#,
                    r#"<h1><slot name="slot_0"></slot></h1>"#,
                    r#"<div><template shadowrootmode="open">"#,
                    r#"<ul><li><slot name="slot_0"></slot></li><li><slot name="slot_1"></slot></li></ul>"#,
                    r#"</template>"#,
                    r#"<slot name="slot_1" slot="slot_0"></slot>"#,
                    r#"<slot name="slot_2" slot="slot_1"></slot>"#,
                    r#"</div>"#,
                    r#"</template>"#,
                )
                .to_string(),
                r#"<div slot="slot_2">one</div>"#.to_string(),
                r#"<div slot="slot_1">five</div>"#.to_string(),
                r#"<div slot="slot_0">title</div>"#.to_string(),
                "</div>".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwarding_threads_through_every_level() {
        let inner = Composite::builder().text("<i>").deferred(after(2, "c")).text("</i>").build();
        let middle = Composite::builder()
            .deferred(after(1, "b"))
            .nested(inner)
            .build();
        let outer = Composite::builder()
            .deferred(after(3, "a"))
            .nested(middle)
            .build();

        let (chunks, err) = drain(render_out_of_order(outer, &Markup::default())).await;
        assert!(err.is_none());

        let skeleton = &chunks[0];
        assert_eq!(
            skeleton,
            concat!(
                r#"<div><template shadowrootmode="open">"#,
                r#"<slot name="slot_0"></slot>"#,
                r#"<div><template shadowrootmode="open">"#,
                r#"<slot name="slot_0"></slot>"#,
                r#"<div><template shadowrootmode="open"><i><slot name="slot_0"></slot></i></template>"#,
                r#"<slot name="slot_1" slot="slot_0"></slot>"#,
                r#"</div>"#,
                r#"</template>"#,
                r#"<slot name="slot_1" slot="slot_0"></slot>"#,
                r#"<slot name="slot_2" slot="slot_1"></slot>"#,
                r#"</div>"#,
                r#"</template>"#,
            )
        );

        // Every fill-in names a slot reserved in the outermost skeleton.
        for fill_in in &chunks[1..chunks.len() - 1] {
            let name = fill_in
                .strip_prefix(r#"<div slot=""#)
                .and_then(|rest| rest.split('"').next())
                .unwrap();
            assert!(skeleton.contains(&format!(r#"name="{}""#, name)));
        }
        assert_eq!(chunks[1], r#"<div slot="slot_1">b</div>"#);
        assert_eq!(chunks[2], r#"<div slot="slot_2">c</div>"#);
        assert_eq!(chunks[3], r#"<div slot="slot_0">a</div>"#);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_ends_stream_after_emitted_chunks() {
        let node = Composite::builder()
            .deferred(after(1, "ok"))
            .deferred(fail_after(5))
            .deferred(after(10, "late"))
            .build();

        let (chunks, err) = drain(render_out_of_order(node, &Markup::default())).await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], r#"<div slot="slot_0">ok</div>"#);
        let err = err.unwrap();
        assert_eq!(err.failed_slot(), Some(1));
        assert!(!chunks.iter().any(|c| c == "</div>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_streamed_value_fills_one_slot() {
        let embedded = stream_out_of_order(["<b>", "</b>"], vec![Interpolation::from(after(3, "inner"))])
            .unwrap();
        let node = Composite::builder()
            .text("<p>")
            .streamed(embedded)
            .text("</p>")
            .build();

        let (chunks, err) = drain(render_out_of_order(node, &Markup::default())).await;

        assert!(err.is_none());
        assert_eq!(
            chunks[1],
            concat!(
                r#"<div slot="slot_0">"#,
                r#"<div><template shadowrootmode="open"><b><slot name="slot_0"></slot></b></template>"#,
                r#"<div slot="slot_0">inner</div></div>"#,
                r#"</div>"#,
            )
        );
    }

    fn flagged(ms: u64, flag: &Arc<AtomicBool>) -> Deferred {
        let flag = flag.clone();
        Deferred::new(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            flag.store(true, Ordering::SeqCst);
            "done"
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_lets_in_flight_siblings_finish() {
        let sibling = Arc::new(AtomicBool::new(false));
        let node = Composite::builder()
            .deferred(flagged(10, &sibling))
            .deferred(fail_after(5))
            .build();

        let (chunks, err) = drain(render_out_of_order(node, &Markup::default())).await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(err.unwrap().failed_slot(), Some(1));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sibling.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_render_lets_values_finish() {
        let lazy = Arc::new(AtomicBool::new(false));
        let nested = Arc::new(AtomicBool::new(false));
        let spawned = Arc::new(AtomicUsize::new(0));
        let eager = {
            let spawned = spawned.clone();
            Deferred::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                spawned.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>("eager")
            })
        };
        let list = Composite::builder().deferred(flagged(20, &nested)).build();
        let node = Composite::builder()
            .deferred(after(1, "first"))
            .deferred(flagged(10, &lazy))
            .nested(list)
            .deferred(eager)
            .build();

        let mut stream = render_out_of_order(node, &Markup::default());
        let skeleton = stream.next().await.unwrap().unwrap();
        assert!(skeleton.ends_with("</template>"));
        assert_eq!(stream.next().await.unwrap().unwrap(), r#"<div slot="slot_0">first</div>"#);
        drop(stream);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(lazy.load(Ordering::SeqCst));
        assert!(nested.load(Ordering::SeqCst));
        assert_eq!(spawned.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_arity_error_is_synchronous() {
        let result = stream_out_of_order(["<a>"], vec![Interpolation::from("X")]);
        assert!(matches!(result, Err(RenderError::StructuralArity { .. })));
    }

    #[test]
    fn test_custom_slot_prefix() {
        let node = Composite::builder().deferred(Deferred::ready("x")).build();
        let markup = Markup::new("part-");

        let skeleton = skeleton(node, &markup);

        assert!(skeleton.html.contains(r#"<slot name="part-0"></slot>"#));
        assert_eq!(skeleton.pending.len(), 1);
    }
}
