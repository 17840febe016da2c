//! Byte-level response bodies for chunk sequences.

use async_stream::try_stream;
use futures::future::FutureExt;
use futures::stream::{BoxStream, Stream, StreamExt};
use http::header::{HeaderValue, CONTENT_TYPE, TRANSFER_ENCODING};
use slotted_core::{ChunkStream, FlushPolicy, RenderConfig, RenderError};

use crate::flush::FlushController;

/// Incrementally flushable response body.
///
/// Each item is one frame. A failed render ends the body with its error
/// after every byte produced before the failure.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, RenderError>>;

/// Content type of rendered documents.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Convert a chunk sequence into a byte stream framed by `policy`.
pub fn into_byte_stream(chunks: ChunkStream, policy: FlushPolicy) -> ByteStream {
    frames(chunks, policy).boxed()
}

/// Wrap a chunk sequence in a streaming HTML response.
pub fn into_response(chunks: ChunkStream, config: &RenderConfig) -> http::Response<ByteStream> {
    let mut response = http::Response::new(into_byte_stream(chunks, config.flush));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
    response
}

fn frames(
    mut chunks: ChunkStream,
    policy: FlushPolicy,
) -> impl Stream<Item = Result<Vec<u8>, RenderError>> + Send + 'static {
    try_stream! {
        let mut controller = FlushController::new(policy);
        let mut exhausted = false;

        while !exhausted {
            match chunks.next().await {
                Some(Ok(chunk)) => controller.push(&chunk),
                Some(Err(err)) => {
                    if !controller.is_empty() {
                        yield controller.take();
                    }
                    Err::<(), _>(err)?;
                }
                None => exhausted = true,
            }

            // Merge chunks that are already available, never waiting on the renderer.
            while !exhausted && !controller.should_flush() {
                match chunks.next().now_or_never() {
                    Some(Some(Ok(chunk))) => controller.push(&chunk),
                    Some(Some(Err(err))) => {
                        if !controller.is_empty() {
                            yield controller.take();
                        }
                        Err::<(), _>(err)?;
                    }
                    Some(None) => exhausted = true,
                    None => break,
                }
            }

            if !controller.is_empty() {
                yield controller.take();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::TryStreamExt;

    use super::*;
    use crate::markup::Markup;
    use crate::node::{Composite, Deferred};
    use crate::out_of_order::render_out_of_order;

    fn page() -> ChunkStream {
        let node = Composite::builder()
            .text("<h1>")
            .deferred(Deferred::new(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                "Hello"
            }))
            .text("</h1>")
            .build();
        render_out_of_order(node, &Markup::default())
    }

    async fn drain(mut body: ByteStream) -> (Vec<String>, Option<RenderError>) {
        let mut frames = Vec::new();
        while let Some(frame) = body.next().await {
            match frame {
                Ok(bytes) => frames.push(String::from_utf8(bytes).unwrap()),
                Err(err) => return (frames, Some(err)),
            }
        }
        (frames, None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_chunk_is_a_frame() {
        let (frames, err) = drain(into_byte_stream(page(), FlushPolicy::EachChunk)).await;

        assert!(err.is_none());
        assert_eq!(frames.len(), 3);
        assert!(frames[0].starts_with("<div><template"));
        assert_eq!(frames[1], r#"<div slot="slot_0">Hello</div>"#);
        assert_eq!(frames[2], "</div>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_coalesce_flushes_before_waiting() {
        let body = into_byte_stream(page(), FlushPolicy::Coalesce { max_bytes: 64 * 1024 });
        let (frames, err) = drain(body).await;

        assert!(err.is_none());
        // The skeleton goes out alone because the fill-in is still pending;
        // the fill-in and the closing tag are available together.
        assert_eq!(frames.len(), 2);
        assert!(frames[0].ends_with("</template>"));
        assert_eq!(frames[1], r#"<div slot="slot_0">Hello</div></div>"#);
    }

    #[tokio::test]
    async fn test_coalesce_respects_max_bytes() {
        let chunks: Vec<Result<String, RenderError>> =
            vec![Ok("aaaa".into()), Ok("bbbb".into()), Ok("cc".into())];
        let body = into_byte_stream(
            futures::stream::iter(chunks).boxed(),
            FlushPolicy::Coalesce { max_bytes: 8 },
        );

        let frames: Vec<Vec<u8>> = body.try_collect().await.unwrap();

        assert_eq!(frames, vec![b"aaaabbbb".to_vec(), b"cc".to_vec()]);
    }

    #[tokio::test]
    async fn test_failure_flushes_buffer_then_errors() {
        let chunks: Vec<Result<String, RenderError>> = vec![
            Ok("<div>".into()),
            Err(RenderError::deferred(Some(0), anyhow::anyhow!("down"))),
            Ok("never".into()),
        ];
        let body = into_byte_stream(
            futures::stream::iter(chunks).boxed(),
            FlushPolicy::Coalesce { max_bytes: 1024 },
        );

        let (frames, err) = drain(body).await;

        assert_eq!(frames, vec!["<div>"]);
        assert_eq!(err.unwrap().failed_slot(), Some(0));
    }

    #[tokio::test]
    async fn test_response_headers() {
        let chunks: Vec<Result<String, RenderError>> = vec![Ok("<p>hi</p>".into())];
        let response = into_response(futures::stream::iter(chunks).boxed(), &RenderConfig::default());

        assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
        assert_eq!(response.headers()[TRANSFER_ENCODING], "chunked");

        let frames: Vec<Vec<u8>> = response.into_body().try_collect().await.unwrap();
        assert_eq!(frames, vec![b"<p>hi</p>".to_vec()]);
    }
}
