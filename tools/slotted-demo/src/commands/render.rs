//! Render the demo page to the terminal.

use std::io::{self, Write};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use anyhow::{Context as _, Result};
use futures::{Sink, StreamExt};
use slotted_core::{LifecycleObserver, LifecyclePhase, Method, RequestContext, RequestHandler};
use slotted_streaming::{into_byte_stream, BodyWriter};
use tracing::debug;

use super::RenderArgs;
use crate::context::Context;
use crate::output::format_bytes;
use crate::page::{BodyMode, IndexPage};

struct PhaseLog;

impl LifecycleObserver for PhaseLog {
    fn on_phase(&self, phase: LifecyclePhase, elapsed: Duration) {
        debug!(?phase, ?elapsed, "body phase");
    }
}

/// Run the render command.
pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let mode = if args.in_order {
        BodyMode::InOrder
    } else {
        BodyMode::OutOfOrder
    };
    let page = IndexPage::new(ctx.config.page, &ctx.config.render).with_mode(mode);
    let request = RequestContext::new(Method::Get, "/");

    if args.raw {
        let body = into_byte_stream(page.render(&request).await?, ctx.config.render.flush);
        let mut writer = BodyWriter::new(StdoutSink, request.timing.clone())
            .with_observer(Arc::new(PhaseLog));
        let bytes = writer.write_body(body).await?;
        ctx.output.success(&format!(
            "Wrote {} in {} frame(s)",
            format_bytes(bytes as u64),
            writer.frames_sent()
        ));
        return Ok(());
    }

    ctx.output.header(&format!("Rendering / ({:?})", mode));

    let mut chunks = page.render(&request).await?;
    let mut index = 0;
    let mut bytes = 0;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.context("Render failed")?;
        ctx.output.chunk(index, request.timing.elapsed(), &chunk);
        index += 1;
        bytes += chunk.len();
    }

    ctx.output.success("Render complete");
    ctx.output.kv("chunks", &index.to_string());
    ctx.output.kv("size", &format_bytes(bytes as u64));
    ctx.output.kv("total", &format!("{}ms", request.timing.elapsed().as_millis()));
    if ctx.output.is_verbose() {
        ctx.output.kv("request", &request.request_id.to_string());
    }

    Ok(())
}

/// Byte sink over stdout, flushed after every frame.
struct StdoutSink;

impl Sink<Vec<u8>> for StdoutSink {
    type Error = io::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, frame: Vec<u8>) -> Result<(), Self::Error> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&frame)?;
        stdout.flush()
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}
