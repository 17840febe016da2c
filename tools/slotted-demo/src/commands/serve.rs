//! Serve the demo page over HTTP.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use slotted_core::{Dispatcher, RenderConfig, RenderError, RequestContext};
use slotted_streaming::into_response;
use tracing::{info, warn};

use super::ServeArgs;
use crate::context::Context;
use crate::page::IndexPage;

/// Shared state of the HTTP server.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    render: RenderConfig,
}

impl AppState {
    /// Register the demo handlers and run their lifecycle hooks.
    pub async fn activate(ctx: &Context) -> Result<Self> {
        let mut dispatcher = Dispatcher::new().register(Arc::new(IndexPage::new(
            ctx.config.page,
            &ctx.config.render,
        )));
        dispatcher
            .activate()
            .await
            .context("Failed to activate handlers")?;

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            render: ctx.config.render.clone(),
        })
    }
}

/// Every request goes through the dispatcher.
pub fn router(state: AppState) -> Router {
    Router::new().fallback(handle).with_state(state)
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let addr = args.addr.unwrap_or_else(|| ctx.config.server.addr.clone());
    let state = AppState::activate(ctx).await?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    ctx.output.success(&format!("Listening on http://{}", addr));
    ctx.output.info("Press Ctrl+C to stop");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")
}

async fn handle(State(state): State<AppState>, request: Request) -> Response {
    let (parts, _body) = request.into_parts();
    let ctx = RequestContext::from_parts(&parts);

    match state.dispatcher.dispatch(&ctx).await {
        Ok(chunks) => {
            info!(request_id = %ctx.request_id, path = %ctx.path, "streaming response");
            into_response(chunks, &state.render)
                .map(Body::from_stream)
                .into_response()
        }
        Err(RenderError::NoHandler(path)) => {
            (StatusCode::NOT_FOUND, format!("Nothing is served at {}", path)).into_response()
        }
        Err(err) => {
            warn!(request_id = %ctx.request_id, error = %err, "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
