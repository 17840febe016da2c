//! Core abstractions for out-of-order HTML streaming.
//!
//! This crate provides the types shared by the engine and its transports:
//! - `RenderError` / `ChunkStream` - Chunk sequences and their failures
//! - `RenderConfig` / `FlushPolicy` - Markup and flush configuration
//! - `RequestContext` - Typed request parameters
//! - `RequestHandler` / `Dispatcher` - Explicit request handling service
//! - `LifecyclePhase` / `TimingContext` - Response lifecycle tracking

mod config;
mod context;
mod error;
mod handler;
mod lifecycle;

pub use config::*;
pub use context::*;
pub use error::*;
pub use handler::*;
pub use lifecycle::*;
