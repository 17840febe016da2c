//! CLI command implementations.

pub mod render;
pub mod serve;

use clap::Args;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Listen address (overrides `server.addr`).
    #[arg(short, long)]
    pub addr: Option<String>,
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Await every value in declaration order instead of streaming fill-ins.
    #[arg(long)]
    pub in_order: bool,

    /// Print the assembled document instead of the chunk timeline.
    #[arg(long)]
    pub raw: bool,
}
