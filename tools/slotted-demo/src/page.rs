//! The demo page.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Datelike;
use slotted_core::{ChunkStream, RenderConfig, RenderError, RequestContext, RequestHandler, Route};
use slotted_streaming::{render_in_order, Composite, Deferred, Interpolation, Markup};

use crate::config::PageConfig;

/// How the page body is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// Skeleton first, fill-ins as values settle.
    #[default]
    OutOfOrder,
    /// Every value awaited in declaration order, for comparison.
    InOrder,
}

/// Serves the demo document at `/`.
pub struct IndexPage {
    delays: PageConfig,
    markup: Markup,
    mode: BodyMode,
}

impl IndexPage {
    pub fn new(delays: PageConfig, render: &RenderConfig) -> Self {
        Self {
            delays,
            markup: Markup::from_config(render),
            mode: BodyMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: BodyMode) -> Self {
        self.mode = mode;
        self
    }

    /// The whole document. The head is plain text; the body is a boundary
    /// holding the title, the content and a nested list.
    pub fn document(&self) -> Composite {
        Composite::builder()
            .text(
                r#"
<!DOCTYPE html>
<html>
  <head>
    <title>Out of Order Streaming Demo</title>
    <meta charset="utf8">
  </head>
  <body>
    <h1>Out of Order Streaming Demo</h1>

    "#,
            )
            .value(self.boundary(self.body()))
            .text(
                r#"
  </body>
</html>
"#,
            )
            .build()
    }

    fn body(&self) -> Composite {
        Composite::builder()
            .text(
                r#"
      <header>
        <h2>"#,
            )
            .deferred(after(self.delays.title_delay_ms, "Hello, World!"))
            .text(
                r#"</h2>
      </header>

      <main>
        "#,
            )
            .deferred(after(
                self.delays.content_delay_ms,
                "This is some interesting text content.",
            ))
            .text("\n\n        ")
            .value(self.boundary(self.list()))
            .text(
                r#"
      </main>

      <footer>Copyright "#,
            )
            .immediate(chrono::Utc::now().year().to_string())
            .text("</footer>\n    ")
            .build()
    }

    fn list(&self) -> Composite {
        Composite::builder()
            .text(
                r#"
    <ul>
      <li>First</li>
      <li>"#,
            )
            .deferred(after(self.delays.nested_delay_ms, "Second"))
            .text(
                r#"</li>
      <li>Third</li>
    </ul>
  "#,
            )
            .build()
    }

    fn boundary(&self, node: Composite) -> Interpolation {
        match self.mode {
            BodyMode::OutOfOrder => Interpolation::Nested(node),
            BodyMode::InOrder => Interpolation::Streamed(render_in_order(node, &self.markup)),
        }
    }
}

fn after(ms: u64, text: &'static str) -> Deferred {
    Deferred::new(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        text
    })
}

#[async_trait]
impl RequestHandler for IndexPage {
    fn name(&self) -> &str {
        "index"
    }

    fn routes(&self) -> Vec<Route> {
        vec![Route::get("/")]
    }

    async fn render(&self, _ctx: &RequestContext) -> Result<ChunkStream, RenderError> {
        Ok(render_in_order(self.document(), &self.markup))
    }
}
