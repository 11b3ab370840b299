//! Prerender
//!
//! A bounded-concurrency prerendering orchestrator: given a list of
//! route paths and a running local web server, it drives headless
//! Chromium page sessions over the Chrome DevTools Protocol to navigate
//! each route, wait for an application-defined render-complete signal,
//! optionally inline only the CSS actually used during rendering, and
//! collect the resulting HTML.
//!
//! # Module Overview
//!
//! - [`renderer`] - The [`Prerenderer`] facade bracketing a render pass
//! - [`browser`] - Browser lifecycle, request filtering, CSS coverage,
//!   and the per-route page session
//! - [`scheduler`] - Bounded fan-out over routes with FIFO admission
//! - [`wait`] - In-page render-completion strategies
//! - [`options`] - Configuration and defaulting
//! - [`error`] - Crate error type
//!
//! # Example
//!
//! ```no_run
//! use prerender::{Prerenderer, RenderOptions, ServerInfo};
//!
//! # async fn example() -> prerender::Result<()> {
//! let mut renderer = Prerenderer::new(RenderOptions {
//!     render_after_document_event: Some("app-rendered".to_string()),
//!     max_concurrent_pages: 4,
//!     ..RenderOptions::default()
//! });
//!
//! renderer.initialize().await?;
//! let results = renderer
//!     .render_routes(&ServerInfo::new(8000), vec!["/".to_string(), "/about".to_string()])
//!     .await?;
//! for result in &results {
//!     println!("{} -> {} bytes", result.original_route, result.html.len());
//! }
//! renderer.destroy();
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod error;
pub mod options;
pub mod renderer;
pub mod scheduler;
pub mod wait;

pub use browser::RenderResult;
pub use error::{PrerenderError, Result};
pub use options::{RenderOptions, Viewport, ViewportParseError, DEFAULT_INJECT_PROPERTY};
pub use renderer::{Prerenderer, ServerInfo};
pub use scheduler::run_limited;
pub use wait::CompletionStrategy;
