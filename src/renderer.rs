//! Caller-facing rendering surface.

use chromiumoxide::Browser;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::browser::{self, RenderResult};
use crate::error::{PrerenderError, Result};
use crate::options::RenderOptions;
use crate::scheduler;
use crate::wait::CompletionStrategy;

/// Interface consumed from the static file server under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInfo {
    /// The server's bound local TCP port.
    pub port: u16,
}

impl ServerInfo {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Origin every rendered route is resolved against.
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Drives headless-Chromium page sessions to prerender routes.
///
/// Usage brackets a render pass: [`Prerenderer::initialize`] launches
/// the shared browser, [`Prerenderer::render_routes`] renders a batch
/// of routes, [`Prerenderer::destroy`] tears the browser down.
pub struct Prerenderer {
    options: RenderOptions,
    browser: Option<Browser>,
    events: Option<JoinHandle<()>>,
}

impl Prerenderer {
    /// Creates a renderer; derived option defaults are applied once
    /// here.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options: options.normalized(),
            browser: None,
            events: None,
        }
    }

    /// The effective configuration for this renderer.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Launches the browser shared by all page sessions. Launch
    /// failures are logged and re-raised; nothing renders after one.
    pub async fn initialize(&mut self) -> Result<()> {
        let (browser, events) = browser::launch(&self.options).await?;
        self.browser = Some(browser);
        self.events = Some(events);
        Ok(())
    }

    /// Renders every route against the given server.
    ///
    /// Results preserve input order regardless of completion order. Any
    /// single route failure fails the whole batch, but only after every
    /// admitted session has settled and closed its page.
    pub async fn render_routes(
        &self,
        server: &ServerInfo,
        routes: Vec<String>,
    ) -> Result<Vec<RenderResult>> {
        let browser = self
            .browser
            .as_ref()
            .ok_or(PrerenderError::NotInitialized)?;
        let base_url = server.base_url();
        let strategy = CompletionStrategy::from_options(&self.options);
        info!(
            routes = routes.len(),
            limit = self.options.max_concurrent_pages,
            base_url = %base_url,
            "rendering routes"
        );

        let outcomes = scheduler::run_limited(
            routes,
            self.options.max_concurrent_pages,
            |_, route| browser::render_route(browser, &self.options, &strategy, &base_url, route),
        )
        .await;

        outcomes.into_iter().collect()
    }

    /// Closes the browser. Fire-and-forget: teardown is not awaited and
    /// may still be in flight when the caller's process exits.
    pub fn destroy(&mut self) {
        if let Some(browser) = self.browser.take() {
            debug!("destroying browser");
            browser::destroy(browser, self.events.take());
        }
    }
}
