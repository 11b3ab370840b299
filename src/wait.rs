//! Render-completion detection.
//!
//! The completion signal lives in the page's own execution context:
//! [`CompletionStrategy::wait_script`] builds a JavaScript promise
//! expression that the session evaluates with `awaitPromise`, so the
//! orchestrator suspends until the page reports itself rendered.

use crate::options::RenderOptions;

/// Poll interval for the element-exists strategy.
const ELEMENT_POLL_INTERVAL_MS: u64 = 100;

/// How a page signals that client-side rendering has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionStrategy {
    /// Resolve when the named event fires on `document`.
    OnEvent(String),
    /// Poll until the selector matches an element.
    OnElement(String),
    /// Resolve unconditionally after a delay in milliseconds.
    AfterDelay(u64),
    /// Resolve as soon as navigation settles.
    Immediate,
}

impl CompletionStrategy {
    /// Selects the strategy for a render pass. Precedence is fixed:
    /// document-event, element-exists, time-delay, immediate.
    pub fn from_options(options: &RenderOptions) -> Self {
        if let Some(event) = &options.render_after_document_event {
            CompletionStrategy::OnEvent(event.clone())
        } else if let Some(selector) = &options.render_after_element_exists {
            CompletionStrategy::OnElement(selector.clone())
        } else if let Some(ms) = options.render_after_time {
            CompletionStrategy::AfterDelay(ms)
        } else {
            CompletionStrategy::Immediate
        }
    }

    /// JavaScript promise expression evaluated in the page context.
    ///
    /// The promise resolves exactly once and never rejects. A configured
    /// event or selector that never materializes leaves the page session
    /// waiting forever; no watchdog exists on this path.
    pub fn wait_script(&self) -> String {
        match self {
            CompletionStrategy::OnEvent(event) => format!(
                "new Promise(resolve => {{ document.addEventListener({}, () => resolve(), {{ once: true }}); }})",
                js_string(event)
            ),
            CompletionStrategy::OnElement(selector) => format!(
                "new Promise(resolve => {{ const poll = setInterval(() => {{ if (document.querySelector({})) {{ clearInterval(poll); resolve(); }} }}, {}); }})",
                js_string(selector),
                ELEMENT_POLL_INTERVAL_MS
            ),
            CompletionStrategy::AfterDelay(ms) => {
                format!("new Promise(resolve => setTimeout(resolve, {}))", ms)
            }
            CompletionStrategy::Immediate => "Promise.resolve()".to_string(),
        }
    }
}

/// Embeds a Rust string as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
