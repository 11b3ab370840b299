//! Per-route page sessions.
//!
//! One session owns one browser page for the lifetime of a single route
//! render: open, prepare (inject, viewport, request filter, CSS
//! tracking), navigate, await the completion signal, capture, close.
//! The page is closed on every exit path before the result propagates.

use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::{Browser, Page};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{coverage, filter};
use crate::error::{PrerenderError, Result};
use crate::options::{RenderOptions, DEFAULT_INJECT_PROPERTY};
use crate::wait::CompletionStrategy;

/// Snapshot of one rendered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    /// The route exactly as supplied by the caller.
    pub original_route: String,
    /// The document's resolved location path after navigation; may
    /// differ from `original_route` through percent-decoding.
    pub route: String,
    /// Serialized document content.
    pub html: String,
}

/// Renders a single route in a fresh page.
pub(crate) async fn render_route(
    browser: &Browser,
    options: &RenderOptions,
    strategy: &CompletionStrategy,
    base_url: &str,
    route: String,
) -> Result<RenderResult> {
    let page = browser.new_page("about:blank").await?;

    let mut filter_task = None;
    let outcome = drive(&page, &mut filter_task, options, strategy, base_url, &route).await;

    if let Err(e) = page.close().await {
        warn!(route = %route, error = %e, "failed to close page");
    }
    if let Some(task) = filter_task {
        task.abort();
    }

    outcome
}

async fn drive(
    page: &Page,
    filter_task: &mut Option<JoinHandle<()>>,
    options: &RenderOptions,
    strategy: &CompletionStrategy,
    base_url: &str,
    route: &str,
) -> Result<RenderResult> {
    if let Some(inject) = &options.inject {
        let property = options
            .inject_property
            .as_deref()
            .unwrap_or(DEFAULT_INJECT_PROPERTY);
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(inject_script(
            property, inject,
        )?))
        .await?;
    }

    if let Some(viewport) = options.viewport {
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(PrerenderError::Cdp)?;
        page.execute(metrics).await?;
    }

    *filter_task = Some(
        filter::install(page, base_url.to_string(), options.skip_third_party_requests).await?,
    );

    let tracker = if options.inline_used_css {
        Some(coverage::CssTracker::start(page).await?)
    } else {
        None
    };

    let url = format!("{base_url}{route}");
    debug!(url = %url, "navigating");
    page.goto(url.as_str())
        .await
        .map_err(|e| PrerenderError::navigation(route, e.to_string()))?;
    let _ = page.wait_for_navigation().await;

    // Suspends until the page signals render completion; a configured
    // condition that never fires waits forever.
    let wait = EvaluateParams::builder()
        .expression(strategy.wait_script())
        .await_promise(true)
        .build()
        .map_err(PrerenderError::Evaluation)?;
    page.evaluate(wait)
        .await
        .map_err(|e| PrerenderError::Evaluation(e.to_string()))?;

    if let Some(tracker) = tracker {
        let css = tracker.stop(page).await?;
        coverage::inline_css(page, &css).await?;
    }

    // Location paths come back percent-encoded; the reported route is
    // the decoded form.
    let resolved: String = page
        .evaluate(
            "(() => { const p = window.location.pathname; \
             try { return decodeURIComponent(p); } catch (e) { return p; } })()",
        )
        .await
        .map_err(|e| PrerenderError::Evaluation(e.to_string()))?
        .into_value()
        .map_err(|e| PrerenderError::Evaluation(e.to_string()))?;

    let html = page
        .content()
        .await
        .map_err(|e| PrerenderError::navigation(route, e.to_string()))?;

    debug!(route = %route, resolved = %resolved, bytes = html.len(), "route rendered");

    Ok(RenderResult {
        original_route: route.to_string(),
        route: resolved,
        html,
    })
}

/// Script installed before any page script runs, exposing the injected
/// value under the configured global property.
fn inject_script(property: &str, value: &serde_json::Value) -> Result<String> {
    Ok(format!(
        "(function () {{ window[{}] = {}; }})();",
        serde_json::to_string(property)?,
        serde_json::to_string(value)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inject_script_assigns_the_serialized_value() {
        let script =
            inject_script("__PRERENDER_INJECTED", &json!({"user": "ada"})).expect("script");
        assert_eq!(
            script,
            r#"(function () { window["__PRERENDER_INJECTED"] = {"user":"ada"}; })();"#
        );
    }

    #[test]
    fn inject_script_quotes_awkward_property_names() {
        let script = inject_script("my \"prop\"", &json!(true)).expect("script");
        assert!(script.contains(r#"window["my \"prop\""]"#));
    }

    #[test]
    fn render_result_serializes_with_camel_case_keys() {
        let result = RenderResult {
            original_route: "/t%C3%A9st.html".to_string(),
            route: "/tést.html".to_string(),
            html: "<html></html>".to_string(),
        };
        let json = serde_json::to_value(&result).expect("serializable");
        assert_eq!(json["originalRoute"], "/t%C3%A9st.html");
        assert_eq!(json["route"], "/tést.html");
        assert_eq!(json["html"], "<html></html>");
    }
}
