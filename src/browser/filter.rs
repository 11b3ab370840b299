//! Per-page network request filtering.
//!
//! Keeps a render pass deterministic and fast by aborting requests that
//! leave the local server under test. The pause-event listener is
//! registered before the Fetch domain is enabled so no request slips
//! through unobserved.

use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Result;

/// Whether a paused request must be aborted instead of continued.
pub(crate) fn should_abort(url: &str, base_url: &str, skip_third_party: bool) -> bool {
    skip_third_party && !url.starts_with(base_url)
}

/// Installs request interception on a page, before navigation. Returns
/// the handler task so the session can reap it once the page closes.
pub(crate) async fn install(
    page: &Page,
    base_url: String,
    skip_third_party: bool,
) -> Result<JoinHandle<()>> {
    let mut paused = page.event_listener::<EventRequestPaused>().await?;
    page.execute(EnableParams::default()).await?;

    let page = page.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let request_id = event.request_id.clone();
            if should_abort(&event.request.url, &base_url, skip_third_party) {
                debug!(url = %event.request.url, "aborting third-party request");
                let _ = page
                    .execute(FailRequestParams::new(request_id, ErrorReason::Aborted))
                    .await;
            } else {
                let _ = page.execute(ContinueRequestParams::new(request_id)).await;
            }
        }
    });

    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8000";

    #[test]
    fn local_requests_always_continue() {
        assert!(!should_abort("http://localhost:8000/app.js", BASE, true));
        assert!(!should_abort("http://localhost:8000/", BASE, true));
    }

    #[test]
    fn third_party_requests_abort_when_skipping() {
        assert!(should_abort("https://cdn.example.com/lib.js", BASE, true));
        assert!(should_abort("http://localhost:9000/other.js", BASE, true));
    }

    #[test]
    fn nothing_aborts_when_skipping_is_off() {
        assert!(!should_abort("https://cdn.example.com/lib.js", BASE, false));
        assert!(!should_abort("http://localhost:8000/app.js", BASE, false));
    }

    #[test]
    fn matching_is_a_literal_prefix_check() {
        // A different host alias for the same server is still treated
        // as third party.
        assert!(should_abort("http://127.0.0.1:8000/app.js", BASE, true));
    }
}
