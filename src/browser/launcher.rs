//! Browser process lifecycle.

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{PrerenderError, Result};
use crate::options::RenderOptions;

/// Launches the browser process shared by every page session of a
/// render pass. The returned task drains CDP events for the connection
/// and exits when the browser goes away.
pub(crate) async fn launch(options: &RenderOptions) -> Result<(Browser, JoinHandle<()>)> {
    let mut builder = BrowserConfig::builder();

    if !options.headless {
        builder = builder.with_head();
    }

    if let Some(path) = &options.chrome_path {
        builder = builder.chrome_executable(path);
    }

    let args = sandbox_args(options.chrome_args.clone(), cfg!(target_os = "linux"));
    for arg in &args {
        builder = builder.arg(arg);
    }

    let config = builder.build().map_err(PrerenderError::Launch)?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!(error = %e, "unable to start the headless browser");
        PrerenderError::Launch(e.to_string())
    })?;

    info!(headless = options.headless, args = args.len(), "browser launched");

    let events = tokio::spawn(async move {
        while handler.next().await.is_some() {}
        debug!("browser event handler exited");
    });

    Ok((browser, events))
}

/// Closes the browser without waiting for shutdown to finish.
pub(crate) fn destroy(mut browser: Browser, events: Option<JoinHandle<()>>) {
    tokio::spawn(async move {
        if let Err(e) = browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        let _ = browser.wait().await;
        if let Some(events) = events {
            events.abort();
        }
    });
}

/// Chromium refuses to start its SUID sandbox in most containers, so
/// Linux launches force-disable it unless the caller already has.
fn sandbox_args(mut args: Vec<String>, linux: bool) -> Vec<String> {
    if linux && !args.iter().any(|arg| arg == "--no-sandbox") {
        args.push("--no-sandbox".to_string());
        args.push("--disable-setuid-sandbox".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_launches_disable_the_suid_sandbox() {
        let args = sandbox_args(vec![], true);
        assert_eq!(args, vec!["--no-sandbox", "--disable-setuid-sandbox"]);
    }

    #[test]
    fn caller_supplied_sandbox_flag_is_not_duplicated() {
        let args = sandbox_args(vec!["--no-sandbox".to_string()], true);
        assert_eq!(args, vec!["--no-sandbox"]);
    }

    #[test]
    fn caller_args_are_preserved_ahead_of_the_workaround() {
        let args = sandbox_args(vec!["--lang=de".to_string()], true);
        assert_eq!(
            args,
            vec!["--lang=de", "--no-sandbox", "--disable-setuid-sandbox"]
        );
    }

    #[test]
    fn non_linux_hosts_are_left_alone() {
        let args = sandbox_args(vec!["--lang=de".to_string()], false);
        assert_eq!(args, vec!["--lang=de"]);
    }
}
