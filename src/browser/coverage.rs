//! Used-CSS capture and inlining.
//!
//! Tracks which stylesheet rules Chromium actually applied during a
//! render pass, then rewrites the page to carry only those rules in a
//! single inline stylesheet. Ranges are captured without their
//! enclosing `@media` context, so conditional rules are dropped from
//! the inlined output.

use std::sync::Arc;

use chromiumoxide::cdp::browser_protocol::css;
use chromiumoxide::cdp::browser_protocol::dom;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{PrerenderError, Result};

/// One tracked stylesheet with the ranges that were exercised.
pub(crate) struct SheetUsage {
    pub text: String,
    /// Half-open `(start, end)` JS-string offsets, sorted by start.
    pub ranges: Vec<(usize, usize)>,
}

/// In-flight CSS rule-usage tracking for one page.
pub(crate) struct CssTracker {
    sheets: Arc<Mutex<Vec<css::StyleSheetId>>>,
    recorder: JoinHandle<()>,
}

impl CssTracker {
    /// Begins tracking. The styleSheetAdded listener is registered
    /// before the CSS domain is enabled so discovery order is complete.
    pub(crate) async fn start(page: &Page) -> Result<Self> {
        let mut added = page.event_listener::<css::EventStyleSheetAdded>().await?;
        let sheets = Arc::new(Mutex::new(Vec::new()));

        let recorder = {
            let sheets = Arc::clone(&sheets);
            tokio::spawn(async move {
                while let Some(event) = added.next().await {
                    sheets.lock().await.push(event.header.style_sheet_id.clone());
                }
            })
        };

        page.execute(dom::EnableParams::default()).await?;
        page.execute(css::EnableParams::default()).await?;
        page.execute(css::StartRuleUsageTrackingParams::default())
            .await?;

        Ok(Self { sheets, recorder })
    }

    /// Stops tracking and returns the concatenated used-CSS text, in
    /// stylesheet discovery order then range order.
    pub(crate) async fn stop(self, page: &Page) -> Result<String> {
        let coverage = page
            .execute(css::StopRuleUsageTrackingParams::default())
            .await?;
        self.recorder.abort();

        let order = self.sheets.lock().await.clone();
        let mut usage: Vec<SheetUsage> = Vec::with_capacity(order.len());

        for sheet_id in &order {
            let mut ranges: Vec<(usize, usize)> = coverage
                .result
                .rule_usage
                .iter()
                .filter(|rule| rule.used && rule.style_sheet_id == *sheet_id)
                .map(|rule| (rule.start_offset as usize, rule.end_offset as usize))
                .collect();
            if ranges.is_empty() {
                continue;
            }
            ranges.sort_unstable();

            let text = page
                .execute(css::GetStyleSheetTextParams::new(sheet_id.clone()))
                .await?
                .result
                .text;
            usage.push(SheetUsage { text, ranges });
        }

        debug!(sheets = usage.len(), "collected CSS rule usage");
        Ok(concat_used_css(&usage))
    }
}

/// Joins the used substrings of each sheet into one CSS blob.
pub(crate) fn concat_used_css(sheets: &[SheetUsage]) -> String {
    let mut css = String::new();
    for sheet in sheets {
        for &(start, end) in &sheet.ranges {
            css.push_str(&substring(&sheet.text, start, end));
        }
    }
    css
}

/// `text.substring(start, end)` by character offset. Rule-usage offsets
/// index JS strings, not UTF-8 bytes; out-of-range offsets clamp.
fn substring(text: &str, start: usize, end: usize) -> String {
    if end <= start {
        return String::new();
    }
    text.chars().skip(start).take(end - start).collect()
}

/// Replaces every `<style>` element on the page with a single inline
/// stylesheet carrying `css`.
pub(crate) async fn inline_css(page: &Page, css: &str) -> Result<()> {
    let script = format!(
        "(function (css) {{ \
         for (const el of Array.from(document.querySelectorAll('style'))) {{ el.parentElement.removeChild(el); }} \
         const style = document.createElement('style'); \
         style.type = 'text/css'; \
         style.appendChild(document.createTextNode(css)); \
         document.head.appendChild(style); \
         }})({});",
        serde_json::to_string(css)?
    );
    page.evaluate(script)
        .await
        .map_err(|e| PrerenderError::Evaluation(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_in_sheet_then_range_order() {
        let sheets = vec![
            SheetUsage {
                text: ".a{color:red}.b{color:blue}.c{color:green}".to_string(),
                ranges: vec![(0, 13), (27, 42)],
            },
            SheetUsage {
                text: "p{margin:0}".to_string(),
                ranges: vec![(0, 11)],
            },
        ];
        assert_eq!(
            concat_used_css(&sheets),
            ".a{color:red}.c{color:green}p{margin:0}"
        );
    }

    #[test]
    fn unused_sheets_contribute_nothing() {
        let sheets = vec![SheetUsage {
            text: ".a{color:red}".to_string(),
            ranges: vec![],
        }];
        assert_eq!(concat_used_css(&sheets), "");
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        // "é" is two bytes but one JS-string unit.
        let sheets = vec![SheetUsage {
            text: "/*é*/.a{color:red}".to_string(),
            ranges: vec![(5, 18)],
        }];
        assert_eq!(concat_used_css(&sheets), ".a{color:red}");
    }

    #[test]
    fn out_of_range_offsets_clamp() {
        assert_eq!(substring(".a{}", 2, 100), "{}");
        assert_eq!(substring(".a{}", 10, 20), "");
        assert_eq!(substring(".a{}", 3, 3), "");
        assert_eq!(substring(".a{}", 3, 1), "");
    }
}
