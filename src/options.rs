//! Renderer configuration.
//!
//! All recognized options live in one immutable [`RenderOptions`] value,
//! validated and defaulted once at construction time. Derived defaults
//! are applied by [`RenderOptions::normalized`], which produces a new
//! value instead of mutating the caller's configuration in place.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Global property name used when `inject` is set without an explicit
/// `inject_property`.
pub const DEFAULT_INJECT_PROPERTY: &str = "__PRERENDER_INJECTED";

/// Page viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewportParseError {
    #[error("Invalid viewport format: expected WIDTHxHEIGHT (e.g., 1280x800)")]
    InvalidFormat,
    #[error("Invalid width: {0}")]
    InvalidWidth(String),
    #[error("Invalid height: {0}")]
    InvalidHeight(String),
    #[error("Width must be positive")]
    ZeroWidth,
    #[error("Height must be positive")]
    ZeroHeight,
}

impl FromStr for Viewport {
    type Err = ViewportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            return Err(ViewportParseError::InvalidFormat);
        }

        let width: u32 = parts[0]
            .trim()
            .parse()
            .map_err(|_| ViewportParseError::InvalidWidth(parts[0].to_string()))?;

        let height: u32 = parts[1]
            .trim()
            .parse()
            .map_err(|_| ViewportParseError::InvalidHeight(parts[1].to_string()))?;

        if width == 0 {
            return Err(ViewportParseError::ZeroWidth);
        }
        if height == 0 {
            return Err(ViewportParseError::ZeroHeight);
        }

        Ok(Viewport { width, height })
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Configuration for a render pass.
///
/// At most one of the `render_after_*` strategies is honored per pass;
/// precedence is document-event, then element-exists, then time-delay,
/// then immediate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Maximum simultaneously open page sessions. 0 means unbounded.
    pub max_concurrent_pages: usize,

    /// Consider a page rendered once this event fires on `document`.
    pub render_after_document_event: Option<String>,

    /// Consider a page rendered once this selector matches an element.
    pub render_after_element_exists: Option<String>,

    /// Consider a page rendered after this many milliseconds.
    pub render_after_time: Option<u64>,

    /// Value exposed to every page under `inject_property` before any
    /// page script runs.
    pub inject: Option<serde_json::Value>,

    /// Global property name carrying `inject`. Defaulted to
    /// [`DEFAULT_INJECT_PROPERTY`] by [`RenderOptions::normalized`] when
    /// `inject` is set.
    pub inject_property: Option<String>,

    /// Abort requests that leave the local server's origin. Active by
    /// default; aborted requests stay failed for that page.
    pub skip_third_party_requests: bool,

    /// Replace the page's stylesheets with only the rules exercised
    /// during the render pass.
    pub inline_used_css: bool,

    /// Viewport applied to each page. No override is sent when unset.
    pub viewport: Option<Viewport>,

    /// Run the browser without a visible window.
    pub headless: bool,

    /// Explicit browser executable; auto-detected when unset.
    pub chrome_path: Option<PathBuf>,

    /// Extra arguments passed through to the browser process.
    pub chrome_args: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 0,
            render_after_document_event: None,
            render_after_element_exists: None,
            render_after_time: None,
            inject: None,
            inject_property: None,
            skip_third_party_requests: true,
            inline_used_css: true,
            viewport: None,
            headless: true,
            chrome_path: None,
            chrome_args: Vec::new(),
        }
    }
}

impl RenderOptions {
    /// Returns a copy with derived defaults filled in.
    pub fn normalized(mut self) -> Self {
        if self.inject.is_some() && self.inject_property.is_none() {
            self.inject_property = Some(DEFAULT_INJECT_PROPERTY.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_the_documented_contract() {
        let options = RenderOptions::default();
        assert_eq!(options.max_concurrent_pages, 0);
        assert!(options.skip_third_party_requests);
        assert!(options.inline_used_css);
        assert!(options.headless);
        assert!(options.viewport.is_none());
        assert!(options.inject_property.is_none());
    }

    #[test]
    fn normalized_assigns_the_inject_property_when_injecting() {
        let options = RenderOptions {
            inject: Some(json!({"foo": "bar"})),
            ..RenderOptions::default()
        }
        .normalized();
        assert_eq!(
            options.inject_property.as_deref(),
            Some(DEFAULT_INJECT_PROPERTY)
        );
    }

    #[test]
    fn normalized_keeps_an_explicit_inject_property() {
        let options = RenderOptions {
            inject: Some(json!(1)),
            inject_property: Some("__APP_STATE".to_string()),
            ..RenderOptions::default()
        }
        .normalized();
        assert_eq!(options.inject_property.as_deref(), Some("__APP_STATE"));
    }

    #[test]
    fn normalized_leaves_the_property_unset_without_inject() {
        let options = RenderOptions::default().normalized();
        assert!(options.inject_property.is_none());
    }

    #[test]
    fn deserializes_camel_case_option_names() {
        let options: RenderOptions = serde_json::from_str(
            r#"{
                "maxConcurrentPages": 4,
                "renderAfterDocumentEvent": "app-rendered",
                "skipThirdPartyRequests": false,
                "viewport": {"width": 375, "height": 667}
            }"#,
        )
        .expect("valid options json");
        assert_eq!(options.max_concurrent_pages, 4);
        assert_eq!(
            options.render_after_document_event.as_deref(),
            Some("app-rendered")
        );
        assert!(!options.skip_third_party_requests);
        assert_eq!(
            options.viewport,
            Some(Viewport {
                width: 375,
                height: 667
            })
        );
        // Unmentioned options keep their defaults.
        assert!(options.inline_used_css);
    }

    #[test]
    fn viewport_parses_and_displays() {
        let vp: Viewport = "1920x1080".parse().expect("valid viewport");
        assert_eq!(vp.width, 1920);
        assert_eq!(vp.height, 1080);
        assert_eq!(format!("{}", vp), "1920x1080");
    }

    #[test]
    fn viewport_parse_rejects_bad_input() {
        assert!("1280".parse::<Viewport>().is_err());
        assert!("1280x800x600".parse::<Viewport>().is_err());
        assert!("abcx800".parse::<Viewport>().is_err());
        assert!("0x800".parse::<Viewport>().is_err());
        assert!("1280x0".parse::<Viewport>().is_err());
    }

    #[test]
    fn viewport_parse_tolerates_spaces() {
        let vp: Viewport = " 1280 x 800 ".parse().expect("valid viewport");
        assert_eq!(
            vp,
            Viewport {
                width: 1280,
                height: 800
            }
        );
    }
}
