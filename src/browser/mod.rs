//! Browser session layer over Playwright.
//!
//! Wraps launch/discovery, navigation and the interaction primitives the
//! suites are built from. Everything here is site-agnostic; selectors come
//! in from the project config.

use thiserror::Error;

mod navigate;
mod overlay;
mod session;

pub use navigate::{return_to, PageNav};
pub use overlay::{dismiss_overlays, overlay_categories, spawn_dismiss, OverlayCategory};
pub use session::{close_page, BrowserSession, NewPageWaiter};

/// Browser engine to drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        match name.to_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "firefox" => Ok(Self::Firefox),
            "webkit" | "safari" => Ok(Self::Webkit),
            other => anyhow::bail!(
                "Unknown browser '{}'. Supported: chromium, firefox, webkit",
                other
            ),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let headless = std::env::var("PITBOSS_HEADLESS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            browser: BrowserKind::Chromium,
            headless,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

/// Errors raised at the session seam. Suites see them through `anyhow`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element has no bounding box: {0}")]
    NoBoundingBox(String),

    #[error("Timed out after {timeout_ms}ms waiting for: {selector}")]
    WaitTimeout { selector: String, timeout_ms: u64 },

    #[error("No matching option for '{target}' under: {selector}")]
    NoMatchingOption { selector: String, target: String },

    #[error("No new page appeared within {0}ms")]
    NoNewPage(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_browser_kind() {
        assert_eq!(BrowserKind::parse("chromium").unwrap(), BrowserKind::Chromium);
        assert_eq!(BrowserKind::parse("Chrome").unwrap(), BrowserKind::Chromium);
        assert_eq!(BrowserKind::parse("FIREFOX").unwrap(), BrowserKind::Firefox);
        assert_eq!(BrowserKind::parse("webkit").unwrap(), BrowserKind::Webkit);
        assert!(BrowserKind::parse("opera").is_err());
    }

    #[test]
    fn test_session_error_messages() {
        let err = SessionError::WaitTimeout {
            selector: ".game-card".to_string(),
            timeout_ms: 20_000,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 20000ms waiting for: .game-card"
        );
    }
}
