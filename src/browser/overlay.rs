use std::sync::Arc;

use crate::browser::BrowserSession;
use crate::project::ProjectConfig;

/// One class of interception UI (cookie banner, newsletter modal, offer
/// banner) with its candidate selectors, most likely first.
#[derive(Debug, Clone)]
pub struct OverlayCategory {
    pub name: String,
    pub selectors: Vec<String>,
    /// Dismiss inside embedded frames as well as the top document
    pub scan_frames: bool,
}

/// The overlay categories a project declares, empty chains skipped.
pub fn overlay_categories(project: &ProjectConfig) -> Vec<OverlayCategory> {
    let sets = [
        ("cookie banner", &project.selectors.cookie_banner),
        ("newsletter modal", &project.selectors.newsletter_modal),
        ("offer banner", &project.selectors.offer_banner),
    ];

    sets.into_iter()
        .filter(|(_, selectors)| !selectors.is_empty())
        .map(|(name, selectors)| OverlayCategory {
            name: name.to_string(),
            selectors: selectors.clone(),
            scan_frames: project.scan_frames,
        })
        .collect()
}

/// Best-effort dismissal of every category, concurrently since the
/// overlays are independent of each other. Absence of an overlay is the
/// common case and never an error; attempts surface only in debug logs.
pub async fn dismiss_overlays(
    session: &BrowserSession,
    categories: &[OverlayCategory],
    probe_ms: u64,
) {
    let attempts = categories
        .iter()
        .map(|category| dismiss_category(session, category, probe_ms));
    futures::future::join_all(attempts).await;
}

/// Fires dismissal without awaiting it, for call sites that must not block
/// on non-critical cleanup. The race with the next interaction is accepted.
pub fn spawn_dismiss(
    session: Arc<BrowserSession>,
    categories: Vec<OverlayCategory>,
    probe_ms: u64,
) {
    tokio::spawn(async move {
        dismiss_overlays(&session, &categories, probe_ms).await;
    });
}

async fn dismiss_category(session: &BrowserSession, category: &OverlayCategory, probe_ms: u64) {
    for selector in &category.selectors {
        match try_dismiss(session, selector, probe_ms, category.scan_frames).await {
            Ok(true) => {
                log::debug!("Dismissed {} via {}", category.name, selector);
                return;
            }
            Ok(false) => {}
            Err(e) => {
                log::debug!("Dismissal attempt on {} failed: {}", selector, e);
            }
        }
    }
    log::debug!("No {} to dismiss", category.name);
}

async fn try_dismiss(
    session: &BrowserSession,
    selector: &str,
    probe_ms: u64,
    scan_frames: bool,
) -> anyhow::Result<bool> {
    if scan_frames {
        return session.force_click_in_frames(selector).await;
    }

    if !session.wait_for_visible(selector, probe_ms).await? {
        return Ok(false);
    }

    // Tap preferred; a DOM click still lands when another overlay
    // intercepts the pointer.
    if session.tap(selector).await.is_ok() {
        return Ok(true);
    }
    session.force_click(selector).await?;
    Ok(true)
}
