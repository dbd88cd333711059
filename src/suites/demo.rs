use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{open_list_page, Suite};
use crate::browser::{close_page, overlay_categories, spawn_dismiss, BrowserSession};
use crate::project::{DemoLaunchMode, ProjectConfig};
use crate::runner::SuiteRunner;
use crate::utils::RunDefaults;

/// Opens a game detail page and exercises the "play free demo" flow: reveal
/// the CTA (sites hide it behind hover overlays), launch the demo in the
/// project's configured mode, then close it again.
///
/// This flow is the feature under test, so exhausted reveal or click
/// attempts are hard failures rather than soft skips.
pub struct DemoSuite;

#[async_trait]
impl Suite for DemoSuite {
    fn name(&self) -> &str {
        "demo"
    }

    fn supports(&self, project: &ProjectConfig) -> bool {
        let s = &project.selectors;
        if s.demo_cta.is_empty() || s.result_tile.is_empty() {
            return false;
        }
        match project.demo_launch {
            DemoLaunchMode::Popup => !s.demo_close.is_empty(),
            DemoLaunchMode::NewTab => true,
        }
    }

    async fn run(&self, runner: &mut SuiteRunner) -> Result<()> {
        let session = runner.session();
        let project = runner.project();
        let defaults = *runner.defaults();

        runner
            .step("open game list", {
                let session = session.clone();
                let project = project.clone();
                async move { open_list_page(&session, &project, defaults.overlay_timeout_ms).await }
            })
            .await?;

        runner
            .step("open first game", {
                let session = session.clone();
                let project = project.clone();
                async move {
                    let s = &project.selectors;
                    session
                        .require_visible(&s.result_tile, defaults.result_timeout_ms)
                        .await?;
                    session
                        .robust_click(
                            &s.result_tile,
                            defaults.click_retry_count,
                            defaults.retry_delay_ms,
                        )
                        .await?;
                    spawn_dismiss(
                        session.clone(),
                        overlay_categories(&project),
                        defaults.overlay_timeout_ms,
                    );
                    tokio::time::sleep(Duration::from_millis(defaults.settle_ms)).await;
                    Ok(())
                }
            })
            .await?;

        runner
            .step("reveal demo button", {
                let session = session.clone();
                let project = project.clone();
                async move { reveal_demo_cta(&session, &project, &defaults).await }
            })
            .await?;

        match project.demo_launch {
            DemoLaunchMode::Popup => {
                runner
                    .step("launch demo", {
                        let session = session.clone();
                        let project = project.clone();
                        async move {
                            let s = &project.selectors;
                            session
                                .robust_click(
                                    &s.demo_cta,
                                    defaults.click_retry_count,
                                    defaults.retry_delay_ms,
                                )
                                .await?;
                            session
                                .require_visible(&s.demo_close, defaults.demo_timeout_ms)
                                .await
                        }
                    })
                    .await?;

                runner
                    .step("close demo", {
                        let session = session.clone();
                        let project = project.clone();
                        async move {
                            let s = &project.selectors;
                            session
                                .robust_click(
                                    &s.demo_close,
                                    defaults.click_retry_count,
                                    defaults.retry_delay_ms,
                                )
                                .await?;
                            if !session
                                .wait_for_hidden(&s.demo_close, defaults.default_timeout_ms)
                                .await?
                            {
                                bail!(
                                    "Demo close control still visible {}ms after closing",
                                    defaults.default_timeout_ms
                                );
                            }
                            Ok(())
                        }
                    })
                    .await?;
            }
            DemoLaunchMode::NewTab => {
                let demo_page = runner
                    .step("launch demo in new tab", {
                        let session = session.clone();
                        let project = project.clone();
                        async move {
                            // Armed before the click; the tab can arrive
                            // through window.open or a targeted anchor.
                            let waiter = session.arm_new_page_waiter().await?;
                            session
                                .robust_click(
                                    &project.selectors.demo_cta,
                                    defaults.click_retry_count,
                                    defaults.retry_delay_ms,
                                )
                                .await?;
                            waiter.wait(defaults.demo_timeout_ms).await
                        }
                    })
                    .await?;

                runner
                    .step("close demo tab", async move {
                        close_page(&demo_page).await;
                        Ok(())
                    })
                    .await?;
            }
        }

        Ok(())
    }
}

/// Bounded reveal loop: hover the CTA directly, hover its overlay
/// container, then force the overlay's styles open. Gives up only after
/// every attempt leaves the CTA invisible.
async fn reveal_demo_cta(
    session: &BrowserSession,
    project: &ProjectConfig,
    defaults: &RunDefaults,
) -> Result<()> {
    let s = &project.selectors;

    for attempt in 1..=defaults.click_retry_count {
        if session.is_visible(&s.demo_cta).await? {
            // Leaves the pointer on the CTA so hover-gated styles stay open.
            let _ = session.hover_center(&s.demo_cta).await;
            return Ok(());
        }

        if !s.demo_overlay.is_empty() {
            if session.hover_center(&s.demo_overlay).await.is_ok()
                && session.is_visible(&s.demo_cta).await?
            {
                return Ok(());
            }
            let revealed = session.reveal(&s.demo_overlay).await?;
            log::debug!(
                "Attempt {}: forced {} overlay elements open for {}",
                attempt,
                revealed,
                s.demo_cta
            );
        }

        tokio::time::sleep(Duration::from_millis(defaults.retry_delay_ms)).await;
    }

    if session.is_visible(&s.demo_cta).await? {
        Ok(())
    } else {
        bail!("Demo CTA never became interactable: {}", s.demo_cta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::builtin_projects;

    #[test]
    fn test_popup_mode_requires_a_close_selector() {
        let mut project = builtin_projects().remove(0);
        project.demo_launch = DemoLaunchMode::Popup;
        project.selectors.demo_cta = ".demo-btn".to_string();
        project.selectors.demo_close = ".demo-modal .close".to_string();
        assert!(DemoSuite.supports(&project));

        project.selectors.demo_close.clear();
        assert!(!DemoSuite.supports(&project));
    }

    #[test]
    fn test_new_tab_mode_needs_no_close_selector() {
        let mut project = builtin_projects().remove(0);
        project.demo_launch = DemoLaunchMode::NewTab;
        project.selectors.demo_cta = ".demo-btn".to_string();
        project.selectors.demo_close.clear();
        assert!(DemoSuite.supports(&project));
    }
}
