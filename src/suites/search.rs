use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{open_list_page, Suite};
use crate::browser::{overlay_categories, return_to, spawn_dismiss};
use crate::project::ProjectConfig;
use crate::runner::SuiteRunner;

/// Base keystroke pacing for the search box; each keystroke adds random
/// jitter on top so the input debounce sees human rhythm.
const TYPE_DELAY_MS: u64 = 120;

/// Types the project's search phrase, opens the first hit's detail page
/// and walks browser history back to the game list.
pub struct SearchSuite;

#[async_trait]
impl Suite for SearchSuite {
    fn name(&self) -> &str {
        "search"
    }

    fn supports(&self, project: &ProjectConfig) -> bool {
        let s = &project.selectors;
        !s.search_input.is_empty() && !s.result_tile.is_empty() && !project.search_phrase.is_empty()
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

        let step_name = format!("search for '{}'", project.search_phrase);
        runner
            .step(&step_name, {
                let session = session.clone();
                let project = project.clone();
                async move {
                    let s = &project.selectors;
                    session
                        .type_text(&s.search_input, &project.search_phrase, TYPE_DELAY_MS)
                        .await?;
                    tokio::time::sleep(Duration::from_millis(defaults.settle_ms)).await;
                    session
                        .require_visible(&s.result_tile, defaults.result_timeout_ms)
                        .await
                }
            })
            .await?;

        let title = runner
            .step("open first result", {
                let session = session.clone();
                let project = project.clone();
                async move {
                    let s = &project.selectors;
                    session
                        .robust_click(
                            &s.result_tile,
                            defaults.click_retry_count,
                            defaults.retry_delay_ms,
                        )
                        .await?;
                    // Detail pages raise their own overlays; clearing them
                    // must not block reading the title.
                    spawn_dismiss(
                        session.clone(),
                        overlay_categories(&project),
                        defaults.overlay_timeout_ms,
                    );

                    if s.game_title.is_empty() {
                        tokio::time::sleep(Duration::from_millis(defaults.settle_ms)).await;
                        return Ok(String::new());
                    }

                    session
                        .require_visible(&s.game_title, defaults.default_timeout_ms)
                        .await?;
                    let title = session.inner_text(&s.game_title).await?;
                    if title.trim().is_empty() {
                        bail!("Game detail page shows an empty title");
                    }
                    Ok(title.trim().to_string())
                }
            })
            .await?;
        if !title.is_empty() {
            runner.log(format!("Opened game: {}", title));
        }

        runner
            .step("return to game list", {
                let session = session.clone();
                let project = project.clone();
                async move {
                    return_to(
                        &*session,
                        &project.list_url(),
                        project.back_steps,
                        defaults.retry_delay_ms,
                    )
                    .await
                }
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::builtin_projects;

    #[test]
    fn test_supports_requires_search_selectors_and_phrase() {
        let mut project = builtin_projects().remove(0);
        assert!(SearchSuite.supports(&project));

        project.search_phrase.clear();
        assert!(!SearchSuite.supports(&project));
    }
}
