use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{open_list_page, Suite};
use crate::project::ProjectConfig;
use crate::runner::SuiteRunner;
use crate::utils::text::label_matches;

/// Filters the game grid by provider (and slot type where configured),
/// validates the filtered tiles, then resets the filter and requires the
/// grid to drain.
pub struct FilterSuite;

#[async_trait]
impl Suite for FilterSuite {
    fn name(&self) -> &str {
        "filters"
    }

    fn supports(&self, project: &ProjectConfig) -> bool {
        let s = &project.selectors;
        !s.provider_dropdown.is_empty()
            && !s.provider_option.is_empty()
            && !s.result_tile.is_empty()
            && !project.provider_label.is_empty()
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

        let step_name = format!("filter by provider '{}'", project.provider_label);
        runner
            .step(&step_name, {
                let session = session.clone();
                let project = project.clone();
                async move {
                    let s = &project.selectors;
                    session
                        .robust_click(
                            &s.provider_dropdown,
                            defaults.click_retry_count,
                            defaults.retry_delay_ms,
                        )
                        .await?;
                    session
                        .click_matching(&s.provider_option, &project.provider_label)
                        .await?;
                    tokio::time::sleep(Duration::from_millis(defaults.settle_ms)).await;
                    session
                        .require_visible(&s.result_tile, defaults.result_timeout_ms)
                        .await
                }
            })
            .await?;

        if !project.selectors.result_producer.is_empty() {
            let matched = runner
                .step("verify producer labels", {
                    let session = session.clone();
                    let project = project.clone();
                    async move {
                        let labels = session
                            .visible_texts(&project.selectors.result_producer)
                            .await?;
                        if labels.is_empty() {
                            bail!(
                                "No visible producer labels under {}",
                                project.selectors.result_producer
                            );
                        }
                        for label in &labels {
                            if !label_matches(label, &project.provider_label) {
                                bail!(
                                    "Producer label '{}' does not match '{}'",
                                    label,
                                    project.provider_label
                                );
                            }
                        }
                        Ok(labels.len())
                    }
                })
                .await?;
            runner.log(format!("{} tiles match the provider filter", matched));
        }

        if let Some(type_label) = project.slot_type_label.clone() {
            let s = &project.selectors;
            if !s.type_dropdown.is_empty() && !s.type_option.is_empty() {
                let step_name = format!("filter by type '{}'", type_label);
                runner
                    .step(&step_name, {
                        let session = session.clone();
                        let project = project.clone();
                        async move {
                            let s = &project.selectors;
                            session
                                .robust_click(
                                    &s.type_dropdown,
                                    defaults.click_retry_count,
                                    defaults.retry_delay_ms,
                                )
                                .await?;
                            session.click_matching(&s.type_option, &type_label).await?;
                            tokio::time::sleep(Duration::from_millis(defaults.settle_ms)).await;
                            session
                                .require_visible(&s.result_tile, defaults.result_timeout_ms)
                                .await
                        }
                    })
                    .await?;
            }
        }

        if !project.selectors.provider_reset.is_empty() {
            runner
                .step("reset provider filter", {
                    let session = session.clone();
                    let project = project.clone();
                    async move {
                        let s = &project.selectors;
                        session
                            .robust_click(
                                &s.provider_dropdown,
                                defaults.click_retry_count,
                                defaults.retry_delay_ms,
                            )
                            .await?;
                        session
                            .robust_click(
                                &s.provider_reset,
                                defaults.click_retry_count,
                                defaults.retry_delay_ms,
                            )
                            .await?;
                        // The grid rebuilds from scratch after a reset; tiles
                        // must all leave the visible state first.
                        if !session
                            .wait_for_zero(&s.result_tile, defaults.reset_timeout_ms)
                            .await?
                        {
                            bail!(
                                "Result grid still showing tiles {}ms after filter reset",
                                defaults.reset_timeout_ms
                            );
                        }
                        Ok(())
                    }
                })
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::builtin_projects;

    #[test]
    fn test_supports_requires_filter_selectors() {
        let mut project = builtin_projects().remove(0);
        assert!(FilterSuite.supports(&project));

        project.selectors.provider_dropdown.clear();
        assert!(!FilterSuite.supports(&project));
    }

    #[test]
    fn test_supports_requires_a_provider_label() {
        let mut project = builtin_projects().remove(0);
        project.provider_label.clear();
        assert!(!FilterSuite.supports(&project));
    }
}
