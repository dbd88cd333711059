//! Site smoke suites.
//!
//! Each suite is one end-to-end scenario (filter the game grid, search and
//! open a game, launch the demo, check the legal links) driven entirely by
//! the project's selector table. Suites declare what they need via
//! `supports`; projects missing those selectors skip the suite instead of
//! failing it.

mod demo;
mod filters;
mod legal;
mod search;

use anyhow::Result;
use async_trait::async_trait;

use crate::browser::{dismiss_overlays, overlay_categories, BrowserSession};
use crate::project::ProjectConfig;
use crate::runner::SuiteRunner;

pub use demo::DemoSuite;
pub use filters::FilterSuite;
pub use legal::LegalSuite;
pub use search::SearchSuite;

/// One scripted scenario run against a project.
#[async_trait]
pub trait Suite: Send + Sync {
    /// Stable name, used for CLI selection and in reports.
    fn name(&self) -> &str;

    /// Whether the project declares the selectors this suite needs.
    fn supports(&self, project: &ProjectConfig) -> bool;

    /// Drives the scenario through audited steps on the runner.
    async fn run(&self, runner: &mut SuiteRunner) -> Result<()>;
}

/// Navigates to the project's game list and clears whatever overlays the
/// site throws up on arrival. Shared opener for the grid-based suites.
pub(crate) async fn open_list_page(
    session: &BrowserSession,
    project: &ProjectConfig,
    probe_ms: u64,
) -> Result<()> {
    session.goto(&project.list_url()).await?;
    let categories = overlay_categories(project);
    dismiss_overlays(session, &categories, probe_ms).await;
    Ok(())
}

/// Every registered suite, in execution order.
pub fn all_suites() -> Vec<Box<dyn Suite>> {
    vec![
        Box::new(FilterSuite),
        Box::new(SearchSuite),
        Box::new(DemoSuite),
        Box::new(LegalSuite),
    ]
}

/// Suites selected by name, kept in execution order. An empty selection
/// means every suite; an unknown name is an error.
pub fn for_run(names: &[String]) -> Result<Vec<Box<dyn Suite>>> {
    let all = all_suites();
    if names.is_empty() {
        return Ok(all);
    }

    let known: Vec<String> = all.iter().map(|s| s.name().to_string()).collect();
    for name in names {
        if !known.contains(name) {
            anyhow::bail!("Unknown suite '{}'. Known suites: {}", name, known.join(", "));
        }
    }

    Ok(all
        .into_iter()
        .filter(|suite| names.iter().any(|n| n == suite.name()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_suites_have_unique_names() {
        let mut names: Vec<String> = all_suites().iter().map(|s| s.name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all_suites().len());
    }

    #[test]
    fn test_for_run_keeps_execution_order() {
        let picked = for_run(&["legal".to_string(), "filters".to_string()]).unwrap();
        let names: Vec<&str> = picked.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["filters", "legal"]);
    }

    #[test]
    fn test_for_run_rejects_unknown_suite() {
        let err = for_run(&["smoke".to_string()]).err().unwrap().to_string();
        assert!(err.contains("Unknown suite 'smoke'"));
    }

    #[test]
    fn test_empty_selection_means_all() {
        assert_eq!(for_run(&[]).unwrap().len(), all_suites().len());
    }
}
