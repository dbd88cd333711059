use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

mod registry;

pub use registry::builtin_projects;

/// How a site presents the playable demo of a game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DemoLaunchMode {
    /// Demo opens inside the current page (iframe or modal).
    #[default]
    Popup,
    /// Demo opens a separate browser tab or window.
    NewTab,
}

/// Per-site CSS selector table.
///
/// Overlay categories are ordered candidate chains: the first selector that
/// matches a visible element wins. Single-element selectors left empty mean
/// the site has no such widget and dependent suites are skipped.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SelectorTable {
    #[serde(default)]
    pub cookie_banner: Vec<String>,

    #[serde(default)]
    pub newsletter_modal: Vec<String>,

    #[serde(default)]
    pub offer_banner: Vec<String>,

    /// Toggle that opens the provider filter dropdown
    #[serde(default)]
    pub provider_dropdown: String,

    /// Option entries inside the opened provider dropdown
    #[serde(default)]
    pub provider_option: String,

    /// The default/reset entry of the provider dropdown
    #[serde(default)]
    pub provider_reset: String,

    /// Toggle that opens the slot-type filter dropdown
    #[serde(default)]
    pub type_dropdown: String,

    /// Option entries inside the opened slot-type dropdown
    #[serde(default)]
    pub type_option: String,

    #[serde(default)]
    pub search_input: String,

    /// One visible game tile in the result grid
    #[serde(default)]
    pub result_tile: String,

    /// Producer/provider label inside a result tile
    #[serde(default)]
    pub result_producer: String,

    /// Game title on the detail page
    #[serde(default)]
    pub game_title: String,

    /// The "play free demo" call-to-action
    #[serde(default)]
    pub demo_cta: String,

    /// Hover overlay that hides the demo CTA until revealed
    #[serde(default)]
    pub demo_overlay: String,

    /// Close control of the in-page demo popup
    #[serde(default)]
    pub demo_close: String,

    /// Footer anchors pointing at legal pages
    #[serde(default)]
    pub legal_links: String,
}

/// Static description of one target site: URLs, selectors and behavioral
/// flags. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: String,

    pub base_url: String,

    /// Path of the game list page, relative to `base_url`
    #[serde(default)]
    pub list_path: String,

    #[serde(default)]
    pub selectors: SelectorTable,

    /// Provider option exercised by the filter suite, as rendered on site
    #[serde(default)]
    pub provider_label: String,

    /// Slot-type option exercised by the filter suite
    #[serde(default)]
    pub slot_type_label: Option<String>,

    /// Phrase typed into the search input
    #[serde(default)]
    pub search_phrase: String,

    #[serde(default)]
    pub demo_launch: DemoLaunchMode,

    /// History-back attempts before the normalizer falls back to a direct
    /// navigation
    #[serde(default = "default_back_steps")]
    pub back_steps: u32,

    /// Hosts that serve site-internal content; legal hrefs pointing at one
    /// of these are rewritten onto the base domain before checking
    #[serde(default)]
    pub legal_hosts: Vec<String>,

    /// Mobile variants render overlays inside embedded frames
    #[serde(default)]
    pub scan_frames: bool,
}

fn default_back_steps() -> u32 {
    3
}

impl ProjectConfig {
    /// Absolute URL of the game list page.
    pub fn list_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            if self.list_path.is_empty() {
                "/"
            } else {
                self.list_path.as_str()
            }
        )
    }

    /// Parses a single project from YAML.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let project: ProjectConfig =
            serde_yaml::from_str(content).context("Failed to parse project YAML")?;
        project.validate()?;
        Ok(project)
    }

    /// Rejects configs that would produce confusing runtime failures:
    /// unnamed projects, non-HTTP base URLs, relative list paths and empty
    /// selector strings hiding inside candidate chains.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Project has no name");
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            bail!("Project '{}' has invalid baseUrl: {}", self.name, self.base_url);
        }
        if !self.list_path.is_empty() && !self.list_path.starts_with('/') {
            bail!(
                "Project '{}' has a relative listPath: {} (must start with '/')",
                self.name,
                self.list_path
            );
        }
        for (category, chain) in [
            ("cookieBanner", &self.selectors.cookie_banner),
            ("newsletterModal", &self.selectors.newsletter_modal),
            ("offerBanner", &self.selectors.offer_banner),
        ] {
            if chain.iter().any(|s| s.trim().is_empty()) {
                bail!("Project '{}' has an empty selector in {}", self.name, category);
            }
        }
        Ok(())
    }
}

/// Builds the effective project registry: built-ins first, then any
/// `*.yaml`/`*.yml` files under `projects_dir`, which add new projects or
/// override built-ins with the same name.
pub fn load_projects(projects_dir: Option<&Path>) -> Result<Vec<ProjectConfig>> {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut projects = builtin_projects();
    for (idx, project) in projects.iter().enumerate() {
        by_name.insert(project.name.clone(), idx);
    }

    let Some(dir) = projects_dir else {
        return Ok(projects);
    };
    if !dir.exists() {
        bail!("Projects directory not found: {}", dir.display());
    }

    for entry in WalkDir::new(dir)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .map(|ext| ext == "yaml" || ext == "yml")
            .unwrap_or(false);
        if !entry.file_type().is_file() || !is_yaml {
            continue;
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project file: {}", path.display()))?;
        let project = ProjectConfig::from_yaml(&content)
            .with_context(|| format!("Invalid project file: {}", path.display()))?;

        match by_name.get(&project.name) {
            Some(&idx) => projects[idx] = project,
            None => {
                by_name.insert(project.name.clone(), projects.len());
                projects.push(project);
            }
        }
    }

    Ok(projects)
}

/// Selects projects by name, in the order given. An empty selection means
/// every registered project.
pub fn resolve_projects(
    all: Vec<ProjectConfig>,
    names: &[String],
) -> Result<Vec<ProjectConfig>> {
    if names.is_empty() {
        return Ok(all);
    }

    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match all.iter().find(|p| &p.name == name) {
            Some(project) => selected.push(project.clone()),
            None => {
                let known: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
                bail!("Unknown project '{}'. Known projects: {}", name, known.join(", "));
            }
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_yaml() {
        let yaml = r##"
name: neonspin
baseUrl: https://www.neonspin.test
listPath: /slots/
providerLabel: "1×2 Gaming"
searchPhrase: Book of
demoLaunch: newTab
backSteps: 2
legalHosts:
  - legal.neonspin.test
selectors:
  cookieBanner:
    - "#onetrust-accept-btn-handler"
  providerDropdown: ".filters .dropdown-toggle"
  resultTile: ".games-grid .game-card"
"##;

        let project = ProjectConfig::from_yaml(yaml).unwrap();
        assert_eq!(project.name, "neonspin");
        assert_eq!(project.demo_launch, DemoLaunchMode::NewTab);
        assert_eq!(project.back_steps, 2);
        assert_eq!(project.list_url(), "https://www.neonspin.test/slots/");
        assert_eq!(project.selectors.cookie_banner.len(), 1);
        assert!(!project.scan_frames);
    }

    #[test]
    fn test_parse_defaults() {
        let yaml = "name: bare\nbaseUrl: https://bare.test\n";
        let project = ProjectConfig::from_yaml(yaml).unwrap();
        assert_eq!(project.demo_launch, DemoLaunchMode::Popup);
        assert_eq!(project.back_steps, 3);
        assert_eq!(project.list_url(), "https://bare.test/");
        assert!(project.selectors.provider_dropdown.is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_selector_entry() {
        let yaml = r##"
name: broken
baseUrl: https://broken.test
selectors:
  cookieBanner:
    - "#accept"
    - ""
"##;
        assert!(ProjectConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let yaml = "name: odd\nbaseUrl: ftp://odd.test\n";
        assert!(ProjectConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_validate_rejects_relative_list_path() {
        let yaml = "name: odd\nbaseUrl: https://odd.test\nlistPath: slots\n";
        let err = ProjectConfig::from_yaml(yaml).unwrap_err().to_string();
        assert!(err.contains("relative listPath"));
    }

    #[test]
    fn test_builtin_registry_is_valid_and_unique() {
        let projects = builtin_projects();
        assert!(!projects.is_empty());

        let mut names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), projects.len());

        for project in &projects {
            project.validate().unwrap();
        }
    }

    #[test]
    fn test_resolve_unknown_project_fails() {
        let err = resolve_projects(builtin_projects(), &["nope".to_string()])
            .unwrap_err()
            .to_string();
        assert!(err.contains("Unknown project 'nope'"));
    }

    #[test]
    fn test_resolve_keeps_request_order() {
        let all = builtin_projects();
        let last = all.last().unwrap().name.clone();
        let first = all.first().unwrap().name.clone();
        let picked =
            resolve_projects(all, &[last.clone(), first.clone()]).unwrap();
        assert_eq!(picked[0].name, last);
        assert_eq!(picked[1].name, first);
    }
}
