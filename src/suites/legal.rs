use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use regex::Regex;

use super::Suite;
use crate::browser::{dismiss_overlays, overlay_categories};
use crate::project::ProjectConfig;
use crate::runner::SuiteRunner;

/// Per-request timeout for legal pages; they are static documents and
/// should answer quickly.
const LINK_TIMEOUT_SECS: u64 = 10;

/// One recorded problem with a legal link. Soft: the remaining links are
/// still checked, and the suite raises a single aggregate error at the end.
#[derive(Debug, Clone)]
pub struct SoftFailure {
    pub url: String,
    pub reason: String,
}

/// Collects the footer's legal links, normalizes hosts that serve
/// site-internal content onto the base domain, and checks every link's
/// HTTP status.
pub struct LegalSuite;

#[async_trait]
impl Suite for LegalSuite {
    fn name(&self) -> &str {
        "legal"
    }

    fn supports(&self, project: &ProjectConfig) -> bool {
        !project.selectors.legal_links.is_empty()
    }

    async fn run(&self, runner: &mut SuiteRunner) -> Result<()> {
        let session = runner.session();
        let project = runner.project();
        let defaults = *runner.defaults();

        runner
            .step("open homepage", {
                let session = session.clone();
                let project = project.clone();
                async move {
                    session.goto(&project.base_url).await?;
                    let categories = overlay_categories(&project);
                    dismiss_overlays(&session, &categories, defaults.overlay_timeout_ms).await;
                    Ok(())
                }
            })
            .await?;

        let links = runner
            .step("collect legal links", {
                let session = session.clone();
                let project = project.clone();
                async move {
                    let hrefs = session.link_hrefs(&project.selectors.legal_links).await?;
                    let links = prepare_links(&hrefs, &project.base_url, &project.legal_hosts);
                    if links.is_empty() {
                        bail!(
                            "No legal links found under {}",
                            project.selectors.legal_links
                        );
                    }
                    Ok(links)
                }
            })
            .await?;
        runner.log(format!("Checking {} legal links", links.len()));

        let link_count = links.len();
        runner
            .step("check legal links", async move {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(LINK_TIMEOUT_SECS))
                    .build()
                    .context("Failed to create HTTP client")?;

                let soft_failures = check_links(&client, &links).await;
                for failure in &soft_failures {
                    log::warn!("Legal link problem: {} ({})", failure.url, failure.reason);
                }

                if !soft_failures.is_empty() {
                    let detail: Vec<String> = soft_failures
                        .iter()
                        .map(|f| format!("{} ({})", f.url, f.reason))
                        .collect();
                    bail!(
                        "{} of {} legal links failed: {}",
                        soft_failures.len(),
                        link_count,
                        detail.join("; ")
                    );
                }
                Ok(())
            })
            .await?;

        Ok(())
    }
}

/// Keeps only HTTP(S) hrefs, rewrites known-internal hosts onto the base
/// domain and drops duplicates while preserving order.
fn prepare_links(hrefs: &[String], base_url: &str, internal_hosts: &[String]) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for href in hrefs {
        if !href.starts_with("http://") && !href.starts_with("https://") {
            log::debug!("Skipping non-HTTP legal link: {}", href);
            continue;
        }
        let corrected = correct_internal_href(href, base_url, internal_hosts);
        if !links.contains(&corrected) {
            links.push(corrected);
        }
    }
    links
}

/// Rewrites an href onto the base domain when its host is one of the
/// project's known internal hosts. Existing site behavior: these hosts
/// mirror the main domain's legal pages, and the mirrored copies 404 for
/// anonymous visitors. Note this can hide a genuinely broken cross-site
/// link behind a working base-domain copy.
fn correct_internal_href(href: &str, base_url: &str, internal_hosts: &[String]) -> String {
    let re = Regex::new(r"^https?://([^/?#]+)(.*)$").unwrap();
    let Some(caps) = re.captures(href) else {
        return href.to_string();
    };

    let host = &caps[1];
    if !internal_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
        return href.to_string();
    }

    let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        if rest.is_empty() { "/" } else { rest }
    )
}

/// Checks every link's status. Bad statuses and request errors are
/// accumulated and returned; they never abort the loop.
async fn check_links(client: &reqwest::Client, links: &[String]) -> Vec<SoftFailure> {
    let mut soft_failures = Vec::new();

    for url in links {
        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    log::debug!("{} -> {}", url, status.as_u16());
                } else {
                    soft_failures.push(SoftFailure {
                        url: url.clone(),
                        reason: format!("HTTP {}", status.as_u16()),
                    });
                }
            }
            Err(error) => {
                soft_failures.push(SoftFailure {
                    url: url.clone(),
                    reason: format!("request failed: {}", error),
                });
            }
        }
    }

    soft_failures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_host_rewritten_onto_base() {
        let hosts = vec!["legal.neonspin.test".to_string()];
        let corrected = correct_internal_href(
            "https://legal.neonspin.test/terms?v=2",
            "https://www.neonspin.test",
            &hosts,
        );
        assert_eq!(corrected, "https://www.neonspin.test/terms?v=2");
    }

    #[test]
    fn test_external_host_left_alone() {
        let hosts = vec!["legal.neonspin.test".to_string()];
        let href = "https://www.gambleaware.org/";
        assert_eq!(
            correct_internal_href(href, "https://www.neonspin.test", &hosts),
            href
        );
    }

    #[test]
    fn test_bare_internal_host_gets_root_path() {
        let hosts = vec!["legal.neonspin.test".to_string()];
        let corrected = correct_internal_href(
            "https://legal.neonspin.test",
            "https://www.neonspin.test/",
            &hosts,
        );
        assert_eq!(corrected, "https://www.neonspin.test/");
    }

    #[test]
    fn test_host_match_is_case_insensitive() {
        let hosts = vec!["Legal.Neonspin.Test".to_string()];
        let corrected = correct_internal_href(
            "https://legal.neonspin.test/privacy",
            "https://www.neonspin.test",
            &hosts,
        );
        assert_eq!(corrected, "https://www.neonspin.test/privacy");
    }

    #[test]
    fn test_prepare_links_drops_non_http_and_dedups() {
        let hrefs = vec![
            "https://site.test/terms".to_string(),
            "mailto:support@site.test".to_string(),
            "https://site.test/terms".to_string(),
            "https://site.test/privacy".to_string(),
        ];
        let links = prepare_links(&hrefs, "https://site.test", &[]);
        assert_eq!(
            links,
            vec!["https://site.test/terms", "https://site.test/privacy"]
        );
    }

    #[test]
    fn test_correction_can_merge_duplicates() {
        let hosts = vec!["legal.site.test".to_string()];
        let hrefs = vec![
            "https://site.test/terms".to_string(),
            "https://legal.site.test/terms".to_string(),
        ];
        let links = prepare_links(&hrefs, "https://site.test", &hosts);
        assert_eq!(links, vec!["https://site.test/terms"]);
    }
}
