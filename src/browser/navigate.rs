use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::browser::BrowserSession;
use crate::utils::text::normalize_url;

/// Navigation surface of a page, small enough to fake in tests.
#[async_trait]
pub trait PageNav {
    async fn back(&self) -> Result<()>;
    async fn current_url(&self) -> Result<String>;
    async fn goto(&self, url: &str) -> Result<()>;
}

#[async_trait]
impl PageNav for BrowserSession {
    async fn back(&self) -> Result<()> {
        self.go_back().await
    }

    async fn current_url(&self) -> Result<String> {
        BrowserSession::current_url(self).await
    }

    async fn goto(&self, url: &str) -> Result<()> {
        BrowserSession::goto(self, url).await
    }
}

/// Walks browser history back toward `target`, at most `back_budget`
/// steps, comparing normalized URLs after each step. When the budget runs
/// out (or history is stuck) the page is navigated to `target` directly.
///
/// Game pages reach the list through a variable number of redirects, so
/// the exact depth is unknowable up front; only convergence matters.
pub async fn return_to<N>(nav: &N, target: &str, back_budget: u32, pause_ms: u64) -> Result<()>
where
    N: PageNav + Sync + ?Sized,
{
    let want = normalize_url(target);

    for _ in 0..back_budget {
        if at_target(nav, &want).await {
            return Ok(());
        }
        if let Err(e) = nav.back().await {
            log::debug!("history.back failed, giving up on history walk: {}", e);
            break;
        }
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
    }

    if at_target(nav, &want).await {
        return Ok(());
    }
    log::debug!("History walk did not reach {}, navigating directly", target);
    nav.goto(target).await
}

async fn at_target<N>(nav: &N, want: &str) -> bool
where
    N: PageNav + Sync + ?Sized,
{
    match nav.current_url().await {
        Ok(url) => normalize_url(&url) == want,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeNav {
        calls: Mutex<Vec<String>>,
        url_queue: Mutex<Vec<String>>,
        resting_url: String,
        fail_back: bool,
    }

    #[async_trait]
    impl PageNav for FakeNav {
        async fn back(&self) -> Result<()> {
            if self.fail_back {
                anyhow::bail!("page crashed");
            }
            self.calls.lock().unwrap().push("back".to_string());
            Ok(())
        }

        async fn current_url(&self) -> Result<String> {
            let mut queue = self.url_queue.lock().unwrap();
            if queue.is_empty() {
                Ok(self.resting_url.clone())
            } else {
                Ok(queue.remove(0))
            }
        }

        async fn goto(&self, url: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("goto:{}", url));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_exhausted_budget_ends_in_direct_navigation() {
        let nav = FakeNav {
            resting_url: "https://site.test/deep/page/".to_string(),
            ..Default::default()
        };

        return_to(&nav, "https://site.test/slots/", 3, 0).await.unwrap();

        let calls = nav.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec!["back", "back", "back", "goto:https://site.test/slots/"]
        );
    }

    #[tokio::test]
    async fn test_stops_once_normalized_urls_agree() {
        let nav = FakeNav {
            url_queue: Mutex::new(vec![
                "https://site.test/game/wolf-run".to_string(),
                "https://site.test/results?q=wolf".to_string(),
                "https://site.test/slots/?page=2#grid".to_string(),
            ]),
            resting_url: "https://site.test/slots/".to_string(),
            ..Default::default()
        };

        return_to(&nav, "https://site.test/slots", 5, 0).await.unwrap();

        let calls = nav.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["back", "back"]);
    }

    #[tokio::test]
    async fn test_no_back_when_already_at_target() {
        let nav = FakeNav {
            resting_url: "https://site.test/slots/".to_string(),
            ..Default::default()
        };

        return_to(&nav, "https://site.test/slots", 3, 0).await.unwrap();

        assert!(nav.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_broken_history_falls_back_to_direct_navigation() {
        let nav = FakeNav {
            resting_url: "https://site.test/game/dead-end/".to_string(),
            fail_back: true,
            ..Default::default()
        };

        return_to(&nav, "https://site.test/slots/", 3, 0).await.unwrap();

        let calls = nav.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["goto:https://site.test/slots/"]);
    }
}
