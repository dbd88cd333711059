use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use playwright::api::{Browser, BrowserContext, Page, Viewport};
use playwright::Playwright;
use rand::Rng;
use tokio::sync::Mutex;

use crate::browser::{BrowserKind, SessionConfig, SessionError};
use crate::utils::text::label_matches;

/// Works for inputs, anchors and plain containers alike.
const READ_TEXT_JS: &str = "el => el.value || el.innerText || el.textContent || ''";

const ALL_TEXTS_JS: &str = r#"(sel) => {
    return Array.from(document.querySelectorAll(sel))
        .map((el) => (el.innerText || el.textContent || '').trim());
}"#;

const VISIBLE_TEXTS_JS: &str = r#"(sel) => {
    return Array.from(document.querySelectorAll(sel))
        .filter((el) => {
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
                return false;
            }
            const rect = el.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0;
        })
        .map((el) => (el.innerText || el.textContent || '').trim());
}"#;

const HREFS_JS: &str = r#"(sel) => {
    return Array.from(document.querySelectorAll(sel))
        .map((a) => a.href || '')
        .filter((href) => href.length > 0);
}"#;

const VISIBLE_COUNT_JS: &str = r#"(sel) => {
    return Array.from(document.querySelectorAll(sel))
        .filter((el) => {
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
                return false;
            }
            const rect = el.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0;
        })
        .length;
}"#;

/// Overlays that hide a CTA until hover are forced open by mutating the
/// styles that hide them.
const REVEAL_JS: &str = r#"(sel) => {
    const els = Array.from(document.querySelectorAll(sel));
    for (const el of els) {
        el.style.display = 'block';
        el.style.visibility = 'visible';
        el.style.opacity = '1';
        el.style.pointerEvents = 'auto';
    }
    return els.length;
}"#;

/// Clicks the first visible match in the top document or any same-origin
/// frame. Cross-origin frames throw on access and are skipped.
const FRAME_CLICK_JS: &str = r#"(sel) => {
    const tryClick = (doc) => {
        const el = doc.querySelector(sel);
        if (!el) return false;
        const style = doc.defaultView.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
            return false;
        }
        el.click();
        return true;
    };
    if (tryClick(document)) return true;
    for (let i = 0; i < window.frames.length; i++) {
        try {
            const doc = window.frames[i].document;
            if (doc && tryClick(doc)) return true;
        } catch (e) {
            // cross-origin frame
        }
    }
    return false;
}"#;

/// One live browser page plus the handles that keep it alive.
///
/// Everything closes when the session drops. One session per project run;
/// parallel projects each launch their own.
pub struct BrowserSession {
    #[allow(dead_code)]
    playwright: Arc<Playwright>,
    #[allow(dead_code)]
    browser: Arc<Browser>,
    context: Arc<BrowserContext>,
    page: Arc<Mutex<Page>>,
}

impl BrowserSession {
    pub async fn launch(config: SessionConfig) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        let browser = match config.browser {
            BrowserKind::Chromium => {
                let chromium = playwright.chromium();
                launch_chromium(&chromium, &config).await?
            }
            BrowserKind::Firefox => {
                playwright
                    .firefox()
                    .launcher()
                    .headless(config.headless)
                    .launch()
                    .await?
            }
            BrowserKind::Webkit => {
                playwright
                    .webkit()
                    .launcher()
                    .headless(config.headless)
                    .launch()
                    .await?
            }
        };

        let context = browser.context_builder().build().await?;
        let page = context.new_page().await?;

        page.set_viewport_size(Viewport {
            width: config.viewport_width as i32,
            height: config.viewport_height as i32,
        })
        .await?;

        Ok(Self {
            playwright: Arc::new(playwright),
            browser: Arc::new(browser),
            context: Arc::new(context),
            page: Arc::new(Mutex::new(page)),
        })
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        let page = self.page.lock().await;
        let url: String = page.evaluate("() => location.href", ()).await?;
        Ok(url)
    }

    pub async fn go_back(&self) -> Result<()> {
        let page = self.page.lock().await;
        page.evaluate::<(), ()>("window.history.back()", ()).await?;
        Ok(())
    }

    /// Standard library-level click.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.click_builder(selector)
            .click()
            .await
            .with_context(|| format!("Failed to click: {}", selector))?;
        Ok(())
    }

    /// DOM-level click, bypassing hit testing. Reaches elements an overlay
    /// would intercept.
    pub async fn force_click(&self, selector: &str) -> Result<()> {
        let page = self.page.lock().await;
        let _: () = page
            .evaluate_on_selector(selector, "el => el.click()", None::<String>)
            .await
            .with_context(|| format!("DOM click failed: {}", selector))?;
        Ok(())
    }

    /// Pointer tap at the element center.
    pub async fn tap(&self, selector: &str) -> Result<()> {
        let page = self.page.lock().await;
        let element = page
            .query_selector(selector)
            .await?
            .ok_or_else(|| SessionError::ElementNotFound(selector.to_string()))?;
        element.scroll_into_view_if_needed(None).await?;
        let bounds = element
            .bounding_box()
            .await?
            .ok_or_else(|| SessionError::NoBoundingBox(selector.to_string()))?;

        let x = bounds.x + bounds.width / 2.0;
        let y = bounds.y + bounds.height / 2.0;
        page.mouse.r#move(x, y, None).await?;
        page.mouse.down(None, None).await?;
        page.mouse.up(None, None).await?;
        Ok(())
    }

    /// Standard clicks with bounded retries, then one DOM-level click as
    /// the last resort.
    pub async fn robust_click(&self, selector: &str, attempts: u32, delay_ms: u64) -> Result<()> {
        for attempt in 1..=attempts {
            match self.click(selector).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::debug!("Click attempt {}/{} failed for {}: {}", attempt, attempts, selector, e);
                }
            }
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        self.force_click(selector)
            .await
            .with_context(|| format!("Click failed after {} attempts: {}", attempts, selector))
    }

    pub async fn is_visible(&self, selector: &str) -> Result<bool> {
        let page = self.page.lock().await;
        match page.query_selector(selector).await? {
            Some(element) => Ok(element.is_visible().await?),
            None => Ok(false),
        }
    }

    /// Waits for the selector to reach a visible state. Returns false on
    /// timeout instead of erroring; hard waits go through `require_visible`.
    pub async fn wait_for_visible(&self, selector: &str, timeout_ms: u64) -> Result<bool> {
        let page = self.page.lock().await;
        let result = page
            .wait_for_selector_builder(selector)
            .timeout(timeout_ms as f64)
            .wait_for_selector()
            .await;
        Ok(result.is_ok())
    }

    pub async fn require_visible(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        if self.wait_for_visible(selector, timeout_ms).await? {
            Ok(())
        } else {
            Err(SessionError::WaitTimeout {
                selector: selector.to_string(),
                timeout_ms,
            }
            .into())
        }
    }

    /// Polls until the first match is gone or hidden.
    pub async fn wait_for_hidden(&self, selector: &str, timeout_ms: u64) -> Result<bool> {
        let start = Instant::now();
        while start.elapsed().as_millis() < timeout_ms as u128 {
            if !self.is_visible(selector).await? {
                return Ok(true);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        Ok(false)
    }

    pub async fn visible_count(&self, selector: &str) -> Result<u32> {
        let page = self.page.lock().await;
        let count: u32 = page.evaluate(VISIBLE_COUNT_JS, selector.to_string()).await?;
        Ok(count)
    }

    /// Polls until no match is visible. Used after filter resets, where the
    /// grid must drain completely.
    pub async fn wait_for_zero(&self, selector: &str, timeout_ms: u64) -> Result<bool> {
        let start = Instant::now();
        while start.elapsed().as_millis() < timeout_ms as u128 {
            if self.visible_count(selector).await? == 0 {
                return Ok(true);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        Ok(false)
    }

    pub async fn inner_text(&self, selector: &str) -> Result<String> {
        let page = self.page.lock().await;
        let text: String = page
            .evaluate_on_selector(selector, READ_TEXT_JS, None::<String>)
            .await
            .map_err(|_| SessionError::ElementNotFound(selector.to_string()))?;
        Ok(text)
    }

    /// Texts of every match, in DOM order, hidden ones included. Index
    /// positions line up with `query_selector_all`.
    pub async fn all_texts(&self, selector: &str) -> Result<Vec<String>> {
        let page = self.page.lock().await;
        let texts: Vec<String> = page.evaluate(ALL_TEXTS_JS, selector.to_string()).await?;
        Ok(texts)
    }

    /// Absolute hrefs of every matching anchor. The DOM `href` property
    /// resolves relative URLs against the document base.
    pub async fn link_hrefs(&self, selector: &str) -> Result<Vec<String>> {
        let page = self.page.lock().await;
        let hrefs: Vec<String> = page.evaluate(HREFS_JS, selector.to_string()).await?;
        Ok(hrefs)
    }

    /// Texts of visible matches only, in one page round trip.
    pub async fn visible_texts(&self, selector: &str) -> Result<Vec<String>> {
        let page = self.page.lock().await;
        let texts: Vec<String> = page.evaluate(VISIBLE_TEXTS_JS, selector.to_string()).await?;
        Ok(texts)
    }

    /// Clicks the first match whose normalized text contains the normalized
    /// target. Dropdown options render providers inconsistently, hence the
    /// normalized comparison.
    pub async fn click_matching(&self, selector: &str, target: &str) -> Result<()> {
        let texts = self.all_texts(selector).await?;
        let index = texts.iter().position(|text| label_matches(text, target));

        let Some(index) = index else {
            return Err(SessionError::NoMatchingOption {
                selector: selector.to_string(),
                target: target.to_string(),
            }
            .into());
        };

        let page = self.page.lock().await;
        let elements = page.query_selector_all(selector).await?;
        let element = elements
            .get(index)
            .ok_or_else(|| SessionError::ElementNotFound(selector.to_string()))?;
        element.scroll_into_view_if_needed(None).await?;
        element.click_builder().click().await?;
        Ok(())
    }

    /// Types into the focused input one keystroke at a time with jittered
    /// pacing. Search boxes debounce on keyup; instant fills skip the
    /// suggestion path real users hit.
    pub async fn type_text(&self, selector: &str, text: &str, base_delay_ms: u64) -> Result<()> {
        self.click(selector).await?;
        for ch in text.chars() {
            {
                let page = self.page.lock().await;
                page.keyboard.input_text(&ch.to_string()).await?;
            }
            let jitter = {
                let mut rng = rand::thread_rng();
                rng.gen_range(0..=base_delay_ms / 2)
            };
            tokio::time::sleep(Duration::from_millis(base_delay_ms + jitter)).await;
        }
        Ok(())
    }

    /// Moves the pointer over the element center, scrolling it into view
    /// first. Triggers hover-revealed overlays.
    pub async fn hover_center(&self, selector: &str) -> Result<()> {
        let page = self.page.lock().await;
        let element = page
            .query_selector(selector)
            .await?
            .ok_or_else(|| SessionError::ElementNotFound(selector.to_string()))?;
        element.scroll_into_view_if_needed(None).await?;
        let bounds = element
            .bounding_box()
            .await?
            .ok_or_else(|| SessionError::NoBoundingBox(selector.to_string()))?;
        page.mouse
            .r#move(bounds.x + bounds.width / 2.0, bounds.y + bounds.height / 2.0, None)
            .await?;
        Ok(())
    }

    /// Forces hidden overlay elements into an interactable state. Returns
    /// how many elements were mutated.
    pub async fn reveal(&self, selector: &str) -> Result<u32> {
        let page = self.page.lock().await;
        let revealed: u32 = page.evaluate(REVEAL_JS, selector.to_string()).await?;
        Ok(revealed)
    }

    /// DOM click across the top document and same-origin frames. Returns
    /// whether anything visible was clicked.
    pub async fn force_click_in_frames(&self, selector: &str) -> Result<bool> {
        let page = self.page.lock().await;
        let clicked: bool = page.evaluate(FRAME_CLICK_JS, selector.to_string()).await?;
        Ok(clicked)
    }

    pub async fn screenshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let page = self.page.lock().await;
        page.screenshot_builder()
            .path(PathBuf::from(path))
            .screenshot()
            .await?;
        Ok(())
    }

    /// Snapshots the context's page count so a later `wait` can detect a
    /// page that arrives through any mechanism. Arm this before the click
    /// that opens the tab; arming afterwards races the load.
    pub async fn arm_new_page_waiter(&self) -> Result<NewPageWaiter> {
        let baseline = self.context.pages()?.len();
        Ok(NewPageWaiter {
            context: self.context.clone(),
            baseline,
        })
    }
}

/// Watches the browser context for a page beyond the armed baseline.
pub struct NewPageWaiter {
    context: Arc<BrowserContext>,
    baseline: usize,
}

impl NewPageWaiter {
    /// Resolves to the first page that appeared after arming, or
    /// `SessionError::NoNewPage` on timeout.
    pub async fn wait(self, timeout_ms: u64) -> Result<Page> {
        let start = Instant::now();
        while start.elapsed().as_millis() < timeout_ms as u128 {
            let pages = self.context.pages()?;
            if let Some(page) = pages.into_iter().nth(self.baseline) {
                return Ok(page);
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        Err(SessionError::NoNewPage(timeout_ms).into())
    }
}

/// Closes a script-opened page. Close errors are expected while the window
/// tears down and are only logged.
pub async fn close_page(page: &Page) {
    if let Err(e) = page.evaluate::<(), ()>("window.close()", ()).await {
        log::debug!("window.close() reported: {}", e);
    }
}

async fn launch_chromium(
    chromium: &playwright::api::BrowserType,
    config: &SessionConfig,
) -> Result<Browser> {
    let mut launcher = chromium.launcher();
    launcher = launcher.headless(config.headless);

    let env_path = std::env::var("PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH")
        .ok()
        .map(PathBuf::from);
    let discovered = if env_path.is_none() {
        find_system_browser()
    } else {
        None
    };

    if let Some(ref path) = env_path {
        log::debug!("Using browser from env: {}", path.display());
        launcher = launcher.executable(path);
    } else if let Some(ref path) = discovered {
        log::debug!("Using discovered browser: {}", path.display());
        launcher = launcher.executable(path);
    } else {
        log::debug!("No system browser found, attempting default launch");
    }

    let args: Vec<String> = vec![
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--ignore-certificate-errors",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    launcher = launcher.args(&args);

    Ok(launcher.launch().await?)
}

fn find_system_browser() -> Option<PathBuf> {
    let common_paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    for path in common_paths {
        let p = Path::new(path);
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }
    None
}
