//! Browser discovery and CDP session plumbing.
//!
//! Wraps chromiumoxide with the small set of operations the login walk
//! needs: launch with hardening flags, bounded element waits, cookie
//! apply/capture, and screenshots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use rand::Rng;
use tracing::{debug, info};

use crate::config::BrowserOptions;
use crate::credentials::SessionData;

/// Injected before any site script runs; sites sniff this property to
/// detect automation.
const STEALTH_INIT_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined});";

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Find a Chrome/Chromium executable.
///
/// An explicit path wins when it exists; otherwise `which` is consulted,
/// then a fixed candidate list covering the usual install locations.
pub fn find_browser(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(PathBuf::from(path));
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(PathBuf::from(candidate));
        }
    }
    None
}

/// A launched browser with a single page attached.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a browser per `options` and open a blank page.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let executable = find_browser(options.binary.as_deref())
            .context("Chrome/Chromium not found. Install Chrome or set browser.binary")?;
        info!(browser = %executable.display(), "Launching browser");

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .no_sandbox()
            .window_size(options.window_width, options.window_height)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if !options.headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = browser.new_page("about:blank").await?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            STEALTH_INIT_SCRIPT,
        ))
        .await
        .context("Failed to install stealth init script")?;

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate the page.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    /// The page's current URL, or empty if the target has no URL yet.
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// The page's rendered HTML.
    pub async fn page_html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .context("Failed to read page content")
    }

    /// Wait for a selector to match, polling until `timeout` elapses.
    ///
    /// Returns `Ok(None)` on timeout; elements that may legitimately be
    /// absent are the caller's call to treat as fatal or not.
    pub async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Element>> {
        let start = std::time::Instant::now();
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(Some(element));
            }
            if start.elapsed() >= timeout {
                debug!(selector, "Element did not appear within timeout");
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait for a button whose visible text contains `needle`
    /// (case-insensitive), polling until `timeout` elapses.
    pub async fn wait_for_button_with_text(
        &self,
        needle: &str,
        timeout: Duration,
    ) -> Result<Option<Element>> {
        let needle = needle.to_lowercase();
        let start = std::time::Instant::now();
        loop {
            let buttons = self
                .page
                .find_elements("button")
                .await
                .ok()
                .unwrap_or_default();
            for button in buttons {
                let text = button.inner_text().await.ok().flatten().unwrap_or_default();
                if text.to_lowercase().contains(&needle) {
                    return Ok(Some(button));
                }
            }
            if start.elapsed() >= timeout {
                debug!(needle = %needle, "Button did not appear within timeout");
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Dispatch an Enter keypress to the focused element.
    pub async fn press_enter(&self) -> Result<()> {
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key("Enter")
            .text("\r")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build key event: {e}"))?;
        self.page.execute(down).await?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key("Enter")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build key event: {e}"))?;
        self.page.execute(up).await?;

        Ok(())
    }

    /// Capture a PNG screenshot of the page to `path`.
    pub async fn save_screenshot(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create screenshot dir: {}", parent.display()))?;
        }

        let bytes = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await
            .context("Failed to capture screenshot")?;

        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write screenshot: {}", path.display()))?;

        Ok(())
    }

    /// Apply cached session cookies against `url` (best-effort).
    pub async fn apply_cookies(&self, session: &SessionData, url: &str) -> Result<()> {
        let mut cookies = Vec::new();
        for (name, value) in &session.cookies {
            let mut cookie = CookieParam::new(name.clone(), value.clone());
            cookie.url = Some(url.to_string());
            cookies.push(cookie);
        }

        if !cookies.is_empty() {
            self.page.set_cookies(cookies).await?;
        }

        Ok(())
    }

    /// Capture the page's current cookies as name/value pairs.
    pub async fn capture_cookies(&self) -> Result<HashMap<String, String>> {
        let cookies = self.page.get_cookies().await?;
        let mut map = HashMap::new();
        for cookie in cookies {
            map.insert(cookie.name.clone(), cookie.value.clone());
        }
        Ok(map)
    }

    /// Shut the browser down and stop the CDP event loop.
    pub fn close(self) {
        drop(self.page);
        drop(self.browser);
        self.handler_task.abort();
    }
}

/// Sleep for a randomized duration in `[min, max]`.
pub async fn settle(min: Duration, max: Duration) {
    let lo = min.as_millis() as u64;
    let hi = max.as_millis() as u64;
    let wait = if hi > lo {
        rand::thread_rng().gen_range(lo..=hi)
    } else {
        lo
    };
    tokio::time::sleep(Duration::from_millis(wait)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_browser_path_wins() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        let found = find_browser(Some(file.path()));
        assert_eq!(found.as_deref(), Some(file.path()));
        Ok(())
    }

    #[test]
    fn missing_explicit_path_falls_through() {
        // A bogus override must not be returned verbatim.
        let found = find_browser(Some(Path::new("/nonexistent/chrome-binary")));
        assert_ne!(found.as_deref(), Some(Path::new("/nonexistent/chrome-binary")));
    }
}
