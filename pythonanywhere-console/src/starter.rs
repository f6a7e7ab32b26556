//! Headless-browser console startup.

use std::collections::BTreeMap;
use std::time::Duration;

use headless_chrome::protocol::cdp::Network::CookieParam;
use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, info, instrument};

use pythonanywhere_core::{ApiResponse, ClientError};

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the platform's web surface.
pub const BASE_URL: &str = "https://www.pythonanywhere.com";

/// Element that appears once the console frame's terminal has initialized.
///
/// This mirrors today's markup of the console frame page; a vendor markup
/// change only requires updating this selector.
pub const CONSOLE_READY_SELECTOR: &str = "#id_console";

/// Default wait for the terminal-ready marker.
const DEFAULT_WAIT_SECS: u64 = 30;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the headless browser session.
#[derive(Debug, Clone)]
pub struct StarterConfig {
    /// Base URL of the web surface the cookies belong to.
    pub base_url: String,
    /// Run the browser headless (default: true).
    pub headless: bool,
    /// Browser window size.
    pub window_width: u32,
    /// Browser window height.
    pub window_height: u32,
    /// How long to wait for the terminal-ready marker.
    pub wait_timeout: Duration,
}

impl Default for StarterConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            headless: true,
            window_width: 1280,
            window_height: 900,
            wait_timeout: Duration::from_secs(DEFAULT_WAIT_SECS),
        }
    }
}

// ============================================================================
// Console Starter
// ============================================================================

/// Starts consoles by loading their interactive frame in a headless browser.
///
/// The browser lives only for the duration of one
/// [`start_console`](Self::start_console) call and is torn down on every
/// exit path when the owning value drops.
#[derive(Debug, Clone, Default)]
pub struct ConsoleStarter {
    config: StarterConfig,
}

impl ConsoleStarter {
    /// Starter with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starter with a caller-supplied configuration.
    pub fn with_config(config: StarterConfig) -> Self {
        Self { config }
    }

    /// URL of a console's interactive frame page.
    pub fn frame_url(&self, username: &str, console_id: u64) -> String {
        format!(
            "{}/user/{username}/consoles/{console_id}/frame/",
            self.config.base_url
        )
    }

    /// Opens a console's frame with the given session cookies and waits for
    /// the terminal to become ready.
    ///
    /// Returns the normalized record: success once the marker element
    /// appears, a timeout failure if it never does within the configured
    /// wait, and an automation failure for any other driver error. The
    /// browser work is synchronous, so it runs on a blocking thread rather
    /// than stalling the executor for the duration of the wait.
    #[instrument(skip(self, cookies))]
    pub async fn start_console(
        &self,
        username: &str,
        console_id: u64,
        cookies: &BTreeMap<String, String>,
    ) -> ApiResponse {
        let starter = self.clone();
        let username = username.to_string();
        let cookies = cookies.clone();
        let outcome =
            tokio::task::spawn_blocking(move || starter.run(&username, console_id, &cookies))
                .await;
        match outcome {
            Ok(Ok(())) => ApiResponse::ok_empty(200),
            Ok(Err(e)) => ApiResponse::from(&e),
            Err(e) => {
                ApiResponse::from(&ClientError::Automation(format!("browser task failed: {e}")))
            }
        }
    }

    fn run(
        &self,
        username: &str,
        console_id: u64,
        cookies: &BTreeMap<String, String>,
    ) -> Result<(), ClientError> {
        let url = self.frame_url(username, console_id);
        info!(url = %url, headless = self.config.headless, "Starting console");

        let options = LaunchOptions::default_builder()
            .headless(self.config.headless)
            .window_size(Some((self.config.window_width, self.config.window_height)))
            .build()
            .map_err(|e| ClientError::Automation(format!("failed to build launch options: {e}")))?;
        let browser = Browser::new(options)
            .map_err(|e| ClientError::Automation(format!("failed to launch browser: {e}")))?;
        let tab = browser
            .new_tab()
            .map_err(|e| ClientError::Automation(format!("failed to open tab: {e}")))?;

        let params: Vec<CookieParam> = cookies
            .iter()
            .map(|(name, value)| self.cookie_param(name, value))
            .collect();
        debug!(count = params.len(), "Injecting session cookies");
        tab.set_cookies(params)
            .map_err(|e| ClientError::Automation(format!("failed to set cookies: {e}")))?;

        tab.navigate_to(&url)
            .map_err(|e| ClientError::Automation(format!("navigation failed: {e}")))?;
        tab.wait_until_navigated()
            .map_err(|e| ClientError::Automation(format!("navigation failed: {e}")))?;

        tab.wait_for_element_with_custom_timeout(CONSOLE_READY_SELECTOR, self.config.wait_timeout)
            .map_err(|_| ClientError::Timeout(CONSOLE_READY_SELECTOR.to_string()))?;

        debug!("Console frame ready");
        Ok(())
    }

    fn cookie_param(&self, name: &str, value: &str) -> CookieParam {
        CookieParam {
            name: name.to_string(),
            value: value.to_string(),
            url: Some(self.config.base_url.clone()),
            domain: None,
            path: None,
            secure: None,
            http_only: None,
            same_site: None,
            expires: None,
            priority: None,
            same_party: None,
            source_scheme: None,
            source_port: None,
            partition_key: None,
        }
    }
}
