//! Screenshot capture using headless Chrome

use crate::catalog::{Environment, DEVICES};
use crate::session::{Session, SessionStore, StoredCookie};
use crate::types::Viewport;
use crate::{Result, VisionError};
use headless_chrome::protocol::cdp::Emulation::SetDeviceMetricsOverride;
use headless_chrome::protocol::cdp::Network::CookieParam;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::util::Wait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Freezes CSS animations and transitions, including inside inline SVG
const FREEZE_ANIMATIONS_SCRIPT: &str = r#"(function(){
    var style = document.createElement('style');
    style.setAttribute('data-connect-vision', 'freeze');
    style.appendChild(document.createTextNode(
        "*, *::before, *::after { animation: none !important; transition: none !important; } " +
        "svg * { animation: none !important; transition: none !important; }"
    ));
    (document.head || document.documentElement).appendChild(style);
    return true;
})()"#;

const PAGE_HEIGHT_SCRIPT: &str = r#"Math.max(
    document.documentElement.scrollHeight,
    document.body ? document.body.scrollHeight : 0
)"#;

/// How long the browser may take to leave the sign-in page after submitting
const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can turn a URL into PNG bytes at a given viewport
pub trait Renderer {
    fn render(&mut self, url: &str, viewport: Viewport) -> Result<Vec<u8>>;
}

/// Render `url` and store the screenshot at `current`, replacing any previous capture.
pub fn capture<R: Renderer + ?Sized>(
    renderer: &mut R,
    url: &str,
    viewport: Viewport,
    current: &Path,
) -> Result<()> {
    let png = renderer.render(url, viewport)?;
    std::fs::write(current, png)?;
    Ok(())
}

/// One browser with a single tab, reused for every capture
pub struct ChromeRenderer {
    tab: Arc<Tab>,
    browser: Browser,
}

impl ChromeRenderer {
    /// Launch Chrome, headless unless `show` is set
    pub fn launch(show: bool) -> Result<Self> {
        let (_, desktop) = DEVICES[0];

        let browser = Browser::new(LaunchOptions {
            headless: !show,
            window_size: Some(desktop.dimensions()),
            ..Default::default()
        })
        .map_err(|e| VisionError::Browser(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| VisionError::Browser(e.to_string()))?;

        Ok(Self { tab, browser })
    }

    /// Reuse a cached session or log in and cache the new one for `ttl`
    pub fn authenticate(
        &self,
        environment: Environment,
        store: &dyn SessionStore,
        ttl: chrono::Duration,
    ) -> Result<()> {
        if let Some(session) = store.load()? {
            self.restore_session(&session)?;
            info!("✅ Loaded cookies for {} environment", environment);
            return Ok(());
        }

        self.login(environment)?;
        info!("✅ Logged in successfully");

        let session = self.current_session()?;
        store.save(&session, ttl)?;
        info!("✅ Cookies saved for {} environment", environment);

        Ok(())
    }

    fn login(&self, environment: Environment) -> Result<()> {
        let user = credential("LOGIN_USER")?;
        let password = credential("LOGIN_PASS")?;

        let form = LoginForm::for_environment(environment);
        let url = format!("{}{}", environment.base_url(), form.path);

        self.tab.navigate_to(&url).map_err(browser_error)?;
        self.tab.wait_until_navigated().map_err(browser_error)?;

        let email = self.tab.wait_for_element(form.email).map_err(browser_error)?;
        email.type_into(&user).map_err(browser_error)?;

        let pass = self.tab.wait_for_element(form.password).map_err(browser_error)?;
        pass.type_into(&password).map_err(browser_error)?;

        let submit = self.tab.wait_for_element(form.submit).map_err(browser_error)?;
        submit.click().map_err(browser_error)?;

        // The navigation flag may not be raised yet when the click returns
        Wait::with_timeout(LOGIN_TIMEOUT)
            .until(|| (!is_sign_in_page(&self.tab.get_url())).then_some(()))
            .map_err(|_| {
                VisionError::Session(format!(
                    "Still on the sign-in page after {}s, check LOGIN_USER and LOGIN_PASS",
                    LOGIN_TIMEOUT.as_secs()
                ))
            })?;
        self.tab.wait_until_navigated().map_err(browser_error)?;

        if let Some(selector) = form.ready {
            self.tab.wait_for_element(selector).map_err(browser_error)?;
        }

        Ok(())
    }

    fn restore_session(&self, session: &Session) -> Result<()> {
        let cookies = session
            .cookies
            .iter()
            .map(|cookie| {
                serde_json::to_value(cookie)
                    .and_then(serde_json::from_value::<CookieParam>)
                    .map_err(|e| VisionError::Session(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.tab
            .set_cookies(cookies)
            .map_err(|e| VisionError::Browser(e.to_string()))
    }

    fn current_session(&self) -> Result<Session> {
        let cookies = self
            .tab
            .get_cookies()
            .map_err(|e| VisionError::Browser(e.to_string()))?
            .into_iter()
            .map(|cookie| {
                serde_json::to_value(cookie)
                    .and_then(serde_json::from_value::<StoredCookie>)
                    .map_err(|e| VisionError::Session(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Session::new(cookies))
    }

    /// Emulate a viewport of exactly `width` x `height` CSS pixels.
    ///
    /// Unlike resizing the window this is independent of toolbars and the
    /// minimum window width of a visible browser.
    fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        self.tab
            .call_method(device_metrics(width, height))
            .map_err(|e| VisionError::Browser(e.to_string()))?;
        Ok(())
    }

    fn page_height(&self) -> Result<u32> {
        let value = self
            .tab
            .evaluate(PAGE_HEIGHT_SCRIPT, false)
            .map_err(|e| VisionError::Capture(e.to_string()))?
            .value
            .and_then(|v| v.as_f64())
            .ok_or_else(|| VisionError::Capture("Failed to measure page height".to_string()))?;

        Ok(value.ceil() as u32)
    }
}

impl Renderer for ChromeRenderer {
    fn render(&mut self, url: &str, viewport: Viewport) -> Result<Vec<u8>> {
        self.set_viewport(viewport.width, viewport.height)?;

        self.tab
            .navigate_to(url)
            .map_err(|e| VisionError::Browser(e.to_string()))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| VisionError::Browser(e.to_string()))?;

        self.tab
            .evaluate(FREEZE_ANIMATIONS_SCRIPT, false)
            .map_err(|e| VisionError::Capture(e.to_string()))?;

        // Grow the viewport to the document so the screenshot covers the full page
        let full_height = self.page_height()?.max(viewport.height);
        if full_height != viewport.height {
            debug!("Expanding viewport to full page height {}", full_height);
            self.set_viewport(viewport.width, full_height)?;
        }

        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| VisionError::Capture(e.to_string()))
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        // The Chrome process is killed when `browser` is dropped
        debug!("Closing browser (pid {:?})", self.browser.get_process_id());
    }
}

fn device_metrics(width: u32, height: u32) -> SetDeviceMetricsOverride {
    SetDeviceMetricsOverride {
        width,
        height,
        device_scale_factor: 1.0,
        mobile: false,
        scale: None,
        screen_width: None,
        screen_height: None,
        position_x: None,
        position_y: None,
        dont_set_visible_size: None,
        screen_orientation: None,
        viewport: None,
        display_feature: None,
        device_posture: None,
    }
}

/// Whether `url` still points at a login form
fn is_sign_in_page(url: &str) -> bool {
    url.contains("/sign_in")
}

fn browser_error(e: impl std::fmt::Display) -> VisionError {
    VisionError::Browser(e.to_string())
}

fn credential(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| VisionError::Session(format!("{} is not set", name)))
}

/// Selectors of the admin login form of an environment
struct LoginForm {
    path: &'static str,
    email: &'static str,
    password: &'static str,
    submit: &'static str,
    /// Element that appears once the dashboard has loaded
    ready: Option<&'static str>,
}

impl LoginForm {
    fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Localhost => Self {
                path: "/admins/sign_in/",
                email: "#admin_email",
                password: "#admin_password",
                submit: ".admin-log-in-button",
                ready: None,
            },
            Environment::Staging | Environment::Production => Self {
                path: "/admin/dashboard",
                email: "#user_email",
                password: "#user_password",
                submit: ".btn-default",
                ready: Some(".dashboards"),
            },
        }
    }
}
