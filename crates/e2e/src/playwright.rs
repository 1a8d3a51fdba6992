//! Playwright browser automation
//!
//! A spec is compiled into a single Node script so the whole test shares one
//! browser page. Each step reports back on stdout as an `@@step {json}` line.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::spec::{By, Locator, TestStep, Viewport};

/// Marker prefix for step result lines in script output
const STEP_MARKER: &str = "@@step ";

/// Default timeout for clicks that do not set one
const DEFAULT_CLICK_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!("unknown browser {:?}", other))),
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub screenshot_path: Option<PathBuf>,
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport: Viewport,
    pub browser: Browser,
    pub headless: bool,
    /// Directory whose `node_modules` provides `@playwright/test`
    pub project_dir: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5173".to_string(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport: Viewport { width: 1280, height: 720 },
            browser: Browser::Chromium,
            headless: true,
            project_dir: PathBuf::from("."),
        }
    }
}

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config.project_dir)?;
        std::fs::create_dir_all(&config.screenshot_dir)?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed(project_dir: &Path) -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .current_dir(project_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Build the Playwright script for a set of steps
    pub fn build_script(&self, steps: &[TestStep]) -> String {
        let cfg = &self.config;
        let mut script = format!(
            r#"const {{ chromium, firefox, webkit, expect }} = require('@playwright/test');

async function step(name, fn) {{
  const started = Date.now();
  const report = (extra) => console.log('{marker}' + JSON.stringify(Object.assign({{
    step_name: name,
    duration_ms: Date.now() - started,
  }}, extra)));
  try {{
    const screenshot_path = await fn();
    report({{ success: true, screenshot_path: screenshot_path || null }});
  }} catch (error) {{
    report({{ success: false, error: String((error && error.message) || error) }});
    throw error;
  }}
}}

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};
  let failed = false;

  try {{
"#,
            marker = STEP_MARKER,
            browser = cfg.browser.as_str(),
            headless = cfg.headless,
            width = cfg.viewport.width,
            height = cfg.viewport.height,
            base_url = js_str(cfg.base_url.trim_end_matches('/')),
        );

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}\n", i + 1));
            script.push_str(&format!(
                "    await step({}, async () => {{\n{}\n    }});\n",
                js_str(&step.label()),
                self.step_to_js(step)
            ));
        }

        script.push_str(
            r#"  } catch (error) {
    failed = true;
  } finally {
    await browser.close();
  }
  process.exit(failed ? 1 : 0);
})();
"#,
        );

        script
    }

    /// Convert a step to the body of its `step()` callback
    fn step_to_js(&self, step: &TestStep) -> String {
        match step {
            TestStep::Navigate { url, wait_for } => {
                let mut js = format!("      await page.goto(baseUrl + {});", js_str(url));
                if let Some(locator) = wait_for {
                    js.push_str(&format!("\n      await {}.waitFor();", locator_js(locator)));
                }
                js
            }
            TestStep::Click { locator, timeout_ms } => format!(
                "      await {}.click({{ timeout: {} }});",
                locator_js(locator),
                timeout_ms.unwrap_or(DEFAULT_CLICK_TIMEOUT_MS)
            ),
            TestStep::Fill { locator, value } => {
                format!("      await {}.fill({});", locator_js(locator), js_str(value))
            }
            TestStep::Press { locator: Some(locator), key } => {
                format!("      await {}.press({});", locator_js(locator), js_str(key))
            }
            TestStep::Press { locator: None, key } => {
                format!("      await page.keyboard.press({});", js_str(key))
            }
            TestStep::Wait { locator, timeout_ms, state } => format!(
                "      await {}.waitFor({{ state: '{}', timeout: {} }});",
                locator_js(locator),
                state.as_str(),
                timeout_ms
            ),
            TestStep::Sleep { ms } => format!("      await page.waitForTimeout({});", ms),
            TestStep::Assert { locator, visible, text, text_contains, count } => {
                let target = locator_js(locator);
                let mut assertions = Vec::new();

                match visible {
                    Some(true) => assertions.push(format!("      await expect({}).toBeVisible();", target)),
                    Some(false) => assertions.push(format!("      await expect({}).toBeHidden();", target)),
                    None => {}
                }
                if let Some(t) = text {
                    assertions.push(format!("      await expect({}).toHaveText({});", target, js_str(t)));
                }
                if let Some(t) = text_contains {
                    assertions.push(format!("      await expect({}).toContainText({});", target, js_str(t)));
                }
                if let Some(c) = count {
                    assertions.push(format!("      await expect({}).toHaveCount({});", target, c));
                }
                if assertions.is_empty() {
                    assertions.push(format!("      await expect({}).toBeVisible();", target));
                }

                assertions.join("\n")
            }
            TestStep::Screenshot { name, locator, full_page } => {
                let path = self.screenshot_path(name);
                let path = js_str(&path.to_string_lossy());
                match locator {
                    Some(locator) => format!(
                        "      await {}.screenshot({{ path: {} }});\n      return {};",
                        locator_js(locator),
                        path,
                        path
                    ),
                    None => format!(
                        "      await page.screenshot({{ path: {}, fullPage: {} }});\n      return {};",
                        path, full_page, path
                    ),
                }
            }
            TestStep::Log { message } => {
                format!("      console.log({});", js_str(&format!("[TEST] {}", message)))
            }
        }
    }

    fn screenshot_path(&self, name: &str) -> PathBuf {
        self.config.screenshot_dir.join(format!("{}.png", name))
    }

    /// Run all steps in one browser session
    ///
    /// Returns one result per executed step; execution stops at the first
    /// failing step.
    pub async fn run(&self, steps: &[TestStep]) -> E2eResult<Vec<StepResult>> {
        let script = self.build_script(steps);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("spec.js");
        std::fs::write(&script_path, &script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let node_modules = self.config.project_dir.join("node_modules");
        let output = TokioCommand::new("node")
            .arg(&script_path)
            .current_dir(&self.config.project_dir)
            .env("NODE_PATH", node_modules)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let results = parse_step_results(&stdout)?;

        for line in stdout.lines().filter(|l| !l.starts_with(STEP_MARKER)) {
            info!("{}", line);
        }

        if !output.status.success() && !results.iter().any(|r| !r.success) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        Ok(results)
    }
}

/// Extract step results from script stdout
pub fn parse_step_results(stdout: &str) -> E2eResult<Vec<StepResult>> {
    step_line()
        .captures_iter(stdout)
        .map(|caps| Ok(serde_json::from_str(&caps[1])?))
        .collect()
}

fn step_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^@@step (\{.*\})\r?$").expect("step line regex"))
}

/// Quote a string as a JavaScript literal
fn js_str(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// JavaScript expression for a locator on `page`
pub fn locator_js(locator: &Locator) -> String {
    let exact = locator.exact;
    let base = match &locator.by {
        By::Role { role, name: Some(name) } => format!(
            "page.getByRole({}, {{ name: {}, exact: {} }})",
            js_str(role),
            js_str(name),
            exact
        ),
        By::Role { role, name: None } => format!("page.getByRole({})", js_str(role)),
        By::Text { text } => format!("page.getByText({}, {{ exact: {} }})", js_str(text), exact),
        By::Css { css } => format!("page.locator({})", js_str(css)),
    };

    match locator.nth {
        Some(0) => format!("{}.first()", base),
        Some(n) => format!("{}.nth({})", base, n),
        None => base,
    }
}
