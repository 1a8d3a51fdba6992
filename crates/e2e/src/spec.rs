//! Declarative YAML test specification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// A complete test specification parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

fn default_viewport() -> Viewport {
    Viewport { width: 1280, height: 720 }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// How to find an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum By {
    /// ARIA role, optionally narrowed by accessible name
    Role {
        role: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// Visible text
    Text { text: String },
    /// CSS selector
    Css { css: String },
}

/// Element locator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locator {
    #[serde(flatten)]
    pub by: By,

    /// Pick the nth match (0-based) instead of requiring a unique one
    #[serde(default)]
    pub nth: Option<usize>,

    /// Match name/text exactly rather than as a case-insensitive substring
    #[serde(default)]
    pub exact: bool,
}

impl Locator {
    pub fn role(role: &str, name: Option<&str>) -> Self {
        Self::from(By::Role {
            role: role.to_string(),
            name: name.map(String::from),
        })
    }

    pub fn text(text: &str) -> Self {
        Self::from(By::Text { text: text.to_string() })
    }

    pub fn css(css: &str) -> Self {
        Self::from(By::Css { css: css.to_string() })
    }

    pub fn first(mut self) -> Self {
        self.nth = Some(0);
        self
    }
}

impl From<By> for Locator {
    fn from(by: By) -> Self {
        Self { by, nth: None, exact: false }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.by {
            By::Role { role, name: Some(name) } => write!(f, "role={}[{}]", role, name)?,
            By::Role { role, name: None } => write!(f, "role={}", role)?,
            By::Text { text } => write!(f, "text={}", text)?,
            By::Css { css } => write!(f, "css={}", css)?,
        }
        if let Some(n) = self.nth {
            write!(f, "#{}", n)?;
        }
        Ok(())
    }
}

/// A single step in a test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for: Option<Locator>,
    },

    /// Click an element
    Click {
        locator: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill {
        locator: Locator,
        value: String,
    },

    /// Press a key, on an element or the page
    Press {
        #[serde(default)]
        locator: Option<Locator>,
        key: String,
    },

    /// Wait for an element to reach a state
    Wait {
        locator: Locator,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep {
        ms: u64,
    },

    /// Assert something about an element
    Assert {
        locator: Locator,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        locator: Option<Locator>,
        #[serde(default)]
        full_page: bool,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

fn default_wait_timeout() -> u64 {
    5000 // 5 seconds default
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

impl TestStep {
    /// Short label used in logs and reports
    pub fn label(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{}", url),
            TestStep::Click { locator, .. } => format!("click:{}", locator),
            TestStep::Fill { locator, .. } => format!("fill:{}", locator),
            TestStep::Press { key, .. } => format!("press:{}", key),
            TestStep::Wait { locator, .. } => format!("wait:{}", locator),
            TestStep::Sleep { ms } => format!("sleep:{}ms", ms),
            TestStep::Assert { locator, .. } => format!("assert:{}", locator),
            TestStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            TestStep::Log { message } => {
                format!("log:{}", message.chars().take(30).collect::<String>())
            }
        }
    }
}

impl TestSpec {
    /// Parse a test spec from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        if spec.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("{}: no steps", spec.name)));
        }
        Ok(spec)
    }

    /// Parse a test spec from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all test specs from a directory, sorted by name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        specs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(specs)
    }

    /// Filter specs by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_post_spec() {
        let yaml = r#"
name: read-post
description: Follow the first Read link
tags: [smoke]
steps:
  - action: navigate
    url: /
  - action: click
    locator: { role: link, name: Read, nth: 0 }
  - action: assert
    locator: { role: heading, name: First post }
    visible: true
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "read-post");
        assert_eq!(spec.steps.len(), 3);

        match &spec.steps[1] {
            TestStep::Click { locator, .. } => {
                assert_eq!(locator, &Locator::role("link", Some("Read")).first());
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_locator_variants() {
        let text: Locator = serde_yaml::from_str("{ text: Welcome }").unwrap();
        assert_eq!(text, Locator::text("Welcome"));

        let css: Locator = serde_yaml::from_str("{ css: 'ul.posts > li', exact: true }").unwrap();
        assert_eq!(css.by, By::Css { css: "ul.posts > li".into() });
        assert!(css.exact);

        let role: Locator = serde_yaml::from_str("{ role: heading }").unwrap();
        assert_eq!(role.to_string(), "role=heading");
    }

    #[test]
    fn test_empty_steps_rejected() {
        let err = TestSpec::from_yaml("name: nothing\nsteps: []\n").unwrap_err();
        assert!(matches!(err, E2eError::SpecParse(_)));
    }

    #[test]
    fn test_load_all_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha"] {
            std::fs::write(
                dir.path().join(format!("{name}.yaml")),
                format!("name: {name}\ntags: [smoke]\nsteps:\n  - action: navigate\n    url: /\n"),
            )
            .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let specs = TestSpec::load_all(dir.path()).unwrap();
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert_eq!(TestSpec::filter_by_tag(&specs, "smoke").len(), 2);
    }
}
