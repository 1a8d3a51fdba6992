//! Penmark E2E Test Framework
//!
//! Drives the Penmark web server with a real browser:
//! - Spawns `penmark-web` in fixture mode as a subprocess
//! - Generates one Playwright script per declarative YAML spec
//! - Collects per-step results and writes a JSON report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> ServerHandle                       │
//! │    ├── run_spec(spec: TestSpec) -> TestResult               │
//! │    └── write_results(TestSuiteResult)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, description, tags                              │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── click { locator }                              │
//! │          ├── assert { locator, visible?, text?, count? }    │
//! │          └── screenshot { name, locator? }                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Locators address elements by ARIA role and accessible name, by visible
//! text, or by CSS selector.

pub mod error;
pub mod playwright;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use runner::TestRunner;
pub use spec::{By, Locator, TestSpec, TestStep};
