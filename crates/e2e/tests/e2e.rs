//! E2E test harness entry point
//!
//! Runs the YAML specs under `specs/` against a freshly spawned
//! `penmark-web` in fixture mode. Needs Node with `@playwright/test`
//! installed, so it only runs when `PENMARK_E2E=1`:
//!
//! ```text
//! cargo build -p penmark-web
//! PENMARK_E2E=1 cargo test -p penmark-e2e --test e2e -- --tag smoke
//! ```
//!
//! Exit codes: 0 all passed (or skipped), 1 a test failed, 2 runner error.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use penmark_e2e::playwright::{Browser, PlaywrightConfig};
use penmark_e2e::runner::{RunnerConfig, TestSuiteResult};
use penmark_e2e::server::ServerConfig;
use penmark_e2e::{E2eResult, TestRunner};

const MANIFEST_DIR: &str = env!("CARGO_MANIFEST_DIR");

#[derive(Parser, Debug)]
#[command(name = "penmark-e2e")]
#[command(about = "E2E test runner for Penmark")]
struct Args {
    /// Path to test specs directory
    #[arg(short, long, default_value_os_t = PathBuf::from(MANIFEST_DIR).join("specs"))]
    specs: PathBuf,

    /// Run only tests matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific test by name
    #[arg(short, long)]
    name: Option<String>,

    /// Path to web server binary
    #[arg(long, env = "PENMARK_WEB_BIN", default_value_os_t = default_server_binary())]
    server_binary: PathBuf,

    /// Port to run server on (0 = auto)
    #[arg(long, default_value = "0")]
    port: u16,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: Browser,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Directory containing node_modules with @playwright/test
    #[arg(long, env = "PENMARK_E2E_PROJECT_DIR", default_value = ".")]
    project_dir: PathBuf,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn default_server_binary() -> PathBuf {
    PathBuf::from(MANIFEST_DIR).join("../../target/debug/penmark-web")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if std::env::var("PENMARK_E2E").as_deref() != Ok("1") {
        eprintln!("penmark-e2e: skipped (set PENMARK_E2E=1 to run browser tests)");
        return;
    }

    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let config = RunnerConfig {
        server: ServerConfig {
            binary_path: args.server_binary,
            port: if args.port == 0 { None } else { Some(args.port) },
            ..Default::default()
        },
        playwright: PlaywrightConfig {
            browser: args.browser,
            headless: !args.headed,
            screenshot_dir: args.output.join("screenshots"),
            project_dir: args.project_dir,
            ..Default::default()
        },
        specs_dir: args.specs,
        output_dir: args.output,
    };

    let mut runner = TestRunner::with_config(config);

    let results = if let Some(name) = args.name {
        let result = runner.run_test(&name).await?;
        let duration_ms = result.duration_ms;
        TestSuiteResult::from_results(vec![result], duration_ms)
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;

    Ok(results.success())
}
