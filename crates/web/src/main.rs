use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use penmark_common::PenmarkConfig;

#[derive(Parser)]
#[command(name = "penmark-web")]
#[command(about = "Penmark blog front end with API proxy")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "PENMARK_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "PENMARK_WEB_ADDR")]
    listen: Option<String>,

    /// Blog API origin (overrides config)
    #[arg(long, env = "PENMARK_API_ORIGIN")]
    api_origin: Option<String>,

    /// Proxy target for the API prefix (overrides config)
    #[arg(long, env = "PENMARK_PROXY_TARGET")]
    proxy_target: Option<String>,

    /// Serve built-in fixture posts instead of calling the backend
    #[arg(long, env = "PENMARK_FIXTURES", value_parser = clap::builder::BoolishValueParser::new())]
    fixtures: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("Penmark web v{}", penmark_common::VERSION);

    let config_path = cli.config.unwrap_or_else(penmark_common::default_config_path);
    let mut cfg = PenmarkConfig::load(&config_path)?;

    if let Some(listen) = cli.listen {
        cfg.server.listen = listen;
    }
    if let Some(target) = cli.proxy_target {
        cfg.proxy.target = target;
    }
    if let Some(origin) = cli.api_origin {
        cfg.api.origin = Some(origin);
    }
    if cli.fixtures {
        cfg.server.fixtures = true;
    }

    let addr = cfg.listen_addr()?;
    penmark_web::server::serve(addr, cfg).await
}
