//! Domain Expiry Exporter
//!
//! Serves the registration expiry timestamp of every zone on the registrar
//! account at `/metrics`, one line per domain.

use clap::Parser;
use domain_expiry_lib::{
    check_pacing_interval, is_whois_available, load_env_config, parse_duration_string, serve,
    AppState, ConfigManager, ConfigOverrides, ExpiryError, ExporterConfig,
};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments for domain-expiry-exporter
#[derive(Parser, Debug)]
#[command(name = "domain-expiry-exporter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Export domain registration expiry timestamps for scraping")]
#[command(
    long_about = "Export domain registration expiry timestamps for scraping.\n\nOn every request to /metrics the zone list is fetched from the registrar API and each domain's expiry is looked up via WHOIS, one domain at a time.\n\nThe API token is read from CF_TOKEN (environment or .env) or the config file."
)]
pub struct Args {
    /// Address to listen on [default: 127.0.0.1]
    #[arg(long = "listen-addr", value_name = "ADDR", help_heading = "Server")]
    pub listen_addr: Option<String>,

    /// Port to listen on [default: 9988]
    #[arg(
        long = "listen-port",
        value_name = "PORT",
        value_parser = clap::value_parser!(u16).range(1..),
        help_heading = "Server"
    )]
    pub listen_port: Option<u16>,

    /// Zone-listing API endpoint
    #[arg(long = "zones-url", value_name = "URL", help_heading = "Zones")]
    pub zones_url: Option<String>,

    /// Timeout for each WHOIS lookup (e.g. 10s, 1m)
    #[arg(
        long = "whois-timeout",
        value_name = "DURATION",
        value_parser = parse_timeout_arg,
        help_heading = "WHOIS"
    )]
    pub whois_timeout: Option<Duration>,

    /// Pause between consecutive WHOIS lookups, at least 1s (e.g. 1s, 2s)
    #[arg(
        long = "pacing",
        value_name = "DURATION",
        value_parser = parse_pacing_arg,
        help_heading = "WHOIS"
    )]
    pub pacing: Option<Duration>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Log which configuration sources were used
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

impl Args {
    /// Command-line values as the highest-precedence override layer.
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen_addr: self.listen_addr.clone(),
            listen_port: self.listen_port,
            zones_url: self.zones_url.clone(),
            whois_timeout: self.whois_timeout,
            pacing_interval: self.pacing,
            ..Default::default()
        }
    }
}

fn parse_duration_arg(value: &str) -> Result<Duration, String> {
    parse_duration_string(value)
        .ok_or_else(|| format!("invalid duration '{}', use e.g. '500ms', '10s', '2m'", value))
}

fn parse_timeout_arg(value: &str) -> Result<Duration, String> {
    let timeout = parse_duration_arg(value)?;
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(timeout)
}

fn parse_pacing_arg(value: &str) -> Result<Duration, String> {
    check_pacing_interval(parse_duration_arg(value)?).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // .env values become ordinary environment variables; a missing file is fine.
    dotenvy::dotenv().ok();

    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), ExpiryError> {
    let manager = ConfigManager::new(args.verbose);
    let file_config = match &args.config {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load()?,
    };

    let env_config = load_env_config(args.verbose);
    let config = ExporterConfig::resolve(&file_config, &[env_config, args.overrides()])?;
    debug!(?config, "configuration resolved");

    if !is_whois_available(&config.whois_program).await {
        warn!(
            program = %config.whois_program,
            "whois program not found; every lookup will fail until it is installed"
        );
    }

    let state = AppState::new(Arc::new(config.zone_client()?), config.pipeline());

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ExpiryError::config(format!("Cannot listen on {}: {}", address, e)))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting web server on {}", address
    );
    serve(listener, state).await
}
