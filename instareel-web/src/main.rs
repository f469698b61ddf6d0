//! Instareel Web Server
//!
//! HTTP service for account sessions, photo uploads and reel generation.

use clap::Parser;
use instareel_core::{init_logging, InstareelConfig, LogFormat, LoggingConfig};
use instareel_web::server::InstareelServerBuilder;
use instareel_web::WebConfig;

/// Instareel Web Server
#[derive(Parser)]
#[command(name = "instareel-web")]
#[command(about = "HTTP service for account sessions, photo uploads and reel generation")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Simulate the platform in-process instead of calling the real API
    #[arg(long)]
    dev: bool,

    /// TOML service configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = WebConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.config.is_some() {
        config.config_path = args.config;
    }
    config.dev_mode |= args.dev;

    // The file's logging section applies unless overridden on the command line
    let mut logging = config
        .config_path
        .as_deref()
        .and_then(|path| InstareelConfig::from_file(path).ok())
        .map(|service| service.logging)
        .unwrap_or_else(LoggingConfig::default);
    if let Some(level) = args.log_level {
        logging.level = level;
        logging.filter_directives = vec!["tower_http=debug".to_string()];
    }
    if args.json_logs {
        logging.format = LogFormat::Json;
    }
    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let server = match InstareelServerBuilder::from_config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to create server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
