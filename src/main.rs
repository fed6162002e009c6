use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vsa_exporter::{
    config::{parse_flag, Config},
    server,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// VSA management API base URL (overrides config)
    #[arg(long, env = "VSA_URL")]
    vsa_url: Option<String>,

    /// VSA user (overrides config)
    #[arg(long, env = "VSA_USER")]
    vsa_user: Option<String>,

    /// VSA password (overrides config)
    #[arg(long, env = "VSA_PASSWORD", hide_env_values = true)]
    vsa_password: Option<String>,

    /// Skip TLS certificate validation, 0 or 1 (overrides config)
    #[arg(long, env = "IGNORE_CERTS", value_parser = parse_flag)]
    ignore_certs: Option<bool>,

    /// Port to listen on for metrics (overrides config)
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting StarWind VSA Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let mut config = Config::load(&args.config)?;

    if let Some(url) = args.vsa_url {
        config.vsa.url = url;
    }
    if let Some(user) = args.vsa_user {
        config.vsa.user = user;
    }
    if let Some(password) = args.vsa_password {
        config.vsa.password = secrecy::SecretString::new(password.into());
    }
    if let Some(ignore_certs) = args.ignore_certs {
        config.vsa.ignore_certs = ignore_certs;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    info!("Configuration loaded successfully");
    info!("VSA API: {}", config.vsa.url);
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    if let Err(e) = server::start(config).await {
        error!("Exporter error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
