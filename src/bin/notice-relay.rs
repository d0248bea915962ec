use clap::Parser;
use notice_relay::observability::service_resources_metrics::collect_process_metrics;
use notice_relay::server;
use notice_relay::utils::config_loader;
use notice_relay::utils::constants::DEFAULT_CONFIG_PATH;
use notice_relay::utils::logging;
use anyhow::Result;
use notice_relay::utils::logging::LogLevel;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 2. Build token cache and dispatcher
    // -------------------------------

    let state = server::server::build_state(&service_config)?;

    // -------------------------------
    // 3. Warm the token cache; the service still starts if upstream is down
    // -------------------------------

    match state.dispatcher.cache().get_token().await {
        Ok(_) => info!("initial access token fetched"),
        Err(err) => warn!(error = %err, "initial access token fetch failed, will retry on first notice"),
    }

    // -------------------------------
    // 4. Serve HTTP and scrape process metrics
    // -------------------------------

    let http_server = server::server::start(&service_config.settings, state);
    let metrics_enabled = service_config.settings.metrics.is_enabled;
    let service_metrics = async move {
        collect_process_metrics(metrics_enabled).await?;
        // disabled collection returns at once; only the server decides when to stop
        std::future::pending::<Result<()>>().await
    };

    info!("Service starting...");
    tokio::select! {
        res = http_server => res?,
        res = service_metrics => res?,
    }

    Ok(())
}
