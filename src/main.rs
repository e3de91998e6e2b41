//! Binary entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use solo_maker::alert::{AlertChannel, Severity};
use solo_maker::api::{self, AppState};
use solo_maker::maker::{MarketWorker, ProtectionConfig};
use solo_maker::market::{ClobClient, DryRunExchange, Exchange, Market};
use solo_maker::trading::TradeLog;
use solo_maker::{metrics, utils, Config};

#[derive(Parser)]
#[command(name = "solo-maker", about = "Protected single-order market maker", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the maker (default).
    Run,
    /// Validate configuration and exit.
    CheckConfig,
    /// Print the wallet's available balance and exit.
    CheckBalance,
    /// Print the bid side of a market's YES book and exit.
    ShowBook {
        /// Market to inspect.
        market_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;

    init_tracing(&config);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::CheckConfig => check_config(config),
        Command::CheckBalance => check_balance(config).await,
        Command::ShowBook { market_id } => show_book(config, &market_id).await,
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(config: Config) -> anyhow::Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    info!(
        markets = ?config.market_id_list(),
        min_protection = %config.min_protection_amount,
        check_bid_position = config.check_bid_position,
        order_size = %config.order_size_usd,
        dry_run = config.dry_run,
        "Starting maker"
    );

    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    metrics::init_metrics();

    let client = ClobClient::new(&config).context("failed to build HTTP client")?;
    let exchange: Arc<dyn Exchange> = if config.dry_run {
        warn!("DRY RUN mode: orders are simulated");
        Arc::new(DryRunExchange::new(Arc::new(client.clone())))
    } else {
        Arc::new(client.clone())
    };

    let markets = resolve_markets(&client, &config.market_id_list()).await;
    anyhow::ensure!(!markets.is_empty(), "no configured market could be resolved");

    let alerts = if config.alerts_enabled() {
        AlertChannel::new(
            config.telegram_bot_token.clone().unwrap_or_default(),
            config.telegram_chat_id.clone().unwrap_or_default(),
        )
    } else {
        AlertChannel::disabled()
    };

    let trade_log = Arc::new(TradeLog::new(config.trade_log_path.clone()));
    let protection = Arc::new(ProtectionConfig::from(&config));
    let app_state = AppState::new();

    let app = api::build_router(app_state.clone());
    let api_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("failed to bind {}", api_addr))?;
    info!(%api_addr, %metrics_addr, "HTTP servers listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Status server failed");
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut workers = Vec::with_capacity(markets.len());
    for market in markets {
        let worker = MarketWorker::new(
            exchange.clone(),
            protection.clone(),
            market,
            Duration::from_millis(config.poll_interval_ms),
            alerts.clone(),
            trade_log.clone(),
            app_state.clone(),
            shutdown_rx.clone(),
        );
        workers.push(tokio::spawn(worker.run()));
    }

    app_state.set_ready();
    alerts
        .send(Severity::Info, "Maker started and quoting")
        .await;

    tokio::spawn(status_report_loop(
        alerts.clone(),
        app_state.clone(),
        client.clone(),
    ));

    utils::shutdown_signal().await;
    info!("Shutting down, cancelling resting orders");
    let _ = shutdown_tx.send(true);

    futures::future::join_all(workers).await;
    alerts.send(Severity::Info, "Maker stopped").await;
    info!("Shutdown complete");
    Ok(())
}

/// Look up each configured market, skipping any that cannot be resolved.
async fn resolve_markets(client: &ClobClient, market_ids: &[String]) -> Vec<Market> {
    let mut markets = Vec::with_capacity(market_ids.len());
    for market_id in market_ids {
        match client.get_market(market_id).await {
            Ok(market) => {
                info!(market_id = %market.id, title = %market.title, "Resolved market");
                markets.push(market);
            }
            Err(e) => {
                warn!(market_id = %market_id, error = %e, "Skipping unresolvable market");
            }
        }
    }
    markets
}

/// Hourly summary to the alert channel.
async fn status_report_loop(alerts: AlertChannel, app_state: AppState, client: ClobClient) {
    let mut ticker = tokio::time::interval(Duration::from_secs(3600));
    ticker.tick().await; // the first tick fires immediately

    loop {
        ticker.tick().await;
        let mut lines = vec!["Hourly status:".to_string()];
        match client.get_balance().await {
            Ok(balance) => lines.push(format!("balance: ${}", balance)),
            Err(e) => lines.push(format!("balance: unavailable ({})", e)),
        }
        for entry in app_state.markets.iter() {
            let s = entry.value();
            let price = s
                .price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "[{}] {} at {} | fills: {} | adjustments: {}",
                s.market_id, s.state, price, s.fills, s.adjustments
            ));
        }
        alerts.send(Severity::Info, &lines.join("\n")).await;
    }
}

fn check_config(config: Config) -> anyhow::Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
    println!("Configuration OK");
    println!("  markets:            {:?}", config.market_id_list());
    println!("  min protection:     ${}", config.min_protection_amount);
    println!("  check bid position: {}", config.check_bid_position);
    println!("  order size:         ${}", config.order_size_usd);
    println!("  poll interval:      {}ms", config.poll_interval_ms);
    println!("  alerts:             {}", config.alerts_enabled());
    println!("  dry run:            {}", config.dry_run);
    Ok(())
}

async fn check_balance(config: Config) -> anyhow::Result<()> {
    let client = ClobClient::new(&config)?;
    let balance = client.get_balance().await?;
    println!("Available balance: ${}", balance);
    Ok(())
}

async fn show_book(config: Config, market_id: &str) -> anyhow::Result<()> {
    let client = ClobClient::new(&config)?;
    let market = client.get_market(market_id).await?;
    let book = client.get_order_book(&market.yes_token_id).await?;

    println!("{} ({})", market.title, market.id);
    println!("YES token {}", market.yes_token_id);
    println!("{:<8} {:>12} {:>14}", "rank", "price", "usd depth");
    let mut cumulative = rust_decimal::Decimal::ZERO;
    for (i, level) in book.bids.iter().enumerate() {
        cumulative += level.size;
        println!(
            "{:<8} {:>12} {:>14}",
            i + 1,
            level.price.to_string(),
            format!("${} (${})", level.size, cumulative)
        );
    }
    Ok(())
}
