//! Ledgerwatch monitor
//!
//! Usage:
//!   ledgerwatch run             - Run the scheduler and periodic auto-heal until Ctrl-C (default)
//!   ledgerwatch check           - Run one monitoring cycle and the integrity checks
//!   ledgerwatch fix [--apply]   - Plan integrity fixes; `--apply` writes them
//!   ledgerwatch heal            - Run accounting equation auto-heal once
//!   ledgerwatch status          - Print scheduler configuration
//!   ledgerwatch migrate         - Apply pending database migrations

use std::sync::Arc;

use anyhow::{Context, bail};
use ledgerwatch_core::monitoring::TracingAlertSink;
use ledgerwatch_db::{LedgerEngine, Migrator, connect};
use ledgerwatch_shared::AppConfig;
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.log.json);

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "run".to_string());
    let rest: Vec<String> = args.collect();

    let db = connect(&config.database).await?;
    if command == "migrate" {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
        return Ok(());
    }

    let engine = LedgerEngine::new(db, &config, Arc::new(TracingAlertSink))?;

    match command.as_str() {
        "run" => run(&engine, &config).await,
        "check" => {
            let cycle = engine.run_monitoring_cycle().await?;
            let integrity = engine.balance_health_report().await?;
            let equation = engine.equation_report().await?;
            print_json(&cycle)?;
            print_json(&integrity)?;
            print_json(&equation)
        }
        "fix" => {
            let apply = rest.iter().any(|arg| arg == "--apply");
            let summary = engine.fix_inconsistencies(!apply, None).await?;
            print_json(&summary)
        }
        "heal" => print_json(&engine.scheduled_health_check().await?),
        "status" => print_json(&engine.monitoring_status().await),
        other => bail!("unknown command '{other}' (expected run, check, fix, heal, status or migrate)"),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ledgerwatch=info,ledgerwatch_core=info,ledgerwatch_db=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(engine: &LedgerEngine, config: &AppConfig) -> anyhow::Result<()> {
    let status = engine.monitoring_status().await;
    if !status.enabled {
        warn!("Monitoring is disabled in configuration; nothing to run");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let scheduler = engine.scheduler();
    let worker = tokio::spawn({
        let cancel = cancel.clone();
        async move { scheduler.run(cancel).await }
    });

    info!(
        interval_secs = status.interval_secs,
        auto_fix = status.auto_fix,
        health_check_interval_secs = config.equation.health_check_interval_secs,
        "Ledger monitor started"
    );

    let mut health_check = tokio::time::interval(config.equation.health_check_interval());
    health_check.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal.context("Failed to listen for shutdown signal")?;
                break;
            }
            _ = health_check.tick() => {
                if let Err(e) = engine.scheduled_health_check().await {
                    warn!(error = %e, code = e.error_code(), "Scheduled health check skipped");
                }
            }
        }
    }

    info!("Shutdown requested");
    cancel.cancel();
    worker.await.context("Monitoring worker panicked")?;

    info!("Ledger monitor stopped");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
