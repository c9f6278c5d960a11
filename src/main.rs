use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cellbot::config::{BotConfig, SandboxConfig};
use cellbot::game::keepalive::KeepAlive;
use cellbot::game::systems::ai::Bot;
use cellbot::metrics::{self, BotMetrics};
use cellbot::sandbox::Sandbox;

/// Interval between status lines
const REPORT_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("cellbot v{}", env!("CARGO_PKG_VERSION"));

    let bot_config = BotConfig::load_or_default();
    bot_config.validate()?;
    let sandbox_config = SandboxConfig::load_or_default();
    sandbox_config.validate(&bot_config)?;
    info!(
        "Configuration loaded: bucket_edge={}, do_not_pass={}, tick_rate={}Hz",
        bot_config.bucket_edge, bot_config.do_not_pass, sandbox_config.tick_rate
    );

    let metrics = Arc::new(BotMetrics::new());
    if sandbox_config.metrics_port != 0 {
        let metrics_clone = metrics.clone();
        let port = sandbox_config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = metrics::start_metrics_server(metrics_clone, port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let mut ticker = interval(sandbox_config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut sandbox = Sandbox::new(sandbox_config);
    let mut bot = Bot::new(bot_config);
    let mut keepalive = KeepAlive::new();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };
    tokio::pin!(shutdown);

    let mut last_tick = Instant::now();
    let mut last_report = last_tick;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Shutting down...");
                break;
            }
        }

        let now = Instant::now();
        let dt = now - last_tick;
        last_tick = now;

        let stats = sandbox.step(dt);
        if stats.own_cells_lost > 0 && !sandbox.is_alive() {
            info!("Eaten after {:.1}s", sandbox.elapsed().as_secs_f32());
        }
        if keepalive.update(now, &sandbox.world, &mut sandbox.controls) {
            metrics.respawn_attempts.fetch_add(1, Ordering::Relaxed);
        }

        let started = Instant::now();
        let report = bot.update(dt, &sandbox.world, &mut sandbox.controls)?;
        metrics.record_tick(report.as_ref(), started.elapsed());
        metrics
            .own_mass
            .store(sandbox.own_mass().max(0) as u64, Ordering::Relaxed);

        if now.duration_since(last_report) >= REPORT_INTERVAL {
            last_report = now;
            info!(
                "state={} mass={} splits={} p95={}us",
                bot.state(),
                sandbox.own_mass(),
                metrics.splits.load(Ordering::Relaxed),
                metrics.tick_time_p95_us.load(Ordering::Relaxed)
            );
        }
    }

    info!(
        "Bot stopped after {} ticks",
        metrics.ticks.load(Ordering::Relaxed)
    );
    Ok(())
}
