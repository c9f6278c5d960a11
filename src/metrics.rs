//! Prometheus-compatible metrics endpoint
//!
//! Exposes bot decision and timing metrics in Prometheus format.
//! Default endpoint: http://localhost:9090/metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::game::systems::ai::{BotState, TickReport};

/// Rolling window used for tick-time percentiles
const TICK_HISTORY: usize = 1000;

/// Metrics registry for the bot
#[derive(Debug)]
pub struct BotMetrics {
    pub ticks: AtomicU64,
    /// Ticks skipped because no owned cell was alive
    pub skipped_ticks: AtomicU64,
    decisions: [AtomicU64; 4],
    pub splits: AtomicU64,
    pub path_fallbacks: AtomicU64,
    pub respawn_attempts: AtomicU64,
    pub own_mass: AtomicU64,

    // Tick timing (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_p95_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,

    start_time: Instant,
    tick_history: RwLock<VecDeque<u64>>,
}

#[derive(Debug, Serialize)]
struct TickTiming {
    last_us: u64,
    p95_us: u64,
    max_us: u64,
}

#[derive(Debug, Serialize)]
struct MetricsSnapshot {
    ticks: u64,
    skipped_ticks: u64,
    decisions: hashbrown::HashMap<&'static str, u64>,
    splits: u64,
    path_fallbacks: u64,
    respawn_attempts: u64,
    own_mass: u64,
    tick_time: TickTiming,
    uptime_seconds: u64,
}

impl BotMetrics {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            skipped_ticks: AtomicU64::new(0),
            decisions: Default::default(),
            splits: AtomicU64::new(0),
            path_fallbacks: AtomicU64::new(0),
            respawn_attempts: AtomicU64::new(0),
            own_mass: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_p95_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            start_time: Instant::now(),
            tick_history: RwLock::new(VecDeque::with_capacity(TICK_HISTORY)),
        }
    }

    /// Record the outcome of one `Bot::update` call
    pub fn record_tick(&self, report: Option<&TickReport>, duration: Duration) {
        self.record_tick_time(duration);

        let Some(report) = report else {
            self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
            return;
        };
        self.decisions[state_index(report.state)].fetch_add(1, Ordering::Relaxed);
        if report.split {
            self.splits.fetch_add(1, Ordering::Relaxed);
        }
        if report.path_fallback {
            self.path_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a tick time and update percentiles
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let mut history = self.tick_history.write();
        history.push_back(us);
        while history.len() > TICK_HISTORY {
            history.pop_front();
        }

        if history.len() >= 10 {
            let mut sorted: Vec<u64> = history.iter().copied().collect();
            sorted.sort_unstable();

            let p95_idx = (sorted.len() as f32 * 0.95) as usize;
            self.tick_time_p95_us
                .store(sorted[p95_idx.min(sorted.len() - 1)], Ordering::Relaxed);
            self.tick_time_max_us
                .store(sorted.last().copied().unwrap_or(0), Ordering::Relaxed);
        }
    }

    pub fn decisions(&self, state: BotState) -> u64 {
        self.decisions[state_index(state)].load(Ordering::Relaxed)
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Generate Prometheus-format metrics output
    pub fn to_prometheus(&self) -> String {
        let mut output = String::with_capacity(2048);

        macro_rules! metric {
            ($name:expr, $help:expr, $type:expr, $value:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $name, $help, $name, $type, $name, $value
                ));
            };
        }

        metric!("cellbot_ticks_total", "Total ticks processed", "counter",
            self.ticks.load(Ordering::Relaxed));
        metric!("cellbot_ticks_skipped_total", "Ticks skipped with no owned cells", "counter",
            self.skipped_ticks.load(Ordering::Relaxed));
        metric!("cellbot_splits_total", "Split commands issued", "counter",
            self.splits.load(Ordering::Relaxed));
        metric!("cellbot_path_fallbacks_total", "Moves that fell back to a straight line", "counter",
            self.path_fallbacks.load(Ordering::Relaxed));
        metric!("cellbot_respawn_attempts_total", "Spawn requests sent", "counter",
            self.respawn_attempts.load(Ordering::Relaxed));
        metric!("cellbot_own_mass", "Summed size of all owned cells", "gauge",
            self.own_mass.load(Ordering::Relaxed));

        metric!("cellbot_tick_time_microseconds", "Last tick time in microseconds", "gauge",
            self.tick_time_us.load(Ordering::Relaxed));
        metric!("cellbot_tick_time_p95_microseconds", "95th percentile tick time", "gauge",
            self.tick_time_p95_us.load(Ordering::Relaxed));
        metric!("cellbot_tick_time_max_microseconds", "Maximum tick time", "gauge",
            self.tick_time_max_us.load(Ordering::Relaxed));
        metric!("cellbot_uptime_seconds", "Process uptime in seconds", "counter",
            self.uptime_seconds());

        #[cfg(feature = "metrics_extended")]
        {
            output.push_str(
                "# HELP cellbot_decisions_total Ticks ending in each behaviour state\n# TYPE cellbot_decisions_total counter\n",
            );
            for state in BotState::ALL {
                output.push_str(&format!(
                    "cellbot_decisions_total{{state=\"{}\"}} {}\n",
                    state,
                    self.decisions(state)
                ));
            }
        }

        output
    }

    /// Generate JSON format metrics
    pub fn to_json(&self) -> String {
        let snapshot = MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            decisions: BotState::ALL
                .iter()
                .map(|&s| (s.as_str(), self.decisions(s)))
                .collect(),
            splits: self.splits.load(Ordering::Relaxed),
            path_fallbacks: self.path_fallbacks.load(Ordering::Relaxed),
            respawn_attempts: self.respawn_attempts.load(Ordering::Relaxed),
            own_mass: self.own_mass.load(Ordering::Relaxed),
            tick_time: TickTiming {
                last_us: self.tick_time_us.load(Ordering::Relaxed),
                p95_us: self.tick_time_p95_us.load(Ordering::Relaxed),
                max_us: self.tick_time_max_us.load(Ordering::Relaxed),
            },
            uptime_seconds: self.uptime_seconds(),
        };
        serde_json::to_string_pretty(&snapshot)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Default for BotMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn state_index(state: BotState) -> usize {
    match state {
        BotState::Fleeing => 0,
        BotState::Hunting => 1,
        BotState::Feeding => 2,
        BotState::Idle => 3,
    }
}

fn http_response(content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}

/// Start the metrics HTTP server
pub async fn start_metrics_server(metrics: Arc<BotMetrics>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Metrics server listening on http://{}/metrics", addr);
    serve(listener, metrics).await
}

/// Answer metrics requests on an already bound listener
pub async fn serve(listener: TcpListener, metrics: Arc<BotMetrics>) -> anyhow::Result<()> {
    loop {
        let (mut socket, peer) = listener.accept().await?;
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);

                    let response = if request.starts_with("GET /metrics/json") {
                        http_response("application/json", &metrics.to_json())
                    } else if request.starts_with("GET /metrics") {
                        http_response("text/plain; version=0.0.4", &metrics.to_prometheus())
                    } else if request.starts_with("GET /health") {
                        http_response("text/plain", "OK")
                    } else {
                        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_string()
                    };

                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write metrics response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from metrics socket {}: {}", peer, e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::vec2::Vec2;
    use tokio::net::TcpStream;

    fn report(state: BotState, split: bool, path_fallback: bool) -> TickReport {
        TickReport {
            state,
            target: Vec2::ZERO,
            split,
            path_fallback,
        }
    }

    async fn get(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path).as_bytes())
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_metrics_new() {
        let metrics = BotMetrics::new();
        assert_eq!(metrics.ticks.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.decisions(BotState::Idle), 0);
    }

    #[test]
    fn test_record_tick() {
        let metrics = BotMetrics::new();
        metrics.record_tick(Some(&report(BotState::Hunting, true, false)), Duration::from_micros(120));
        metrics.record_tick(Some(&report(BotState::Feeding, false, true)), Duration::from_micros(90));
        metrics.record_tick(None, Duration::from_micros(5));

        assert_eq!(metrics.ticks.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.skipped_ticks.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.decisions(BotState::Hunting), 1);
        assert_eq!(metrics.decisions(BotState::Feeding), 1);
        assert_eq!(metrics.splits.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.path_fallbacks.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_tick_time() {
        let metrics = BotMetrics::new();
        for i in 0..100 {
            metrics.record_tick_time(Duration::from_micros(100 + i * 10));
        }

        assert_eq!(metrics.ticks.load(Ordering::Relaxed), 100);
        assert_eq!(metrics.tick_time_max_us.load(Ordering::Relaxed), 1090);
        assert!(metrics.tick_time_p95_us.load(Ordering::Relaxed) >= 1040);
    }

    #[test]
    fn test_tick_history_is_bounded() {
        let metrics = BotMetrics::new();
        metrics.record_tick_time(Duration::from_millis(50));
        for _ in 0..TICK_HISTORY {
            metrics.record_tick_time(Duration::from_micros(10));
        }
        // The 50ms outlier has rolled out of the window
        assert_eq!(metrics.tick_time_max_us.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = BotMetrics::new();
        metrics.splits.store(7, Ordering::Relaxed);
        metrics.own_mass.store(250, Ordering::Relaxed);

        let output = metrics.to_prometheus();
        assert!(output.contains("cellbot_splits_total 7"));
        assert!(output.contains("cellbot_own_mass 250"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[cfg(feature = "metrics_extended")]
    #[test]
    fn test_prometheus_decision_breakdown() {
        let metrics = BotMetrics::new();
        metrics.record_tick(Some(&report(BotState::Fleeing, false, false)), Duration::ZERO);
        let output = metrics.to_prometheus();
        assert!(output.contains("cellbot_decisions_total{state=\"fleeing\"} 1"));
        assert!(output.contains("cellbot_decisions_total{state=\"idle\"} 0"));
    }

    #[test]
    fn test_json_format() {
        let metrics = BotMetrics::new();
        metrics.record_tick(Some(&report(BotState::Idle, false, false)), Duration::from_micros(40));

        let value: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(value["ticks"], 1);
        assert_eq!(value["decisions"]["idle"], 1);
        assert_eq!(value["decisions"]["fleeing"], 0);
        assert_eq!(value["tick_time"]["last_us"], 40);
    }

    #[tokio::test]
    async fn test_serves_endpoints() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let metrics = Arc::new(BotMetrics::new());
        metrics.splits.store(3, Ordering::Relaxed);
        tokio::spawn(serve(listener, metrics));

        let prometheus = get(addr, "/metrics").await;
        assert!(prometheus.starts_with("HTTP/1.1 200 OK"));
        assert!(prometheus.contains("cellbot_splits_total 3"));

        let json = get(addr, "/metrics/json").await;
        assert!(json.contains("application/json"));
        assert!(json.contains("\"splits\": 3"));

        assert!(get(addr, "/health").await.ends_with("OK"));
        assert!(get(addr, "/nope").await.starts_with("HTTP/1.1 404"));
    }

    #[tokio::test]
    async fn test_uptime() {
        let metrics = BotMetrics::new();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(metrics.uptime_seconds() < 60);
    }
}
