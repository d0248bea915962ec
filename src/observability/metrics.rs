use std::sync::Arc;

use prometheus::{Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

pub const LOOKUP_FAST: &str = "fast";
pub const LOOKUP_LOCKED: &str = "locked";
pub const LOOKUP_REFRESH: &str = "refresh";

pub const OUTCOME_SENT: &str = "sent";
pub const OUTCOME_PARTIAL: &str = "partial";

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token exchange metrics
    pub token_fetch_requests: IntCounter,
    pub token_fetch_failures: IntCounterVec,
    pub token_fetch_duration: Histogram,

    // Cache metrics
    pub token_lookups: IntCounterVec,
    pub token_expiry_unix: IntGauge,

    // Notice metrics
    pub notice_requests: IntCounterVec,
    pub notice_invalid_recipients: IntCounter,
    pub notice_send_duration: Histogram,

    // Config/runtime
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,

    // === Service resource metrics ===
    pub process_cpu_usage: Gauge,
    pub process_memory_usage: IntGauge,
    pub process_virtual_memory: IntGauge,
    pub process_open_fds: IntGauge,
    pub process_start_time: IntGauge,
    pub process_uptime: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("noticerelay".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token exchange
            token_fetch_requests: IntCounter::new("token_fetch_requests_total", "Total token exchange attempts").unwrap(),
            token_fetch_failures: IntCounterVec::new(Opts::new("token_fetch_failures_total", "Token exchange failures by reason"), &["reason"]).unwrap(),
            token_fetch_duration: Histogram::with_opts(HistogramOpts::new("token_fetch_duration_seconds", "Token exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])).unwrap(),

            // Cache
            token_lookups: IntCounterVec::new(Opts::new("token_lookups_total", "Token lookups by resolution path"), &["path"]).unwrap(),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Cached token expiry timestamp, safety margin applied").unwrap(),

            // Notice
            notice_requests: IntCounterVec::new(Opts::new("notice_requests_total", "Notice requests by outcome"), &["outcome"]).unwrap(),
            notice_invalid_recipients: IntCounter::new("notice_invalid_recipients_total", "Recipients rejected upstream").unwrap(),
            notice_send_duration: Histogram::with_opts(HistogramOpts::new("notice_send_duration_seconds", "Upstream send duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])).unwrap(),

            // Config/runtime
            config_parse_failures: IntCounter::new("config_parse_failures_total", "Config files that failed to parse").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),
            process_cpu_usage: Gauge::new("process_cpu_usage_percent", "CPU usage % of this process").unwrap(),
            process_memory_usage: IntGauge::new("process_memory_usage_bytes", "Resident memory used by this process").unwrap(),
            process_virtual_memory: IntGauge::new("process_virtual_memory_bytes", "Virtual memory used by this process").unwrap(),
            process_open_fds: IntGauge::new("process_open_fds", "Number of open file descriptors").unwrap(),
            process_start_time: IntGauge::new("process_start_time_seconds", "Process start time (UNIX seconds)").unwrap(),
            process_uptime: IntGauge::new("process_uptime_seconds", "Process uptime seconds").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.notice_requests.clone())).unwrap();
        reg.register(Box::new(metrics.notice_invalid_recipients.clone())).unwrap();
        reg.register(Box::new(metrics.notice_send_duration.clone())).unwrap();
        reg.register(Box::new(metrics.config_parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        reg.register(Box::new(metrics.process_cpu_usage.clone())).unwrap();
        reg.register(Box::new(metrics.process_memory_usage.clone())).unwrap();
        reg.register(Box::new(metrics.process_virtual_memory.clone())).unwrap();
        reg.register(Box::new(metrics.process_open_fds.clone())).unwrap();
        reg.register(Box::new(metrics.process_start_time.clone())).unwrap();
        reg.register(Box::new(metrics.process_uptime.clone())).unwrap();

        metrics
    }
}
