use crate::helpers::time::now_i64;
use crate::observability::metrics::get_metrics;
use anyhow::{anyhow, Result};
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::time::sleep;
use tracing::debug;

const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Sample this process' resource usage into the metrics registry forever.
/// Returns immediately when metrics are disabled.
pub async fn collect_process_metrics(is_metrics_enabled: bool) -> Result<()> {
    if !is_metrics_enabled {
        return Ok(());
    }
    let metrics = get_metrics().await;
    let mut sys = System::new();
    let pid = sysinfo::get_current_pid().map_err(|e| anyhow!("cannot resolve own pid: {}", e))?;

    let start_time_unix = now_i64();
    metrics.process_start_time.set(start_time_unix);
    debug!(pid = pid.as_u32(), "process metrics collection started");

    loop {
        // Refresh just our process
        let pids = [pid];
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&pids),
            false,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        if let Some(proc) = sys.process(pid) {
            metrics.process_cpu_usage.set(proc.cpu_usage().into());
            metrics.process_memory_usage.set(proc.memory() as i64);
            metrics.process_virtual_memory.set(proc.virtual_memory() as i64);

            #[cfg(target_family = "unix")]
            {
                if let Ok(entries) = std::fs::read_dir(format!("/proc/{}/fd", pid.as_u32())) {
                    metrics.process_open_fds.set(entries.count() as i64);
                }
            }
        }
        metrics.process_uptime.set(now_i64() - start_time_unix);

        sleep(SAMPLE_INTERVAL).await;
    }
}
