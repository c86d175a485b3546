//! Host resource sampling with `sysinfo`.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Instant;

use chrono::{DateTime, Local};
use dispatch_core::{DiskUsage, MemoryUsage, SystemStats, Uptime};
use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, System};

static PROCESS_START: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Pin the uptime origin. Called once during initialization.
pub fn mark_start() {
    let _ = LazyLock::force(&PROCESS_START);
}

/// Sample the host. Blocks for one CPU measurement interval.
pub fn collect_stats() -> SystemStats {
    let mut system = System::new();
    system.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu_usage();
    system.refresh_memory();

    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first())
        .map(|d| (d.total_space(), d.total_space().saturating_sub(d.available_space())));

    build_stats(
        system.global_cpu_usage(),
        (system.total_memory(), system.used_memory()),
        disk,
        PROCESS_START.elapsed().as_secs(),
        Local::now(),
    )
}

fn build_stats(
    cpu_percent: f32,
    (memory_total, memory_used): (u64, u64),
    disk: Option<(u64, u64)>,
    uptime_secs: u64,
    now: DateTime<Local>,
) -> SystemStats {
    let disk = disk
        .map(|(total, used)| DiskUsage::new(total, used))
        .unwrap_or_default();

    SystemStats {
        cpu_percent: f64::from(cpu_percent),
        memory: MemoryUsage::new(memory_total, memory_used),
        disk,
        uptime: Uptime::from_secs(uptime_secs),
        current_time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn stats_are_assembled_from_samples() {
        let now = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let stats = build_stats(12.5, (1000, 250), Some((400, 100)), 90_061, now);

        assert_eq!(stats.cpu_percent, 12.5);
        assert_eq!(stats.memory.percent, 25.0);
        assert_eq!(stats.disk.percent, 25.0);
        assert_eq!(stats.uptime.to_string(), "1d 01h 01m 01s");
        assert_eq!(stats.current_time, "2026-03-04 05:06:07");
    }

    #[test]
    fn missing_disk_reports_zero() {
        let stats = build_stats(0.0, (0, 0), None, 0, Local::now());
        assert_eq!(stats.disk, DiskUsage::default());
        assert_eq!(stats.memory.percent, 0.0);
    }
}
