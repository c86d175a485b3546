//! System resource snapshot shown on the status dashboard.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub percent: f64,
}

/// Process uptime broken into display units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Uptime {
    pub fn from_secs(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

impl std::fmt::Display for Uptime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu_percent: f64,
    pub memory: MemoryUsage,
    pub disk: DiskUsage,
    pub uptime: Uptime,
    /// Local time formatted as `%Y-%m-%d %H:%M:%S`.
    pub current_time: String,
}

/// Share of `used` in `total`, as a percentage.
pub(crate) fn percent_of(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64) * 100.0
    }
}

impl MemoryUsage {
    pub fn new(total: u64, used: u64) -> Self {
        Self {
            total,
            used,
            percent: percent_of(used, total),
        }
    }
}

impl DiskUsage {
    pub fn new(total: u64, used: u64) -> Self {
        Self {
            total,
            used,
            percent: percent_of(used, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_splits_into_units() {
        let uptime = Uptime::from_secs(2 * 86_400 + 3 * 3600 + 4 * 60 + 5);
        assert_eq!(
            uptime,
            Uptime {
                days: 2,
                hours: 3,
                minutes: 4,
                seconds: 5
            }
        );
        assert_eq!(uptime.to_string(), "2d 03h 04m 05s");
    }

    #[test]
    fn usage_percent_handles_empty_totals() {
        assert_eq!(MemoryUsage::new(0, 0).percent, 0.0);
        assert_eq!(DiskUsage::new(200, 50).percent, 25.0);
    }
}
