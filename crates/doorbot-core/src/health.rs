use std::path::PathBuf;

use crate::types::{timestamp_now, HealthSnapshot, ProcessContext};

pub const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";
pub const MEMINFO_PATH: &str = "/proc/meminfo";

/// Samples process and system health for the periodic heartbeat. Metric
/// sources are constructor parameters so tests can feed fixture files; an
/// unreadable source yields `None` for that metric, never an error.
#[derive(Debug, Clone)]
pub struct HealthReporter {
    thermal_path: PathBuf,
    meminfo_path: PathBuf,
}

impl HealthReporter {
    pub fn new() -> Self {
        Self::with_sources(THERMAL_ZONE_PATH, MEMINFO_PATH)
    }

    pub fn with_sources(thermal: impl Into<PathBuf>, meminfo: impl Into<PathBuf>) -> Self {
        Self {
            thermal_path: thermal.into(),
            meminfo_path: meminfo.into(),
        }
    }

    pub fn sample(&self, ctx: &ProcessContext) -> HealthSnapshot {
        HealthSnapshot {
            timestamp: timestamp_now(),
            uptime_seconds: ctx.uptime_seconds(),
            last_unlock: ctx.last_unlock(),
            cpu_temp_c: self.cpu_temp(),
            memory_used_pct: self.memory_used_pct(),
        }
    }

    /// Thermal zone files report millidegrees Celsius.
    fn cpu_temp(&self) -> Option<f64> {
        let raw = std::fs::read_to_string(&self.thermal_path).ok()?;
        let millidegrees: f64 = raw.trim().parse().ok()?;
        Some(round1(millidegrees / 1000.0))
    }

    fn memory_used_pct(&self) -> Option<f64> {
        let raw = std::fs::read_to_string(&self.meminfo_path).ok()?;
        let mut total = None;
        let mut available = None;
        for line in raw.lines() {
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("MemTotal:") => total = parts.next().and_then(|v| v.parse::<f64>().ok()),
                Some("MemAvailable:") => {
                    available = parts.next().and_then(|v| v.parse::<f64>().ok())
                }
                _ => {}
            }
        }
        let (total, available) = (total?, available?);
        if total <= 0.0 {
            return None;
        }
        Some(round1(100.0 * (1.0 - available / total)))
    }
}

impl Default for HealthReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
