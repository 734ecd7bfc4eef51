use crate::error::{DoorbotError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Ceremony calibration constants
// ---------------------------------------------------------------------------

/// Relay settle time before the motor starts.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Cadence of limit-switch reads while driving forward.
pub const SWITCH_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Software PWM frequency for the motor driver.
pub const PWM_FREQUENCY_HZ: f64 = 500.0;
/// Motor duty cycle, percent.
pub const MOTOR_DUTY_CYCLE: f64 = 50.0;
/// Quoted in the sound-cutoff log line. The actual cutoff trigger is the
/// end of the hold period, not an independent timer.
pub const MAX_SOUND_DURATION_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// CeremonyTimings
// ---------------------------------------------------------------------------

/// Timing parameters for one unlock ceremony. Explicit values rather than
/// inline sleeps so the sequencer is testable against a simulated rig.
#[derive(Debug, Clone)]
pub struct CeremonyTimings {
    pub settle: Duration,
    pub switch_poll_interval: Duration,
    /// Bound on the forward drive; on expiry the ceremony continues as if
    /// unlocked (fail-open).
    pub switch_timeout: Duration,
    pub default_hold: Duration,
    /// Fixed reverse drive duration; calibrated, not switch-gated.
    pub reverse: Duration,
    pub duty_cycle: f64,
}

impl Default for CeremonyTimings {
    fn default() -> Self {
        Self {
            settle: SETTLE_DELAY,
            switch_poll_interval: SWITCH_POLL_INTERVAL,
            switch_timeout: Duration::from_secs(30),
            default_hold: Duration::from_secs(10),
            reverse: Duration::from_millis(6500),
            duty_cycle: MOTOR_DUTY_CYCLE,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Runtime configuration, read from `DOORBOT_*` environment variables with
/// compiled defaults. The API key being absent is tolerated (an empty
/// bearer token is sent); unparseable numeric values are startup errors.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub api_key: String,
    pub sounds_dir: PathBuf,
    pub log_file: PathBuf,
    pub alsa_device: String,
    pub poll_interval: Duration,
    /// Poll cycles between housekeeping passes (sound sync + heartbeat).
    pub housekeeping_cycles: u32,
    /// Consecutive poll failures that terminate the process.
    pub error_threshold: u32,
    pub timings: CeremonyTimings,
    /// Use the simulated rig instead of GPIO hardware.
    pub simulate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://yakko.cs.wmich.edu:8878".into(),
            api_key: String::new(),
            sounds_dir: "sounds".into(),
            log_file: "unlock_log.json".into(),
            alsa_device: "hw:0,0".into(),
            poll_interval: Duration::from_secs(1),
            housekeeping_cycles: 60,
            error_threshold: 10,
            timings: CeremonyTimings::default(),
            simulate: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Tests pass a map
    /// here instead of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(v) = lookup("DOORBOT_SERVER_URL") {
            config.server_url = v;
        }
        if let Some(v) = lookup("DOORBOT_API_KEY") {
            config.api_key = v;
        }
        if let Some(v) = lookup("DOORBOT_SOUNDS_DIR") {
            config.sounds_dir = v.into();
        }
        if let Some(v) = lookup("DOORBOT_LOG_FILE") {
            config.log_file = v.into();
        }
        if let Some(v) = lookup("DOORBOT_ALSA_DEVICE") {
            config.alsa_device = v;
        }
        if let Some(v) = lookup("DOORBOT_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse("DOORBOT_POLL_INTERVAL_MS", &v)?);
        }
        if let Some(v) = lookup("DOORBOT_HOLD_SECS") {
            config.timings.default_hold = Duration::from_secs(parse("DOORBOT_HOLD_SECS", &v)?);
        }
        if let Some(v) = lookup("DOORBOT_SWITCH_TIMEOUT_SECS") {
            config.timings.switch_timeout =
                Duration::from_secs(parse("DOORBOT_SWITCH_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("DOORBOT_REVERSE_SECS") {
            let secs: f64 = parse("DOORBOT_REVERSE_SECS", &v)?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(DoorbotError::Config {
                    key: "DOORBOT_REVERSE_SECS",
                    value: v,
                });
            }
            config.timings.reverse = Duration::from_secs_f64(secs);
        }
        config.simulate = lookup("DOORBOT_SIMULATE").is_some_and(|v| !v.is_empty());

        Ok(config)
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T> {
    value.parse().map_err(|_| DoorbotError::Config {
        key,
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_url, "http://yakko.cs.wmich.edu:8878");
        assert_eq!(config.api_key, "");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.housekeeping_cycles, 60);
        assert_eq!(config.error_threshold, 10);
        assert_eq!(config.timings.switch_timeout, Duration::from_secs(30));
        assert_eq!(config.timings.default_hold, Duration::from_secs(10));
        assert_eq!(config.timings.reverse, Duration::from_millis(6500));
        assert!(!config.simulate);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("DOORBOT_SERVER_URL", "http://localhost:8878"),
            ("DOORBOT_API_KEY", "secret"),
            ("DOORBOT_POLL_INTERVAL_MS", "250"),
            ("DOORBOT_HOLD_SECS", "15"),
            ("DOORBOT_SWITCH_TIMEOUT_SECS", "10"),
            ("DOORBOT_REVERSE_SECS", "3.5"),
            ("DOORBOT_SIMULATE", "1"),
        ])
        .unwrap();
        assert_eq!(config.server_url, "http://localhost:8878");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.timings.default_hold, Duration::from_secs(15));
        assert_eq!(config.timings.switch_timeout, Duration::from_secs(10));
        assert_eq!(config.timings.reverse, Duration::from_secs_f64(3.5));
        assert!(config.simulate);
    }

    #[test]
    fn invalid_numeric_is_a_config_error() {
        let err = config_from(&[("DOORBOT_POLL_INTERVAL_MS", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            DoorbotError::Config {
                key: "DOORBOT_POLL_INTERVAL_MS",
                ..
            }
        ));
    }

    #[test]
    fn negative_reverse_duration_is_rejected() {
        let err = config_from(&[("DOORBOT_REVERSE_SECS", "-1")]).unwrap_err();
        assert!(matches!(err, DoorbotError::Config { .. }));
    }

    #[test]
    fn empty_simulate_value_means_disabled() {
        let config = config_from(&[("DOORBOT_SIMULATE", "")]).unwrap();
        assert!(!config.simulate);
    }
}
