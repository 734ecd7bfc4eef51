use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in the wire/log format.
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// AuthorizationStatus
// ---------------------------------------------------------------------------

/// One poll response from the authorization server. Every field defaults so
/// an absent field degrades to false/empty/0; consumed immediately, never
/// retained.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizationStatus {
    #[serde(default)]
    pub letmein: bool,
    /// Requested sound: a clip name, `"none"` for sneaky mode, or empty to
    /// let the client pick.
    #[serde(default)]
    pub sound: String,
    /// Hold duration override in seconds; 0 means use the default.
    #[serde(default)]
    pub hold_time: u64,
    /// Label of whoever triggered the unlock.
    #[serde(default)]
    pub sender: String,
}

// ---------------------------------------------------------------------------
// UnlockEvent
// ---------------------------------------------------------------------------

/// Record of a completed unlock, pushed to the server log and appended to
/// the local backup file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockEvent {
    pub timestamp: String,
    pub epoch: i64,
    pub sound: String,
    pub sender: String,
}

impl UnlockEvent {
    pub fn new(sound: impl Into<String>, sender: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            epoch: now.timestamp(),
            sound: sound.into(),
            sender: sender.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// HealthSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time health report. Absent metrics serialize as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub last_unlock: Option<String>,
    pub cpu_temp_c: Option<f64>,
    pub memory_used_pct: Option<f64>,
}

// ---------------------------------------------------------------------------
// ProcessContext
// ---------------------------------------------------------------------------

/// Process-wide state for health reporting: when the process started and
/// when the door last unlocked. Owned by the supervisor; the event logger
/// is the only writer of the last-unlock marker.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    started_at: Instant,
    last_unlock: Option<DateTime<Local>>,
}

impl ProcessContext {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            last_unlock: None,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn record_unlock(&mut self) {
        self.last_unlock = Some(Local::now());
    }

    /// The last unlock time in the wire format, if any unlock happened.
    pub fn last_unlock(&self) -> Option<String> {
        self.last_unlock
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_status_defaults_for_absent_fields() {
        let status: AuthorizationStatus = serde_json::from_str("{}").unwrap();
        assert!(!status.letmein);
        assert_eq!(status.sound, "");
        assert_eq!(status.hold_time, 0);
        assert_eq!(status.sender, "");
    }

    #[test]
    fn authorization_status_full_payload() {
        let status: AuthorizationStatus = serde_json::from_str(
            r#"{"letmein": true, "sound": "chime.wav", "hold_time": 15, "sender": "alice"}"#,
        )
        .unwrap();
        assert!(status.letmein);
        assert_eq!(status.sound, "chime.wav");
        assert_eq!(status.hold_time, 15);
        assert_eq!(status.sender, "alice");
    }

    #[test]
    fn unlock_event_wire_shape() {
        let event = UnlockEvent::new("chime.wav", "alice");
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("timestamp").is_some());
        assert!(value.get("epoch").unwrap().as_i64().unwrap() > 0);
        assert_eq!(value.get("sound").unwrap(), "chime.wav");
        assert_eq!(value.get("sender").unwrap(), "alice");
    }

    #[test]
    fn health_snapshot_absent_metrics_are_null() {
        let snapshot = HealthSnapshot {
            timestamp: timestamp_now(),
            uptime_seconds: 42,
            last_unlock: None,
            cpu_temp_c: None,
            memory_used_pct: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("last_unlock").unwrap().is_null());
        assert!(value.get("cpu_temp_c").unwrap().is_null());
        assert!(value.get("memory_used_pct").unwrap().is_null());
    }

    #[test]
    fn process_context_tracks_last_unlock() {
        let mut ctx = ProcessContext::new();
        assert!(ctx.last_unlock().is_none());
        ctx.record_unlock();
        assert!(ctx.last_unlock().is_some());
    }
}
