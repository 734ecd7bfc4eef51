use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::{DoorbotError, Result};
use crate::types::{ProcessContext, UnlockEvent};

/// The local backup keeps only the most recent entries; the server log is
/// the real record.
pub const LOCAL_LOG_CAP: usize = 100;

// ---------------------------------------------------------------------------
// LocalEventLog
// ---------------------------------------------------------------------------

/// Bounded local backup of unlock events: a JSON array, oldest first,
/// rewritten in full (atomically) on each append.
#[derive(Debug, Clone)]
pub struct LocalEventLog {
    path: PathBuf,
}

impl LocalEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one event, evicting the oldest entries beyond the cap.
    pub fn append(&self, event: &UnlockEvent) -> Result<()> {
        let mut entries = self.entries();
        entries.push(event.clone());
        if entries.len() > LOCAL_LOG_CAP {
            entries.drain(..entries.len() - LOCAL_LOG_CAP);
        }
        let data = serde_json::to_vec_pretty(&entries)?;
        atomic_write(&self.path, &data)
    }

    /// Current entries, oldest first. A missing or corrupt file starts a
    /// fresh array — this log is best-effort backup, not a source of truth.
    pub fn entries(&self) -> Vec<UnlockEvent> {
        let Ok(data) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "local log unreadable, starting fresh: {e}");
            Vec::new()
        })
    }
}

/// Write via a tempfile in the same directory so a crash mid-write never
/// leaves a truncated log behind.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| DoorbotError::Io(e.error))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// EventLogger
// ---------------------------------------------------------------------------

/// Fans one unlock event out to the server log and the local backup.
/// The sinks are independently fault-tolerant: a failure in either is
/// logged and does not affect the other.
pub struct EventLogger {
    api: ApiClient,
    local: LocalEventLog,
}

impl EventLogger {
    pub fn new(api: ApiClient, local: LocalEventLog) -> Self {
        Self { api, local }
    }

    /// Record a completed unlock. Updates the process-wide last-unlock
    /// marker first so the next heartbeat reflects it even if both sinks
    /// fail.
    pub async fn record(&self, event: UnlockEvent, ctx: &mut ProcessContext) {
        ctx.record_unlock();

        match self.api.push_event(&event).await {
            Ok(()) => info!("unlock event logged to server"),
            Err(e) => warn!("failed to log unlock to server: {e}"),
        }

        if let Err(e) = self.local.append(&event) {
            warn!("failed to write local log: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn event(n: usize) -> UnlockEvent {
        UnlockEvent {
            timestamp: format!("2026-08-05 12:00:{n:02}"),
            epoch: 1_700_000_000 + n as i64,
            sound: "chime.wav".into(),
            sender: format!("sender-{n}"),
        }
    }

    #[test]
    fn append_creates_and_grows_the_log() {
        let dir = TempDir::new().unwrap();
        let log = LocalEventLog::new(dir.path().join("unlock_log.json"));
        log.append(&event(1)).unwrap();
        log.append(&event(2)).unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sender, "sender-1");
        assert_eq!(entries[1].sender, "sender-2");
    }

    #[test]
    fn cap_evicts_oldest_and_preserves_order() {
        let dir = TempDir::new().unwrap();
        let log = LocalEventLog::new(dir.path().join("unlock_log.json"));
        for n in 0..LOCAL_LOG_CAP + 1 {
            log.append(&event(n)).unwrap();
        }

        let entries = log.entries();
        assert_eq!(entries.len(), LOCAL_LOG_CAP);
        // Entry 0 was evicted; the rest are still oldest -> newest.
        assert_eq!(entries[0].sender, "sender-1");
        assert_eq!(entries[LOCAL_LOG_CAP - 1].sender, format!("sender-{LOCAL_LOG_CAP}"));
    }

    #[test]
    fn corrupt_log_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unlock_log.json");
        std::fs::write(&path, "not json").unwrap();

        let log = LocalEventLog::new(&path);
        assert!(log.entries().is_empty());
        log.append(&event(1)).unwrap();
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn log_file_is_valid_json_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unlock_log.json");
        let log = LocalEventLog::new(&path);
        log.append(&event(1)).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
    }

    #[tokio::test]
    async fn record_reaches_server_and_local_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/log")
            .with_status(200)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let logger = EventLogger::new(
            ApiClient::new(server.url(), "").unwrap(),
            LocalEventLog::new(dir.path().join("unlock_log.json")),
        );

        let mut ctx = ProcessContext::new();
        logger.record(event(1), &mut ctx).await;

        mock.assert_async().await;
        assert!(ctx.last_unlock().is_some());
        assert_eq!(logger.local.entries().len(), 1);
    }

    #[tokio::test]
    async fn record_writes_locally_even_when_server_is_down() {
        let dir = TempDir::new().unwrap();
        let logger = EventLogger::new(
            ApiClient::new("http://127.0.0.1:9", "").unwrap(),
            LocalEventLog::new(dir.path().join("unlock_log.json")),
        );

        let mut ctx = ProcessContext::new();
        logger.record(event(1), &mut ctx).await;
        assert_eq!(logger.local.entries().len(), 1);
    }
}
