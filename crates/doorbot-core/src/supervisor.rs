use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::health::HealthReporter;
use crate::sequencer::UnlockSequencer;
use crate::types::ProcessContext;
use sound_player::Selector;

// ---------------------------------------------------------------------------
// ExitReason
// ---------------------------------------------------------------------------

/// Why the run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The consecutive poll-failure threshold was reached.
    TooManyErrors,
    /// An operator-requested shutdown interrupted the loop.
    Interrupted,
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// The top-level poll loop. Strictly sequential: an authorized request
/// runs the ceremony to completion before the next poll is issued, so at
/// most one ceremony is ever in flight.
pub struct Supervisor {
    api: ApiClient,
    sequencer: UnlockSequencer,
    health: HealthReporter,
    ctx: ProcessContext,
    poll_interval: Duration,
    housekeeping_cycles: u32,
    error_threshold: u32,
}

impl Supervisor {
    pub fn new(
        api: ApiClient,
        sequencer: UnlockSequencer,
        health: HealthReporter,
        config: &Config,
    ) -> Self {
        Self {
            api,
            sequencer,
            health,
            ctx: ProcessContext::new(),
            poll_interval: config.poll_interval,
            housekeeping_cycles: config.housekeeping_cycles,
            error_threshold: config.error_threshold,
        }
    }

    /// Poll until the consecutive-failure threshold is reached. External
    /// interrupts are handled above this loop; the caller runs
    /// [`Supervisor::safe_shutdown`] afterwards either way.
    pub async fn run(&mut self) -> ExitReason {
        self.housekeeping().await;

        let mut consecutive_errors: u32 = 0;
        let mut cycle_count: u32 = 0;

        loop {
            match self.api.poll().await {
                Err(e) => {
                    consecutive_errors += 1;
                    warn!(consecutive_errors, "poll failed: {e}");
                    if consecutive_errors >= self.error_threshold {
                        error!("too many consecutive poll failures; giving up");
                        return ExitReason::TooManyErrors;
                    }
                }
                Ok(status) => {
                    consecutive_errors = 0;
                    if status.letmein {
                        let selector = Selector::parse(&status.sound);
                        let hold = Duration::from_secs(status.hold_time);
                        if let Err(fault) = self
                            .sequencer
                            .execute(&selector, hold, &status.sender, &mut self.ctx)
                            .await
                        {
                            warn!("unlock ceremony aborted: {fault}");
                        }
                    }
                }
            }

            cycle_count += 1;
            if cycle_count >= self.housekeeping_cycles {
                self.housekeeping().await;
                cycle_count = 0;
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Sound-list sync plus health heartbeat. Both are best-effort and
    /// independent: a failure in one is logged and does not block the
    /// other. Runs once at startup and then every housekeeping cycle.
    async fn housekeeping(&mut self) {
        let sounds = self.sequencer.available_sounds();
        match self.api.sync_sounds(&sounds).await {
            Ok(()) => info!(count = sounds.len(), "synced sound list to server"),
            Err(e) => warn!("sound list sync failed: {e}"),
        }

        let snapshot = self.health.sample(&self.ctx);
        match self.api.push_heartbeat(&snapshot).await {
            Ok(()) => info!("heartbeat sent"),
            Err(e) => warn!("heartbeat failed: {e}"),
        }
    }

    /// The safe-shutdown path: restore the actuator to rest. Runs on every
    /// exit, including an interrupt that landed mid-ceremony.
    pub fn safe_shutdown(&mut self) {
        info!("shutting down; returning actuator to rest");
        self.sequencer.force_rest();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
