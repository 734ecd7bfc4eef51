use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::config::{CeremonyTimings, MAX_SOUND_DURATION_SECS};
use crate::error::{DoorbotError, Result};
use crate::event_log::EventLogger;
use crate::hardware::{ActuatorRig, ActuatorState, MotorDirection};
use crate::sound::{CueHandle, CuePlayer};
use crate::types::{ProcessContext, UnlockEvent};
use sound_player::Selector;

// ---------------------------------------------------------------------------
// FaultReport
// ---------------------------------------------------------------------------

/// A ceremony that aborted partway through. The rig is already back at
/// rest and no unlock event was recorded.
#[derive(Debug, Error)]
#[error("ceremony fault while {stage}: {source}")]
pub struct FaultReport {
    pub stage: ActuatorState,
    #[source]
    pub source: DoorbotError,
}

// ---------------------------------------------------------------------------
// UnlockSequencer
// ---------------------------------------------------------------------------

/// Drives one full unlock ceremony at a time: relay energize, forward
/// drive gated by the limit switch, sound cue, event log, hold, sound
/// cutoff, fixed-duration reverse, relay off. Not re-entrant; the poll
/// loop never starts a second ceremony before the first returns to
/// [`ActuatorState::Idle`].
pub struct UnlockSequencer {
    rig: Box<dyn ActuatorRig>,
    player: Box<dyn CuePlayer>,
    events: EventLogger,
    timings: CeremonyTimings,
    state: ActuatorState,
}

impl UnlockSequencer {
    pub fn new(
        rig: Box<dyn ActuatorRig>,
        player: Box<dyn CuePlayer>,
        events: EventLogger,
        timings: CeremonyTimings,
    ) -> Self {
        Self {
            rig,
            player,
            events,
            timings,
            state: ActuatorState::Idle,
        }
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Clip names the audio backend can play, for the sound-list sync.
    pub fn available_sounds(&self) -> Vec<String> {
        self.player.available()
    }

    /// Force the rig to its safe rest state. The shutdown path calls this
    /// unconditionally, whatever the loop was doing when it stopped.
    pub fn force_rest(&mut self) {
        self.rig.force_rest();
    }

    /// Execute one unlock ceremony. `hold_override` of zero means the
    /// default hold duration.
    ///
    /// Any rig or playback failure is caught here, once: the cue is
    /// cancelled if running, the rig is forced back to rest, and the
    /// ceremony reports the stage it died in. Every exit path leaves the
    /// relay de-energized and the motor stopped.
    pub async fn execute(
        &mut self,
        selector: &Selector,
        hold_override: Duration,
        sender: &str,
        ctx: &mut ProcessContext,
    ) -> std::result::Result<(), FaultReport> {
        info!(sender = %sender, "unlocking door");

        let mut cue: Option<Box<dyn CueHandle>> = None;
        match self.ceremony(selector, hold_override, sender, ctx, &mut cue).await {
            Ok(()) => {
                self.state = ActuatorState::Idle;
                info!("ceremony complete");
                Ok(())
            }
            Err(source) => {
                let stage = self.state;
                self.state = ActuatorState::Fault;
                error!(stage = %stage, "ceremony fault: {source}");
                if let Some(mut cue) = cue.take() {
                    if cue.is_running() {
                        cue.cancel();
                    }
                }
                self.rig.force_rest();
                self.state = ActuatorState::Idle;
                Err(FaultReport { stage, source })
            }
        }
    }

    async fn ceremony(
        &mut self,
        selector: &Selector,
        hold_override: Duration,
        sender: &str,
        ctx: &mut ProcessContext,
        cue: &mut Option<Box<dyn CueHandle>>,
    ) -> Result<()> {
        self.state = ActuatorState::Energizing;
        info!("activating relay");
        self.rig.set_relay(true)?;
        sleep(self.timings.settle).await;

        self.state = ActuatorState::DrivingForward;
        info!("starting motor (unlock)");
        self.rig.set_direction(MotorDirection::Unlock)?;
        self.rig.motor_start(self.timings.duty_cycle)?;
        self.drive_until_switch().await?;
        self.rig.motor_stop()?;
        info!("unlocked");

        // The cue plays in the background while the door holds.
        *cue = self.player.start(selector)?;

        // The server's last-unlock state must reflect this event before
        // the door re-locks, so the event goes out before the hold.
        let event = UnlockEvent::new(selector.event_label(), sender);
        self.events.record(event, ctx).await;

        self.state = ActuatorState::Holding;
        let hold = if hold_override.is_zero() {
            self.timings.default_hold
        } else {
            hold_override
        };
        info!(hold_secs = hold.as_secs_f64(), "holding door open");
        sleep(hold).await;

        // Cutoff fires iff the cue outlived the hold; there is no separate
        // sound-duration timer.
        if let Some(cue) = cue.as_mut() {
            if cue.is_running() {
                cue.cancel();
                info!("sound stopped (max {MAX_SOUND_DURATION_SECS}s)");
            }
        }

        self.state = ActuatorState::DrivingReverse;
        info!(
            reverse_secs = self.timings.reverse.as_secs_f64(),
            "reversing motor"
        );
        self.rig.set_direction(MotorDirection::Lock)?;
        self.rig.motor_start(self.timings.duty_cycle)?;
        sleep(self.timings.reverse).await;
        self.rig.motor_stop()?;

        info!("relay off");
        self.rig.set_relay(false)?;
        Ok(())
    }

    /// Poll the limit switch until it reports pressed or the timeout
    /// elapses. Timing out is not an error: the ceremony continues as if
    /// unlocked, preferring an openable door over strict correctness.
    async fn drive_until_switch(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.timings.switch_timeout;
        loop {
            if self.rig.limit_switch_pressed()? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(
                    timeout_secs = self.timings.switch_timeout.as_secs_f64(),
                    "limit switch never triggered; continuing as if unlocked"
                );
                return Ok(());
            }
            sleep(self.timings.switch_poll_interval).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
