use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::error::{DoorbotError, Result};

// ---------------------------------------------------------------------------
// MotorDirection / ActuatorState
// ---------------------------------------------------------------------------

/// Polarity of the direction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorDirection {
    Unlock,
    Lock,
}

impl fmt::Display for MotorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorDirection::Unlock => write!(f, "unlock"),
            MotorDirection::Lock => write!(f, "lock"),
        }
    }
}

/// Where the lock mechanism is within a ceremony. Owned by the sequencer;
/// always back at `Idle` (success or fault) before the next poll runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Idle,
    Energizing,
    DrivingForward,
    Holding,
    DrivingReverse,
    Fault,
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActuatorState::Idle => "idle",
            ActuatorState::Energizing => "energizing",
            ActuatorState::DrivingForward => "driving forward",
            ActuatorState::Holding => "holding",
            ActuatorState::DrivingReverse => "driving reverse",
            ActuatorState::Fault => "fault",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// ActuatorRig
// ---------------------------------------------------------------------------

/// Exclusive owner of the physical actuator: the relay and direction
/// outputs, the PWM motor channel, and the limit-switch input.
pub trait ActuatorRig: Send {
    fn set_relay(&mut self, on: bool) -> Result<()>;
    fn set_direction(&mut self, direction: MotorDirection) -> Result<()>;
    fn motor_start(&mut self, duty_cycle_pct: f64) -> Result<()>;
    fn motor_stop(&mut self) -> Result<()>;
    /// Pull-up input: pressed pulls the line low.
    fn limit_switch_pressed(&mut self) -> Result<bool>;

    /// Force the rig to its safe rest state: motor stopped, relay
    /// de-energized. A failing output is logged and skipped so the
    /// remaining outputs are still restored. Runs on every fault and
    /// shutdown path.
    fn force_rest(&mut self) {
        if let Err(e) = self.motor_stop() {
            warn!("motor stop failed while resting rig: {e}");
        }
        if let Err(e) = self.set_relay(false) {
            warn!("relay release failed while resting rig: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// SimulatedRig
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SimState {
    relay_on: bool,
    direction: Option<MotorDirection>,
    motor_running: bool,
    /// Limit-switch reads before the switch reports pressed; `None` means
    /// it never triggers.
    switch_after_reads: Option<u32>,
    switch_reads: u32,
    /// Scripted failure: operation name plus how many matching calls to
    /// let through first.
    fail_on: Option<(&'static str, u32)>,
    journal: Vec<String>,
}

/// In-memory actuator for development mode and tests. Records every rig
/// operation in a journal and answers the limit switch from a scripted
/// schedule. Clones share state, so a test can keep a handle while the
/// sequencer owns the boxed rig.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedRig {
    /// A rig whose limit switch reports pressed on the first read.
    pub fn new() -> Self {
        let rig = Self {
            state: Arc::default(),
        };
        rig.set_switch_after_reads(Some(0));
        rig
    }

    /// Script the limit switch: pressed after `n` reads, or never.
    pub fn set_switch_after_reads(&self, n: Option<u32>) {
        self.state.lock().unwrap().switch_after_reads = n;
    }

    /// Script the named operation (`"relay"`, `"direction"`,
    /// `"motor_start"`, `"motor_stop"`, `"switch"`) to fail on its next
    /// call.
    pub fn set_fail_on(&self, op: &'static str) {
        self.set_fail_on_nth(op, 0);
    }

    /// Script the named operation to fail after `skip` matching calls have
    /// succeeded.
    pub fn set_fail_on_nth(&self, op: &'static str, skip: u32) {
        self.state.lock().unwrap().fail_on = Some((op, skip));
    }

    pub fn journal(&self) -> Vec<String> {
        self.state.lock().unwrap().journal.clone()
    }

    pub fn relay_on(&self) -> bool {
        self.state.lock().unwrap().relay_on
    }

    pub fn motor_running(&self) -> bool {
        self.state.lock().unwrap().motor_running
    }

    fn op(&self, name: &'static str, entry: Option<String>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some((op, skip)) = state.fail_on {
            if op == name {
                if skip == 0 {
                    return Err(DoorbotError::Hardware(format!("simulated {name} failure")));
                }
                state.fail_on = Some((op, skip - 1));
            }
        }
        if let Some(entry) = entry {
            state.journal.push(entry);
        }
        Ok(())
    }
}

impl Default for SimulatedRig {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorRig for SimulatedRig {
    fn set_relay(&mut self, on: bool) -> Result<()> {
        self.op(
            "relay",
            Some(format!("relay {}", if on { "on" } else { "off" })),
        )?;
        self.state.lock().unwrap().relay_on = on;
        Ok(())
    }

    fn set_direction(&mut self, direction: MotorDirection) -> Result<()> {
        self.op("direction", Some(format!("direction {direction}")))?;
        self.state.lock().unwrap().direction = Some(direction);
        Ok(())
    }

    fn motor_start(&mut self, duty_cycle_pct: f64) -> Result<()> {
        self.op("motor_start", Some(format!("motor start {duty_cycle_pct}%")))?;
        self.state.lock().unwrap().motor_running = true;
        Ok(())
    }

    fn motor_stop(&mut self) -> Result<()> {
        self.op("motor_stop", Some("motor stop".to_string()))?;
        self.state.lock().unwrap().motor_running = false;
        Ok(())
    }

    fn limit_switch_pressed(&mut self) -> Result<bool> {
        self.op("switch", None)?;
        let mut state = self.state.lock().unwrap();
        state.switch_reads += 1;
        Ok(state
            .switch_after_reads
            .is_some_and(|n| state.switch_reads > n))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
