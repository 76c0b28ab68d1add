//! Command sequencer: validate → resolve recipe → scale by intensity →
//! drive actuators → arm the duration timer. Owns emergency-stop
//! precedence over normal sequencing.

use aromix_traits::Actuators;

use crate::actuator::{ActuatorDriver, ActuatorSnapshot, FAN_COUNT, PUMP_COUNT, VALVE_COUNT};
use crate::error::SequenceError;
use crate::message::{Command, MessageKind, ValidCommand};
use crate::recipe::{Recipe, RecipeCatalog};

/// Sequencer states. `Configuring` is only observable when a dispatch
/// failed mid-configuration and left the machine in `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    #[default]
    Idle,
    Configuring,
    Running,
    Error,
}

pub struct Sequencer<A: Actuators> {
    driver: ActuatorDriver<A>,
    state: SequencerState,
    /// Absolute deadline (ms on the control-loop clock) while Running.
    deadline_ms: Option<u64>,
}

impl<A: Actuators> core::fmt::Debug for Sequencer<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sequencer")
            .field("state", &self.state)
            .field("deadline_ms", &self.deadline_ms)
            .finish()
    }
}

impl<A: Actuators> Sequencer<A> {
    pub fn new(driver: ActuatorDriver<A>) -> Self {
        Self {
            driver,
            state: SequencerState::Idle,
            deadline_ms: None,
        }
    }

    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    #[inline]
    pub fn snapshot(&self) -> ActuatorSnapshot {
        self.driver.snapshot()
    }

    /// Deadline of the active generation, if one is armed.
    #[inline]
    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// Process a validated command.
    ///
    /// An odor command arriving while a generation is active first stops
    /// the active one (implicit transition through Idle); the timer is
    /// never re-armed in place. A recipe miss fails closed: the machine
    /// goes to `Error` without touching a single actuator. `Error` is
    /// recoverable; the next valid command dispatches normally.
    pub fn dispatch(
        &mut self,
        cmd: &ValidCommand,
        catalog: &RecipeCatalog,
        now_ms: u64,
    ) -> Result<(), SequenceError> {
        match cmd.kind() {
            MessageKind::EmergencyStop => {
                self.emergency_stop();
                Ok(())
            }
            MessageKind::OdorCommand => {
                if self.state == SequencerState::Running {
                    self.deadline_ms = None;
                    if let Err(e) = self.driver.stop_generation() {
                        self.state = SequencerState::Error;
                        return Err(SequenceError::Actuator(e));
                    }
                    self.state = SequencerState::Idle;
                }

                self.state = SequencerState::Configuring;
                let command = cmd.command();
                let recipe = match catalog.get(command.odor) {
                    Ok(r) => r.clone(),
                    Err(e) => {
                        // Fail closed: resolution happens before any
                        // actuator is touched.
                        self.state = SequencerState::Error;
                        return Err(SequenceError::Recipe(e));
                    }
                };

                if let Err(e) = self.apply_targets(&recipe, command) {
                    self.state = SequencerState::Error;
                    return Err(SequenceError::Actuator(e));
                }

                self.deadline_ms = Some(now_ms + u64::from(command.duration_s) * 1000);
                self.state = SequencerState::Running;
                Ok(())
            }
        }
    }

    fn apply_targets(
        &mut self,
        recipe: &Recipe,
        command: &Command,
    ) -> Result<(), crate::error::ReceiverError> {
        for (id, ratio) in recipe.pump_ratios.iter().enumerate().take(PUMP_COUNT) {
            self.driver
                .set_pump_speed(id as u8, scale_ratio(*ratio, command.intensity))?;
        }
        for (id, open) in recipe.valve_states.iter().enumerate().take(VALVE_COUNT) {
            self.driver.set_valve(id as u8, *open)?;
        }
        let pwm = fan_pwm(command.intensity);
        for id in 0..FAN_COUNT as u8 {
            self.driver.set_fan_pwm(id, pwm)?;
        }
        Ok(())
    }

    /// Advance the duration timer. Returns `Ok(true)` exactly once per
    /// generation, when the deadline passes and everything was shut off.
    pub fn tick(&mut self, now_ms: u64) -> Result<bool, SequenceError> {
        if self.state != SequencerState::Running {
            return Ok(false);
        }
        let Some(deadline) = self.deadline_ms else {
            return Ok(false);
        };
        if now_ms < deadline {
            return Ok(false);
        }
        self.deadline_ms = None;
        if let Err(e) = self.driver.stop_generation() {
            self.state = SequencerState::Error;
            return Err(SequenceError::Actuator(e));
        }
        self.state = SequencerState::Idle;
        Ok(true)
    }

    /// Highest-priority path: all actuators to the safe off state,
    /// timer disarmed, back to Idle. Short-circuits any configuration
    /// in progress, performs no lookups and no I/O, and cannot fail.
    pub fn emergency_stop(&mut self) {
        self.driver.emergency_stop();
        self.deadline_ms = None;
        self.state = SequencerState::Idle;
    }
}

/// Per-pump target: `floor(ratio * intensity / 100)`.
#[inline]
pub fn scale_ratio(ratio: u8, intensity: u8) -> u8 {
    ((u16::from(ratio) * u16::from(intensity)) / 100) as u8
}

/// Fan PWM for a command intensity: `floor(intensity * 255 / 100)`.
#[inline]
pub fn fan_pwm(intensity: u8) -> u8 {
    ((u16::from(intensity) * 255) / 100).min(255) as u8
}
