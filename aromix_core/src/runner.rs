//! Receiver control loop: poll the link, validate, dispatch, tick the
//! duration timer, refresh the monitor, and push status frames.
//!
//! Every failure path is absorbed here — the loop never aborts. The
//! worst outcome of any command is a logged error code and an error
//! push frame; the sequencer always lands in a defined state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use aromix_traits::clock::Clock;
use aromix_traits::{Actuators, Transport};

use crate::actuator::{ActuatorDriver, ActuatorSnapshot};
use crate::error::{SequenceError, ValidationError};
use crate::frames;
use crate::inlet::LinkPump;
use crate::message::{validate, Command, Limits, MessageKind};
use crate::monitor::{SystemMonitor, SystemStatus};
use crate::recipe::RecipeCatalog;
use crate::sequencer::{Sequencer, SequencerState};
use crate::status::{StatusCode, SystemState};

/// Upper bound on frames handled per loop iteration; keeps one noisy
/// sender from starving the timer and monitor work.
const MAX_FRAMES_PER_POLL: usize = 8;

/// Control-loop timing and validation bounds. Mirrors the config
/// tables; see `conversions`.
#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub limits: Limits,
    pub monitor_update_ms: u64,
    pub comm_timeout_ms: u64,
    pub status_period_ms: u64,
    pub loop_delay_ms: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            monitor_update_ms: 100,
            comm_timeout_ms: 5000,
            status_period_ms: 500,
            loop_delay_ms: 10,
        }
    }
}

/// How the transport is driven.
pub enum Link {
    /// Transport polled inline from the control loop.
    Direct(Box<dyn Transport>),
    /// Transport owned by a background pump thread; commands arrive
    /// through the depth-1 inlet.
    Queued(LinkPump),
}

impl Link {
    fn poll(&mut self) -> Option<Command> {
        match self {
            Link::Direct(transport) => match transport.receive_frame() {
                Ok(Some(frame)) => Some(Command::decode(&frame)),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "transport receive failed");
                    None
                }
            },
            Link::Queued(pump) => pump.take(),
        }
    }

    fn send(&mut self, frame: &[u8]) {
        match self {
            Link::Direct(transport) => {
                if let Err(e) = transport.send_frame(frame) {
                    tracing::warn!(error = %e, "transport send failed");
                }
            }
            Link::Queued(pump) => pump.send(frame),
        }
    }
}

pub struct Receiver<A: Actuators> {
    sequencer: Sequencer<A>,
    catalog: RecipeCatalog,
    monitor: SystemMonitor,
    link: Link,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    params: RunParams,
    next_monitor_ms: u64,
    next_status_ms: u64,
}

impl<A: Actuators> Receiver<A> {
    pub fn new(
        bank: A,
        catalog: RecipeCatalog,
        link: Link,
        clock: Arc<dyn Clock + Send + Sync>,
        params: RunParams,
    ) -> Self {
        let epoch = clock.now();
        Self {
            sequencer: Sequencer::new(ActuatorDriver::new(bank)),
            catalog,
            monitor: SystemMonitor::new(0, params.comm_timeout_ms),
            link,
            clock,
            epoch,
            params,
            next_monitor_ms: 0,
            next_status_ms: 0,
        }
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn status(&self) -> SystemStatus {
        self.monitor.status()
    }

    pub fn sequencer_state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn snapshot(&self) -> ActuatorSnapshot {
        self.sequencer.snapshot()
    }

    pub fn monitor(&self) -> &SystemMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut SystemMonitor {
        &mut self.monitor
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut RecipeCatalog {
        &mut self.catalog
    }

    /// One loop iteration: drain pending commands (emergency stops
    /// strictly first), advance the duration timer, and service the
    /// periodic monitor/status work. Never fails.
    pub fn poll_once(&mut self) {
        let now = self.now_ms();

        let mut pending: Vec<Command> = Vec::new();
        while pending.len() < MAX_FRAMES_PER_POLL {
            match self.link.poll() {
                Some(cmd) => pending.push(cmd),
                None => break,
            }
        }
        // Stable: emergency stops move to the front, everything else
        // keeps its arrival order.
        pending.sort_by_key(|c| c.kind != MessageKind::EmergencyStop as u8);
        for cmd in &pending {
            self.handle_command(cmd, now);
        }

        match self.sequencer.tick(now) {
            Ok(true) => {
                self.monitor.set_state(SystemState::Idle);
                tracing::info!("generation complete");
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, "timed stop failed; forcing emergency stop");
                self.monitor.log_error(StatusCode::ActuatorError);
                self.push_error(StatusCode::ActuatorError);
                self.sequencer.emergency_stop();
            }
        }

        if now >= self.next_monitor_ms {
            let snap = self.sequencer.snapshot();
            self.monitor.update(now, &snap);
            self.next_monitor_ms = now + self.params.monitor_update_ms;
        }

        if now >= self.next_status_ms {
            let frame = frames::encode_status(&self.monitor.status());
            self.link.send(&frame);
            self.next_status_ms = now + self.params.status_period_ms;
        }
    }

    fn handle_command(&mut self, cmd: &Command, now: u64) {
        self.monitor.note_frame_received(now);
        match validate(cmd, &self.params.limits) {
            Ok(valid) => match valid.kind() {
                MessageKind::EmergencyStop => {
                    tracing::warn!("emergency stop received");
                    self.sequencer.emergency_stop();
                    // Recorded as a critical event, as the original
                    // firmware does; the sequencer itself is back in Idle.
                    self.monitor.log_error(StatusCode::GenericError);
                }
                MessageKind::OdorCommand => {
                    match self.sequencer.dispatch(&valid, &self.catalog, now) {
                        Ok(()) => {
                            self.monitor.set_state(SystemState::Running);
                            let c = valid.command();
                            tracing::info!(
                                odor = c.odor.raw(),
                                intensity = c.intensity,
                                duration_s = c.duration_s,
                                "generation started"
                            );
                        }
                        Err(SequenceError::Recipe(e)) => {
                            tracing::warn!(error = %e, "recipe resolution failed");
                            self.monitor.log_error(StatusCode::RecipeError);
                            self.push_error(StatusCode::RecipeError);
                        }
                        Err(SequenceError::Actuator(e)) => {
                            tracing::error!(error = %e, "actuator configuration failed");
                            self.monitor.log_error(StatusCode::ActuatorError);
                            self.push_error(StatusCode::ActuatorError);
                        }
                    }
                }
            },
            Err(e) => {
                let code = match e {
                    ValidationError::Checksum { .. } => StatusCode::CommError,
                    _ => StatusCode::InvalidParam,
                };
                tracing::warn!(error = %e, "rejected inbound command");
                self.monitor.log_error(code);
                self.push_error(code);
            }
        }
    }

    fn push_error(&mut self, code: StatusCode) {
        let frame = frames::encode_error(code);
        self.link.send(&frame);
    }

    /// Run until the shutdown flag is raised, then leave the machine in
    /// the safe all-off state.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        tracing::info!("receiver loop started");
        while !shutdown.load(Ordering::Relaxed) {
            self.poll_once();
            self.clock
                .sleep(Duration::from_millis(self.params.loop_delay_ms));
        }
        self.sequencer.emergency_stop();
        self.monitor.set_state(SystemState::Idle);
        tracing::info!("receiver loop stopped");
    }

    /// Bounded variant of [`run`](Self::run) for demos and tests.
    pub fn run_iterations(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.poll_once();
            self.clock
                .sleep(Duration::from_millis(self.params.loop_delay_ms));
        }
    }
}
