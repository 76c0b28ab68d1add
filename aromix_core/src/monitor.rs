//! System monitor: the single owner of the process-wide status snapshot
//! and the bounded error log.

use std::collections::VecDeque;

use crate::actuator::{ActuatorSnapshot, PUMP_COUNT, VALVE_COUNT};
use crate::status::{StatusCode, SystemState};

/// Ring capacity of the error log; insertion evicts the oldest entry.
pub const ERROR_LOG_CAPACITY: usize = 32;

/// Process-wide status snapshot. Mutated only through `SystemMonitor`;
/// readers always get copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatus {
    pub state: SystemState,
    pub error_count: u8,
    pub uptime_s: u64,
    pub pump_status: [u8; PUMP_COUNT],
    pub valve_status: [bool; VALVE_COUNT],
    pub communication_active: bool,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            state: SystemState::Idle,
            error_count: 0,
            uptime_s: 0,
            pump_status: [0; PUMP_COUNT],
            valve_status: [false; VALVE_COUNT],
            communication_active: false,
        }
    }
}

pub struct SystemMonitor {
    status: SystemStatus,
    error_log: VecDeque<StatusCode>,
    start_ms: u64,
    last_rx_ms: Option<u64>,
    comm_timeout_ms: u64,
}

impl core::fmt::Debug for SystemMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SystemMonitor")
            .field("status", &self.status)
            .field("error_log_len", &self.error_log.len())
            .finish()
    }
}

impl SystemMonitor {
    pub fn new(now_ms: u64, comm_timeout_ms: u64) -> Self {
        Self {
            status: SystemStatus::default(),
            error_log: VecDeque::with_capacity(ERROR_LOG_CAPACITY),
            start_ms: now_ms,
            last_rx_ms: None,
            comm_timeout_ms,
        }
    }

    /// Periodic refresh: uptime, actuator mirrors, communication flag.
    pub fn update(&mut self, now_ms: u64, snapshot: &ActuatorSnapshot) {
        self.status.uptime_s = now_ms.saturating_sub(self.start_ms) / 1000;
        self.status.pump_status = snapshot.pump_speeds;
        self.status.valve_status = snapshot.valve_open;
        self.status.communication_active = matches!(
            self.last_rx_ms,
            Some(t) if now_ms.saturating_sub(t) < self.comm_timeout_ms
        );
    }

    /// Record a frame arrival for the communication-active flag.
    pub fn note_frame_received(&mut self, now_ms: u64) {
        self.last_rx_ms = Some(now_ms);
    }

    /// Append to the error log, evicting the oldest entry when full.
    /// Only critical codes promote the global state to `Error`.
    pub fn log_error(&mut self, code: StatusCode) {
        if self.error_log.len() == ERROR_LOG_CAPACITY {
            self.error_log.pop_front();
        }
        self.error_log.push_back(code);
        self.status.error_count = self.error_log.len() as u8;
        if code.is_critical() {
            self.status.state = SystemState::Error;
        }
    }

    /// Reflect a sequencer transition in the global state.
    pub fn set_state(&mut self, state: SystemState) {
        self.status.state = state;
    }

    /// Copy of the current status.
    pub fn status(&self) -> SystemStatus {
        self.status.clone()
    }

    /// Copy of the error log, oldest first.
    pub fn error_log(&self) -> Vec<StatusCode> {
        self.error_log.iter().copied().collect()
    }

    /// Reset the log and the status counter together. The monitor is
    /// only touched from the control thread, so the pair is observed
    /// atomically by any reader.
    pub fn clear_error_log(&mut self) {
        self.error_log.clear();
        self.status.error_count = 0;
    }
}
