use crate::message::OdorId;
use thiserror::Error;

/// Why the validator refused an inbound command.
///
/// `Checksum` is kept distinct from the bounds failures so callers can
/// tell "corrupted in transit" (eligible for retransmission) apart from
/// "malformed" (reject outright).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("checksum mismatch: expected {expected:#06x}, found {found:#06x}")]
    Checksum { expected: u16, found: u16 },
    #[error("unknown message kind {0:#04x}")]
    UnknownKind(u8),
    #[error("odor id {0:#04x} outside the addressable range")]
    UnknownOdor(u8),
    #[error("intensity {found}% exceeds the maximum of {max}%")]
    Intensity { found: u8, max: u8 },
    #[error("duration {found}s exceeds the maximum of {max}s")]
    Duration { found: u16, max: u16 },
}

/// Recipe catalog failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecipeError {
    #[error("no recipe for odor id {id:#04x}", id = .0.raw())]
    NotFound(OdorId),
    #[error("a recipe for odor id {id:#04x} already exists", id = .0.raw())]
    AlreadyExists(OdorId),
    #[error("custom recipe capacity exhausted")]
    CapacityExceeded,
    #[error("odor id {id:#04x} outside the addressable range", id = .0.raw())]
    InvalidOdor(OdorId),
}

/// Failures raised below the sequencer: actuator hardware and link I/O.
#[derive(Debug, Error, Clone)]
pub enum ReceiverError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("timeout waiting for hardware")]
    Timeout,
}

/// Why a dispatch attempt left the sequencer in `Error`.
#[derive(Debug, Error, Clone)]
pub enum SequenceError {
    #[error("recipe lookup failed: {0}")]
    Recipe(#[from] RecipeError),
    #[error("actuator command failed: {0}")]
    Actuator(#[from] ReceiverError),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
