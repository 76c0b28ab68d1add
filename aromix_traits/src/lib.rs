pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Length of an inbound command frame on the wire.
pub const FRAME_LEN: usize = 16;

/// Low-level actuator bank: pumps, valves, and mixing fans.
///
/// Identifiers are zero-based channel indices; callers are expected to
/// stay within the bank's channel count. Speeds are percentages.
pub trait Actuators {
    fn set_pump(
        &mut self,
        id: u8,
        percent: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_valve(
        &mut self,
        id: u8,
        open: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_fan(
        &mut self,
        id: u8,
        percent: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Command/status link to the paired sender node.
///
/// `receive_frame` is non-blocking: `Ok(None)` means no complete frame
/// is pending. `send_frame` is best-effort; the control loop treats
/// failures as non-fatal.
pub trait Transport {
    fn receive_frame(
        &mut self,
    ) -> Result<Option<[u8; FRAME_LEN]>, Box<dyn std::error::Error + Send + Sync>>;
    fn send_frame(
        &mut self,
        frame: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
