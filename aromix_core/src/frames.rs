//! Outbound push frames: status and error reports to the sender node.

use crate::message::additive_checksum;
use crate::monitor::SystemStatus;
use crate::status::StatusCode;

pub const FRAME_START: u8 = 0xAA;
pub const FRAME_END: u8 = 0x55;
pub const STATUS_FRAME_TYPE: u8 = 0x02;
pub const ERROR_FRAME_TYPE: u8 = 0x05;

pub const STATUS_FRAME_LEN: usize = 16;
pub const ERROR_FRAME_LEN: usize = 4;

/// Status push frame:
/// `0xAA, 0x02, state, error_count, pump_status[5], valve_status[5],
/// checksum_hi, checksum_lo` — checksum sums everything before it.
pub fn encode_status(status: &SystemStatus) -> [u8; STATUS_FRAME_LEN] {
    let mut frame = [0u8; STATUS_FRAME_LEN];
    frame[0] = FRAME_START;
    frame[1] = STATUS_FRAME_TYPE;
    frame[2] = status.state.as_u8();
    frame[3] = status.error_count;
    frame[4..9].copy_from_slice(&status.pump_status);
    for (i, open) in status.valve_status.iter().enumerate() {
        frame[9 + i] = u8::from(*open);
    }
    let checksum = additive_checksum(&frame[..STATUS_FRAME_LEN - 2]);
    frame[14] = (checksum >> 8) as u8;
    frame[15] = (checksum & 0xFF) as u8;
    frame
}

/// Whether a status frame's trailing checksum matches its payload.
pub fn status_checksum_ok(frame: &[u8; STATUS_FRAME_LEN]) -> bool {
    let stored = (u16::from(frame[14]) << 8) | u16::from(frame[15]);
    additive_checksum(&frame[..STATUS_FRAME_LEN - 2]) == stored
}

/// Error push frame: `0xAA, 0x05, error_code, 0x55`.
pub fn encode_error(code: StatusCode) -> [u8; ERROR_FRAME_LEN] {
    [FRAME_START, ERROR_FRAME_TYPE, code.as_u8(), FRAME_END]
}

#[cfg(test)]
mod frame_tests {
    use super::*;
    use crate::status::SystemState;

    #[test]
    fn status_frame_layout_and_checksum() {
        let mut status = SystemStatus::default();
        status.state = SystemState::Running;
        status.error_count = 3;
        status.pump_status = [40, 0, 0, 0, 10];
        status.valve_status = [true, false, false, false, true];

        let frame = encode_status(&status);
        assert_eq!(frame[0], FRAME_START);
        assert_eq!(frame[1], STATUS_FRAME_TYPE);
        assert_eq!(frame[2], SystemState::Running.as_u8());
        assert_eq!(frame[3], 3);
        assert_eq!(&frame[4..9], &[40, 0, 0, 0, 10]);
        assert_eq!(&frame[9..14], &[1, 0, 0, 0, 1]);
        assert!(status_checksum_ok(&frame));
    }

    #[test]
    fn corrupted_status_frame_fails_its_checksum() {
        let frame = encode_status(&SystemStatus::default());
        let mut bad = frame;
        bad[3] ^= 0x01;
        assert!(!status_checksum_ok(&bad));
    }

    #[test]
    fn error_frame_is_marker_delimited() {
        let frame = encode_error(StatusCode::RecipeError);
        assert_eq!(frame, [0xAA, 0x05, 0x07, 0x55]);
    }
}
