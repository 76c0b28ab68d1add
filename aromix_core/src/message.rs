//! Inbound command frames: codec, checksum, and validation.
//!
//! The wire frame is a fixed 16-byte record, little-endian multi-byte
//! fields:
//!
//! ```text
//! kind:u8  odor:u8  intensity:u8  duration:u16  pump_config[5]:u8
//! timestamp:u32  checksum:u16
//! ```
//!
//! The checksum is the 16-bit wraparound additive sum of the first 14
//! encoded bytes. Validation recomputes it before anything else, so a
//! frame corrupted in transit reports as a checksum failure no matter
//! which field the corruption lands in.

use crate::actuator::PUMP_COUNT;
use crate::error::ValidationError;

pub use aromix_traits::FRAME_LEN;

/// Number of leading frame bytes covered by the checksum.
pub const CHECKSUM_SPAN: usize = FRAME_LEN - 2;

/// Odor identifier carried in commands and recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OdorId(u8);

impl OdorId {
    pub const COFFEE: OdorId = OdorId(0x01);
    pub const ALCOHOL: OdorId = OdorId(0x02);
    pub const LEMON: OdorId = OdorId(0x03);
    pub const MINT: OdorId = OdorId(0x04);
    pub const LAVENDER: OdorId = OdorId(0x05);
    pub const MIXED: OdorId = OdorId(0x06);
    /// Highest id accepted on the wire: six predefined plus ten custom slots.
    pub const MAX: OdorId = OdorId(0x10);

    #[inline]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Whether the id lies in the addressable range.
    #[inline]
    pub fn is_known(self) -> bool {
        (Self::COFFEE.0..=Self::MAX.0).contains(&self.0)
    }

    /// Whether the id names one of the built-in recipes.
    #[inline]
    pub fn is_predefined(self) -> bool {
        (Self::COFFEE.0..=Self::MIXED.0).contains(&self.0)
    }
}

/// Recognized message kinds. Other wire values exist in the sender
/// protocol family but are rejected by this receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    OdorCommand = 0x01,
    EmergencyStop = 0x05,
}

/// A decoded (not yet validated) command frame.
///
/// `kind` stays raw so unknown kinds survive decoding and can be
/// rejected with their original value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub kind: u8,
    pub odor: OdorId,
    pub intensity: u8,
    pub duration_s: u16,
    pub pump_config: [u8; PUMP_COUNT],
    pub timestamp: u32,
    pub checksum: u16,
}

impl Command {
    pub fn decode(frame: &[u8; FRAME_LEN]) -> Command {
        let mut pump_config = [0u8; PUMP_COUNT];
        pump_config.copy_from_slice(&frame[5..10]);
        Command {
            kind: frame[0],
            odor: OdorId::new(frame[1]),
            intensity: frame[2],
            duration_s: u16::from_le_bytes([frame[3], frame[4]]),
            pump_config,
            timestamp: u32::from_le_bytes([frame[10], frame[11], frame[12], frame[13]]),
            checksum: u16::from_le_bytes([frame[14], frame[15]]),
        }
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = self.kind;
        frame[1] = self.odor.raw();
        frame[2] = self.intensity;
        frame[3..5].copy_from_slice(&self.duration_s.to_le_bytes());
        frame[5..10].copy_from_slice(&self.pump_config);
        frame[10..14].copy_from_slice(&self.timestamp.to_le_bytes());
        frame[14..16].copy_from_slice(&self.checksum.to_le_bytes());
        frame
    }

    /// Checksum over the encoded non-checksum bytes.
    pub fn compute_checksum(&self) -> u16 {
        additive_checksum(&self.encode()[..CHECKSUM_SPAN])
    }

    /// Consume and return the command with its checksum field filled in.
    /// Senders (and tests) build frames through this.
    pub fn sealed(mut self) -> Command {
        self.checksum = self.compute_checksum();
        self
    }
}

/// 16-bit wraparound additive checksum.
pub fn additive_checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)))
}

/// Bounds applied by the validator. Mirrors `aromix_config::Limits`;
/// see `conversions`.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_intensity: u8,
    pub max_duration_s: u16,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_intensity: 100,
            max_duration_s: 300,
        }
    }
}

/// A command that passed validation. The only way to obtain one is
/// through [`validate`], so downstream code can rely on its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidCommand {
    kind: MessageKind,
    command: Command,
}

impl ValidCommand {
    #[inline]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    #[inline]
    pub fn command(&self) -> &Command {
        &self.command
    }
}

/// Validate a decoded command. Pure; no side effects.
///
/// Order matters: the checksum is verified first so that corruption is
/// reported as corruption even when it lands in a bounds-checked field.
/// Emergency stops skip the odor/intensity/duration checks entirely.
pub fn validate(cmd: &Command, limits: &Limits) -> Result<ValidCommand, ValidationError> {
    let expected = cmd.compute_checksum();
    if expected != cmd.checksum {
        return Err(ValidationError::Checksum {
            expected,
            found: cmd.checksum,
        });
    }

    let kind = match cmd.kind {
        k if k == MessageKind::OdorCommand as u8 => MessageKind::OdorCommand,
        k if k == MessageKind::EmergencyStop as u8 => MessageKind::EmergencyStop,
        k => return Err(ValidationError::UnknownKind(k)),
    };

    if kind == MessageKind::OdorCommand {
        if !cmd.odor.is_known() {
            return Err(ValidationError::UnknownOdor(cmd.odor.raw()));
        }
        if cmd.intensity > limits.max_intensity {
            return Err(ValidationError::Intensity {
                found: cmd.intensity,
                max: limits.max_intensity,
            });
        }
        if cmd.duration_s > limits.max_duration_s {
            return Err(ValidationError::Duration {
                found: cmd.duration_s,
                max: limits.max_duration_s,
            });
        }
    }

    Ok(ValidCommand {
        kind,
        command: *cmd,
    })
}

/// Classifier output from the sender node. Consumed identically to a
/// received odor command once transmitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdorDetection {
    pub odor: OdorId,
    pub confidence: f32,
    pub intensity: u8,
}

impl OdorDetection {
    /// The wire command a sender would transmit for this detection.
    pub fn into_command(self, duration_s: u16, timestamp: u32) -> Command {
        Command {
            kind: MessageKind::OdorCommand as u8,
            odor: self.odor,
            intensity: self.intensity,
            duration_s,
            pump_config: [0; PUMP_COUNT],
            timestamp,
            checksum: 0,
        }
        .sealed()
    }
}

#[cfg(test)]
mod codec_tests {
    use super::*;

    fn sample() -> Command {
        Command {
            kind: MessageKind::OdorCommand as u8,
            odor: OdorId::LEMON,
            intensity: 75,
            duration_s: 120,
            pump_config: [0, 0, 85, 0, 15],
            timestamp: 0xDEAD_BEEF,
            checksum: 0,
        }
        .sealed()
    }

    #[test]
    fn encode_decode_round_trip() {
        let cmd = sample();
        let decoded = Command::decode(&cmd.encode());
        assert_eq!(decoded, cmd);
    }

    #[test]
    fn checksum_covers_every_non_checksum_byte() {
        let frame = sample().encode();
        let sum: u16 = frame[..CHECKSUM_SPAN]
            .iter()
            .fold(0u16, |a, b| a.wrapping_add(u16::from(*b)));
        assert_eq!(sum, sample().checksum);
    }

    #[test]
    fn detection_converts_to_sealed_command() {
        let det = OdorDetection {
            odor: OdorId::MINT,
            confidence: 0.93,
            intensity: 60,
        };
        let cmd = det.into_command(30, 42);
        assert_eq!(cmd.checksum, cmd.compute_checksum());
        assert_eq!(cmd.odor, OdorId::MINT);
        assert_eq!(cmd.kind, MessageKind::OdorCommand as u8);
    }
}
