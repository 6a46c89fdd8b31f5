//! Fireplace wire protocol - command frames and level validation
//!
//! The fireplace accepts fixed 20-byte frames on a single writable GATT
//! characteristic. There is no checksum and no acknowledgment payload: a
//! malformed frame is silently accepted and ignored by the device, so the
//! byte layout here must match the controller exactly.

use thiserror::Error;

/// Command Characteristic UUID (write)
pub const COMMAND_CHARACTERISTIC: &str = "0000ffe1-0000-1000-8000-00805f9b34fb";

/// Every command frame the device understands is exactly this long.
pub const FRAME_LEN: usize = 20;

/// Power on frame
pub const POWER_ON: [u8; FRAME_LEN] = [
    0x0d, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0d,
];

/// Power off frame
pub const POWER_OFF: [u8; FRAME_LEN] = [
    0x0d, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0e,
];

// Flame frame layout: 3-byte header, height digit, speed digit, then
// padding ending in 0x2c.
const FLAME_HEADER: [u8; 3] = [0x0d, 0x20, 0x00];
const FLAME_TRAILER: u8 = 0x2c;

/// A flame height or speed level, guaranteed in range.
///
/// The device models both ember intensity ("height") and animation speed as
/// integers 1 through 7. A `Level` cannot be constructed outside that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level(u8);

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(7);

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (1..=7).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::LevelOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Level {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejected request parameter
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("level {0} out of range, expected 1-7")]
    LevelOutOfRange(u8),
}

/// Malformed raw command input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid hex command: {0}")]
    InvalidHex(String),

    #[error("empty command")]
    EmptyCommand,
}

/// Build the combined flame frame for a height and speed pair.
///
/// The device has a single flame opcode that carries both values, so
/// changing either one re-transmits both.
pub fn flame_frame(height: Level, speed: Level) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..3].copy_from_slice(&FLAME_HEADER);
    frame[3] = height.get();
    frame[4] = speed.get();
    frame[FRAME_LEN - 1] = FLAME_TRAILER;
    frame
}

/// Decode an operator-supplied hex string into raw command bytes.
///
/// This is the escape hatch for undocumented opcodes: beyond being valid
/// hex of at least one byte, no validation is performed. Upper and lower
/// case are both accepted.
pub fn parse_raw(input: &str) -> Result<Vec<u8>, ProtocolError> {
    if input.is_empty() {
        return Err(ProtocolError::EmptyCommand);
    }
    data_encoding::HEXLOWER_PERMISSIVE
        .decode(input.as_bytes())
        .map_err(|_| ProtocolError::InvalidHex(input.to_string()))
}
