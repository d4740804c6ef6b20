//! Frame codec error types

use thiserror::Error;

/// Errors that can occur while packing or parsing a frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// First byte is not a recognized frame start byte
    #[error("Invalid start byte: 0x{0:02X}")]
    InvalidStart(u8),

    /// Second start byte of a long/control frame is wrong
    #[error("Invalid second start byte: 0x{0:02X}")]
    InvalidSecondStart(u8),

    /// The two length fields of a long/control frame disagree
    #[error("Length fields disagree: {first} != {second}")]
    LengthMismatch { first: u8, second: u8 },

    /// Length field is too small to cover the C, A and CI fields
    #[error("Length field too small: {0} (minimum 3)")]
    LengthTooShort(u8),

    /// Stop byte is missing or wrong
    #[error("Invalid stop byte: 0x{0:02X}")]
    InvalidStop(u8),

    /// Checksum over the frame body does not match
    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// User data exceeds what the one-byte length field can describe
    #[error("User data too large: {size} bytes exceeds maximum of {max} bytes")]
    UserDataTooLarge { size: usize, max: usize },

    /// Destination buffer cannot hold the packed frame
    #[error("Pack buffer too small: need {needed} bytes, capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
}
