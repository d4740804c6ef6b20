//! mbus-frame: M-Bus wire frame model and codec
//!
//! This crate defines the four M-Bus link-layer frame formats (EN 13757-2)
//! and the codec used by the transport layer: packing a frame into a bounded
//! buffer, and incrementally parsing a frame out of a byte-stream prefix.

pub mod error;
pub mod frame;
pub mod parse;

pub use error::FrameError;
pub use frame::{
    address, control, Frame, CONTROL_FRAME_SIZE, FRAME_ACK_START, FRAME_LONG_START,
    FRAME_SHORT_START, FRAME_STOP, LONG_FRAME_HEADER_SIZE, MAX_FRAME_SIZE, MAX_USER_DATA,
    SHORT_FRAME_SIZE,
};
pub use parse::{parse, ParseOutcome};
