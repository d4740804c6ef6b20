//! M-Bus frame formats and packing
//!
//! The link layer defines four frame formats:
//! - ack frame: a single `0xE5` byte
//! - short frame: `0x10` C A checksum `0x16` (5 bytes)
//! - control frame: `0x68` 03 03 `0x68` C A CI checksum `0x16` (9 bytes)
//! - long frame: `0x68` L L `0x68` C A CI user-data checksum `0x16`,
//!   where L counts the C, A and CI fields plus the user data
//!
//! The checksum is the wrapping byte sum over the C field through the end
//! of the user data.

use bytes::{BufMut, BytesMut};

use crate::error::FrameError;

/// Start byte of an ack frame (the whole frame)
pub const FRAME_ACK_START: u8 = 0xE5;
/// Start byte of a short frame
pub const FRAME_SHORT_START: u8 = 0x10;
/// Start byte of a control or long frame (appears twice)
pub const FRAME_LONG_START: u8 = 0x68;
/// Stop byte terminating every multi-byte frame
pub const FRAME_STOP: u8 = 0x16;

/// Total size of a short frame
pub const SHORT_FRAME_SIZE: usize = 5;
/// Total size of a control frame (long frame with L = 3)
pub const CONTROL_FRAME_SIZE: usize = 9;
/// Bytes needed before the total length of a long frame is known
pub const LONG_FRAME_HEADER_SIZE: usize = 4;
/// Maximum user data in a long frame (one-byte length field minus C, A, CI)
pub const MAX_USER_DATA: usize = 252;
/// Largest possible packed frame (long frame with maximum user data)
pub const MAX_FRAME_SIZE: usize = CONTROL_FRAME_SIZE + MAX_USER_DATA;

/// Control field values used by the link layer
pub mod control {
    /// Initialize slave (SND_NKE)
    pub const SND_NKE: u8 = 0x40;
    /// Send user data to slave (SND_UD)
    pub const SND_UD: u8 = 0x53;
    /// Request user data, class 2 (REQ_UD2)
    pub const REQ_UD2: u8 = 0x5B;
    /// Request user data, class 1 (REQ_UD1)
    pub const REQ_UD1: u8 = 0x5A;
    /// Response with user data (RSP_UD)
    pub const RSP_UD: u8 = 0x08;
}

/// Well-known link-layer addresses
pub mod address {
    /// Network layer (secondary addressing)
    pub const NETWORK_LAYER: u8 = 0xFD;
    /// Broadcast, all slaves reply
    pub const BROADCAST_REPLY: u8 = 0xFE;
    /// Broadcast, no slave replies
    pub const BROADCAST_NO_REPLY: u8 = 0xFF;

    /// Whether `addr` is a valid primary address (0..=250)
    pub fn is_primary(addr: u8) -> bool {
        addr <= 250
    }
}

/// A complete M-Bus link-layer frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Single-byte acknowledgment
    Ack,
    /// Short frame: control and address only
    Short { control: u8, address: u8 },
    /// Control frame: short frame plus a control information field
    Control {
        control: u8,
        address: u8,
        control_information: u8,
    },
    /// Long frame: control frame plus user data
    Long {
        control: u8,
        address: u8,
        control_information: u8,
        data: Vec<u8>,
    },
}

impl Frame {
    /// SND_NKE short frame addressed to `address`
    pub fn snd_nke(address: u8) -> Self {
        Frame::Short {
            control: control::SND_NKE,
            address,
        }
    }

    /// REQ_UD2 short frame addressed to `address`
    pub fn req_ud2(address: u8) -> Self {
        Frame::Short {
            control: control::REQ_UD2,
            address,
        }
    }

    /// Size of this frame once packed onto the wire
    pub fn packed_len(&self) -> usize {
        match self {
            Frame::Ack => 1,
            Frame::Short { .. } => SHORT_FRAME_SIZE,
            Frame::Control { .. } => CONTROL_FRAME_SIZE,
            Frame::Long { data, .. } => CONTROL_FRAME_SIZE + data.len(),
        }
    }

    /// Pack this frame into `dst` without growing it past its capacity.
    ///
    /// Returns the number of bytes appended. Fails if the user data exceeds
    /// the one-byte length field or if `dst` cannot hold the packed frame
    /// within its current capacity.
    pub fn pack(&self, dst: &mut BytesMut) -> Result<usize, FrameError> {
        if let Frame::Long { data, .. } = self {
            if data.len() > MAX_USER_DATA {
                return Err(FrameError::UserDataTooLarge {
                    size: data.len(),
                    max: MAX_USER_DATA,
                });
            }
        }

        let needed = self.packed_len();
        if dst.len() + needed > dst.capacity() {
            return Err(FrameError::BufferTooSmall {
                needed: dst.len() + needed,
                capacity: dst.capacity(),
            });
        }

        match self {
            Frame::Ack => dst.put_u8(FRAME_ACK_START),
            Frame::Short { control, address } => {
                dst.put_u8(FRAME_SHORT_START);
                dst.put_u8(*control);
                dst.put_u8(*address);
                dst.put_u8(checksum(&[*control, *address]));
                dst.put_u8(FRAME_STOP);
            }
            Frame::Control {
                control,
                address,
                control_information,
            } => {
                dst.put_u8(FRAME_LONG_START);
                dst.put_u8(3);
                dst.put_u8(3);
                dst.put_u8(FRAME_LONG_START);
                dst.put_u8(*control);
                dst.put_u8(*address);
                dst.put_u8(*control_information);
                dst.put_u8(checksum(&[*control, *address, *control_information]));
                dst.put_u8(FRAME_STOP);
            }
            Frame::Long {
                control,
                address,
                control_information,
                data,
            } => {
                // length field counts C, A, CI and the user data
                let length = (data.len() + 3) as u8;
                dst.put_u8(FRAME_LONG_START);
                dst.put_u8(length);
                dst.put_u8(length);
                dst.put_u8(FRAME_LONG_START);
                dst.put_u8(*control);
                dst.put_u8(*address);
                dst.put_u8(*control_information);
                dst.put_slice(data);
                let mut sum = checksum(&[*control, *address, *control_information]);
                sum = sum.wrapping_add(checksum(data));
                dst.put_u8(sum);
                dst.put_u8(FRAME_STOP);
            }
        }

        Ok(needed)
    }
}

/// Wrapping byte sum used as the frame checksum
pub(crate) fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}
