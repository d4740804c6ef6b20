//! Incremental frame parsing
//!
//! M-Bus frames are self-describing: the start byte selects the format and,
//! for long frames, the header carries the total length. [`parse`] is fed a
//! growing byte-stream prefix and reports either a complete frame or how
//! many further bytes the caller must read before trying again. This is what
//! lets the transport layer read from a stream socket without guessing at
//! chunk boundaries.

use crate::error::FrameError;
use crate::frame::{
    checksum, Frame, CONTROL_FRAME_SIZE, FRAME_ACK_START, FRAME_LONG_START, FRAME_SHORT_START,
    FRAME_STOP, LONG_FRAME_HEADER_SIZE, SHORT_FRAME_SIZE,
};

/// Outcome of parsing a byte-stream prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A complete, validated frame
    Complete(Frame),
    /// The prefix is consistent so far; this many more bytes are required
    NeedMore(usize),
}

/// Parse the accumulated prefix of a frame.
///
/// Returns [`ParseOutcome::NeedMore`] while the prefix is incomplete,
/// [`ParseOutcome::Complete`] once the frame is whole and validated, or an
/// error if the bytes seen so far cannot be a valid frame.
pub fn parse(buf: &[u8]) -> Result<ParseOutcome, FrameError> {
    let Some(&start) = buf.first() else {
        return Ok(ParseOutcome::NeedMore(1));
    };

    match start {
        FRAME_ACK_START => Ok(ParseOutcome::Complete(Frame::Ack)),
        FRAME_SHORT_START => parse_short(buf),
        FRAME_LONG_START => parse_long(buf),
        other => Err(FrameError::InvalidStart(other)),
    }
}

fn parse_short(buf: &[u8]) -> Result<ParseOutcome, FrameError> {
    if buf.len() < SHORT_FRAME_SIZE {
        return Ok(ParseOutcome::NeedMore(SHORT_FRAME_SIZE - buf.len()));
    }

    if buf[4] != FRAME_STOP {
        return Err(FrameError::InvalidStop(buf[4]));
    }
    let expected = checksum(&buf[1..3]);
    if buf[3] != expected {
        return Err(FrameError::ChecksumMismatch {
            expected,
            actual: buf[3],
        });
    }

    Ok(ParseOutcome::Complete(Frame::Short {
        control: buf[1],
        address: buf[2],
    }))
}

fn parse_long(buf: &[u8]) -> Result<ParseOutcome, FrameError> {
    if buf.len() < LONG_FRAME_HEADER_SIZE {
        return Ok(ParseOutcome::NeedMore(LONG_FRAME_HEADER_SIZE - buf.len()));
    }

    if buf[1] != buf[2] {
        return Err(FrameError::LengthMismatch {
            first: buf[1],
            second: buf[2],
        });
    }
    if buf[3] != FRAME_LONG_START {
        return Err(FrameError::InvalidSecondStart(buf[3]));
    }
    if buf[1] < 3 {
        return Err(FrameError::LengthTooShort(buf[1]));
    }

    // start, L, L, start + body + checksum, stop
    let length = buf[1] as usize;
    let total = length + 6;
    if buf.len() < total {
        return Ok(ParseOutcome::NeedMore(total - buf.len()));
    }

    if buf[total - 1] != FRAME_STOP {
        return Err(FrameError::InvalidStop(buf[total - 1]));
    }
    let body = &buf[4..4 + length];
    let expected = checksum(body);
    if buf[4 + length] != expected {
        return Err(FrameError::ChecksumMismatch {
            expected,
            actual: buf[4 + length],
        });
    }

    let frame = if total == CONTROL_FRAME_SIZE {
        Frame::Control {
            control: body[0],
            address: body[1],
            control_information: body[2],
        }
    } else {
        Frame::Long {
            control: body[0],
            address: body[1],
            control_information: body[2],
            data: body[3..].to_vec(),
        }
    };

    Ok(ParseOutcome::Complete(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::control;
    use bytes::BytesMut;

    fn packed(frame: &Frame) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(crate::frame::MAX_FRAME_SIZE);
        frame.pack(&mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_empty_input_needs_one_byte() {
        assert_eq!(parse(&[]).unwrap(), ParseOutcome::NeedMore(1));
    }

    #[test]
    fn test_ack_completes_on_first_byte() {
        assert_eq!(
            parse(&[FRAME_ACK_START]).unwrap(),
            ParseOutcome::Complete(Frame::Ack)
        );
    }

    #[test]
    fn test_unknown_start_byte_is_invalid() {
        assert_eq!(parse(&[0x42]), Err(FrameError::InvalidStart(0x42)));
    }

    #[test]
    fn test_short_frame_need_counts() {
        let bytes = packed(&Frame::req_ud2(1));
        assert_eq!(parse(&bytes[..1]).unwrap(), ParseOutcome::NeedMore(4));
        assert_eq!(parse(&bytes[..3]).unwrap(), ParseOutcome::NeedMore(2));
        assert_eq!(
            parse(&bytes).unwrap(),
            ParseOutcome::Complete(Frame::req_ud2(1))
        );
    }

    #[test]
    fn test_short_frame_bad_checksum() {
        let mut bytes = packed(&Frame::req_ud2(1));
        bytes[3] ^= 0xFF;
        assert!(matches!(
            parse(&bytes),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_short_frame_bad_stop_byte() {
        let mut bytes = packed(&Frame::snd_nke(3));
        bytes[4] = 0x00;
        assert_eq!(parse(&bytes), Err(FrameError::InvalidStop(0x00)));
    }

    #[test]
    fn test_long_frame_need_counts() {
        let frame = Frame::Long {
            control: control::RSP_UD,
            address: 7,
            control_information: 0x72,
            data: vec![0xAA; 8],
        };
        let bytes = packed(&frame);
        assert_eq!(bytes.len(), 17);

        // header first, then the remainder once the length is known
        assert_eq!(parse(&bytes[..1]).unwrap(), ParseOutcome::NeedMore(3));
        assert_eq!(parse(&bytes[..4]).unwrap(), ParseOutcome::NeedMore(13));
        assert_eq!(parse(&bytes[..10]).unwrap(), ParseOutcome::NeedMore(7));
        assert_eq!(parse(&bytes).unwrap(), ParseOutcome::Complete(frame));
    }

    #[test]
    fn test_control_frame_roundtrip() {
        let frame = Frame::Control {
            control: control::SND_UD,
            address: 250,
            control_information: 0x51,
        };
        let bytes = packed(&frame);
        assert_eq!(parse(&bytes).unwrap(), ParseOutcome::Complete(frame));
    }

    #[test]
    fn test_long_frame_length_fields_must_agree() {
        let mut bytes = packed(&Frame::Long {
            control: control::RSP_UD,
            address: 1,
            control_information: 0x72,
            data: vec![1, 2],
        });
        bytes[2] = bytes[2].wrapping_add(1);
        assert!(matches!(
            parse(&bytes[..4]),
            Err(FrameError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_long_frame_second_start_byte() {
        let bytes = [0x68, 0x05, 0x05, 0x99];
        assert_eq!(parse(&bytes), Err(FrameError::InvalidSecondStart(0x99)));
    }

    #[test]
    fn test_long_frame_length_too_short() {
        let bytes = [0x68, 0x02, 0x02, 0x68];
        assert_eq!(parse(&bytes), Err(FrameError::LengthTooShort(0x02)));
    }

    #[test]
    fn test_long_frame_bad_checksum() {
        let mut bytes = packed(&Frame::Long {
            control: control::RSP_UD,
            address: 1,
            control_information: 0x72,
            data: vec![1, 2, 3, 4],
        });
        let checksum_at = bytes.len() - 2;
        bytes[checksum_at] ^= 0x01;
        assert!(matches!(
            parse(&bytes),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_largest_long_frame_roundtrip() {
        let frame = Frame::Long {
            control: control::RSP_UD,
            address: 42,
            control_information: 0x72,
            data: (0..=251).map(|i| i as u8).collect(),
        };
        let bytes = packed(&frame);
        assert_eq!(bytes.len(), crate::frame::MAX_FRAME_SIZE);
        assert_eq!(parse(&bytes).unwrap(), ParseOutcome::Complete(frame));
    }
}
