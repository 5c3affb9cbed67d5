//! Stream transmission framing for OFTP over TCP.
//!
//! Each exchange buffer is preceded by a four byte stream transmission
//! header: a version/flags byte (`0x10`) and a 24-bit big-endian length
//! that counts the header itself. [`OftpFrameCodec`] plugs into
//! `tokio_util::codec::Framed` so the transport reads and writes whole
//! [`Command`]s.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::{decode_command, encode_command, CodecRole};
use crate::error::{OftpError, Result};
use crate::protocol::Command;

/// Version nibble 1, flags 0.
const STH_VERSION: u8 = 0x10;

/// Header length in bytes.
const STH_LEN: usize = 4;

/// Upper bound on a frame; well above the largest negotiable exchange
/// buffer, far below the 16 MiB the length field could express.
const MAX_FRAME_LEN: usize = 1 << 20;

/// Frames commands with the OFTP stream transmission header.
#[derive(Debug, Clone, Copy)]
pub struct OftpFrameCodec {
    role: CodecRole,
}

impl OftpFrameCodec {
    /// Codec for the side that opened the connection.
    pub fn initiator() -> Self {
        Self {
            role: CodecRole::Initiator,
        }
    }

    /// Codec for the side that accepted the connection.
    pub fn responder() -> Self {
        Self {
            role: CodecRole::Responder,
        }
    }
}

impl Decoder for OftpFrameCodec {
    type Item = Command;
    type Error = OftpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Command>> {
        if src.len() < STH_LEN {
            return Ok(None);
        }

        if src[0] != STH_VERSION {
            return Err(OftpError::Codec(format!(
                "bad stream transmission header version 0x{:02X}",
                src[0]
            )));
        }

        let frame_len =
            ((src[1] as usize) << 16) | ((src[2] as usize) << 8) | (src[3] as usize);
        if frame_len <= STH_LEN {
            return Err(OftpError::Codec(format!(
                "frame length {frame_len} below header size"
            )));
        }
        if frame_len > MAX_FRAME_LEN {
            return Err(OftpError::Codec(format!(
                "frame length {frame_len} exceeds limit {MAX_FRAME_LEN}"
            )));
        }

        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(frame_len);
        frame.advance(STH_LEN);
        decode_command(&frame, self.role).map(Some)
    }
}

impl Encoder<Command> for OftpFrameCodec {
    type Error = OftpError;

    fn encode(&mut self, command: Command, dst: &mut BytesMut) -> Result<()> {
        let mut body = BytesMut::new();
        encode_command(&command, &mut body)?;

        let frame_len = body.len() + STH_LEN;
        if frame_len > MAX_FRAME_LEN {
            return Err(OftpError::Codec(format!(
                "frame length {frame_len} exceeds limit {MAX_FRAME_LEN}"
            )));
        }

        dst.reserve(frame_len);
        dst.put_u8(STH_VERSION);
        dst.put_u8((frame_len >> 16) as u8);
        dst.put_u8((frame_len >> 8) as u8);
        dst.put_u8(frame_len as u8);
        dst.put_slice(&body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_header_layout() {
        let mut codec = OftpFrameCodec::responder();
        let mut buf = BytesMut::new();
        codec.encode(Command::CreditGrant, &mut buf).unwrap();

        // 4-byte header + 1-byte exchange buffer
        assert_eq!(&buf[..], &[0x10, 0x00, 0x00, 0x05, b'C']);
    }

    #[test]
    fn test_partial_frame_waits_for_more() {
        let mut codec = OftpFrameCodec::responder();
        let mut wire = BytesMut::new();
        codec.encode(Command::ChangeDirection, &mut wire).unwrap();

        let mut partial = BytesMut::from(&wire[..3]);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&wire[3..]);
        assert_eq!(
            codec.decode(&mut partial).unwrap(),
            Some(Command::ChangeDirection)
        );
        assert!(partial.is_empty());
    }

    #[test]
    fn test_two_frames_in_one_read() {
        let mut codec = OftpFrameCodec::responder();
        let mut wire = BytesMut::new();
        codec.encode(Command::CreditGrant, &mut wire).unwrap();
        codec
            .encode(Command::data(vec![1u8, 2, 3]), &mut wire)
            .unwrap();

        assert_eq!(
            codec.decode(&mut wire).unwrap(),
            Some(Command::CreditGrant)
        );
        match codec.decode(&mut wire).unwrap() {
            Some(Command::Data { payload }) => assert_eq!(&payload[..], &[1, 2, 3]),
            other => panic!("expected data, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_version_byte_rejected() {
        let mut codec = OftpFrameCodec::responder();
        let mut buf = BytesMut::from(&[0x20, 0x00, 0x00, 0x05, b'C'][..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_undersized_length_rejected() {
        let mut codec = OftpFrameCodec::responder();
        let mut buf = BytesMut::from(&[0x10, 0x00, 0x00, 0x03][..]);
        assert!(codec.decode(&mut buf).is_err());
    }
}
