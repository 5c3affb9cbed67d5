//! Exchange buffer encoding and decoding.
//!
//! Every OFTP command travels as one exchange buffer: a command identifier
//! byte followed by fixed-position ASCII fields (text fields space padded,
//! numeric fields zero padded). The engine never sees these bytes; the
//! transport runs them through [`frame::OftpFrameCodec`], which also adds
//! the stream transmission header.
//!
//! # Buffer Layouts
//!
//! | Id  | Command       | Fields                                                          |
//! |-----|---------------|-----------------------------------------------------------------|
//! | `I` | SessionReady  | message(17) CR                                                  |
//! | `X` | SessionStart  | lev(1) code(25) pswd(8) sdeb(5) sr(1) cmpr(1) rest(1) spec(1) cred(3) auth(1) rsv1(4) user(8) CR |
//! | `F` | SessionEnd    | reas(2) reasl(3) reast(reasl) CR                                |
//! | `H` | FileStart     | dsn(26) date(8) time(6) orig(25) dest(25) rest(17)              |
//! | `2` | FileStartAck  | acnt(17)                                                        |
//! | `D` | Data          | payload (opaque, rest of buffer)                                |
//! | `C` | CreditGrant   | -                                                               |
//! | `T` | FileEnd       | rcnt(17) ucnt(17)                                               |
//! | `4` | FileEndAck    | cd(1)                                                           |
//! | `R` | ChangeDirection | -                                                             |
//!
//! The wire uses the same `X` identifier for the initiator's proposal and
//! the responder's negotiated answer; which `Command` variant a decoded
//! buffer becomes is decided by the [`CodecRole`] of the decoding side.

mod fields;
pub mod frame;

pub use frame::OftpFrameCodec;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{OftpError, Result};
use crate::protocol::{
    Command, Disposition, EndReason, FileEndParams, FileStartParams, SessionStartParams,
    TransferCapability,
};
use fields::{FieldReader, FieldWriter};

/// Which session role a codec decodes for.
///
/// A responder reads `X` buffers as proposals, an initiator reads them as
/// negotiated answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecRole {
    /// This side opened the connection and proposes parameters.
    Initiator,
    /// This side accepted the connection and answers proposals.
    Responder,
}

const ID_SESSION_READY: u8 = b'I';
const ID_SESSION_START: u8 = b'X';
const ID_SESSION_END: u8 = b'F';
const ID_FILE_START: u8 = b'H';
const ID_FILE_START_ACK: u8 = b'2';
const ID_DATA: u8 = b'D';
const ID_CREDIT_GRANT: u8 = b'C';
const ID_FILE_END: u8 = b'T';
const ID_FILE_END_ACK: u8 = b'4';
const ID_CHANGE_DIRECTION: u8 = b'R';

const READY_MESSAGE: &str = "ODETTE FTP READY ";
const CR: u8 = 0x0D;

/// Encode a command into an exchange buffer.
pub fn encode_command(command: &Command, buf: &mut BytesMut) -> Result<()> {
    match command {
        Command::SessionReady => {
            buf.put_u8(ID_SESSION_READY);
            buf.put_slice(READY_MESSAGE.as_bytes());
            buf.put_u8(CR);
        }
        Command::SessionStart(params) | Command::SessionStartAck(params) => {
            buf.put_u8(ID_SESSION_START);
            encode_start_params(params, buf)?;
        }
        Command::SessionEnd {
            reason,
            reason_text,
        } => {
            buf.put_u8(ID_SESSION_END);
            let mut w = FieldWriter::new(buf);
            w.num(u64::from(reason.code()), 2)?;
            w.num(reason_text.len() as u64, 3)?;
            w.raw(reason_text.as_bytes());
            buf.put_u8(CR);
        }
        Command::FileStart(params) => {
            buf.put_u8(ID_FILE_START);
            let mut w = FieldWriter::new(buf);
            w.text(&params.dataset, 26);
            w.text(&params.date, 8);
            w.text(&params.time, 6);
            w.text(&params.originator, 25);
            w.text(&params.destination, 25);
            w.num(params.restart_position, 17)?;
        }
        Command::FileStartAck { answer_count } => {
            buf.put_u8(ID_FILE_START_ACK);
            FieldWriter::new(buf).num(*answer_count, 17)?;
        }
        Command::Data { payload } => {
            buf.put_u8(ID_DATA);
            buf.put_slice(payload);
        }
        Command::CreditGrant => buf.put_u8(ID_CREDIT_GRANT),
        Command::FileEnd(params) => {
            buf.put_u8(ID_FILE_END);
            let mut w = FieldWriter::new(buf);
            w.num(params.record_count, 17)?;
            w.num(params.unit_count, 17)?;
        }
        Command::FileEndAck { disposition } => {
            buf.put_u8(ID_FILE_END_ACK);
            buf.put_u8(disposition.as_char() as u8);
        }
        Command::ChangeDirection => buf.put_u8(ID_CHANGE_DIRECTION),
    }
    Ok(())
}

/// Decode one complete exchange buffer into a command.
pub fn decode_command(buf: &[u8], role: CodecRole) -> Result<Command> {
    let (&id, body) = buf
        .split_first()
        .ok_or_else(|| OftpError::Codec("empty exchange buffer".to_string()))?;

    match id {
        ID_SESSION_READY => Ok(Command::SessionReady),
        ID_SESSION_START => {
            let params = decode_start_params(body)?;
            match role {
                CodecRole::Responder => Ok(Command::SessionStart(params)),
                CodecRole::Initiator => Ok(Command::SessionStartAck(params)),
            }
        }
        ID_SESSION_END => {
            let mut r = FieldReader::new(body);
            let reason = EndReason::from_code(r.num(2)? as u8);
            let text_len = r.num(3)? as usize;
            let reason_text = r.text(text_len)?;
            Ok(Command::SessionEnd {
                reason,
                reason_text,
            })
        }
        ID_FILE_START => {
            let mut r = FieldReader::new(body);
            Ok(Command::FileStart(FileStartParams {
                dataset: r.text(26)?,
                date: r.text(8)?,
                time: r.text(6)?,
                originator: r.text(25)?,
                destination: r.text(25)?,
                restart_position: r.num(17)?,
            }))
        }
        ID_FILE_START_ACK => Ok(Command::FileStartAck {
            answer_count: FieldReader::new(body).num(17)?,
        }),
        ID_DATA => Ok(Command::Data {
            payload: Bytes::copy_from_slice(body),
        }),
        ID_CREDIT_GRANT => Ok(Command::CreditGrant),
        ID_FILE_END => {
            let mut r = FieldReader::new(body);
            Ok(Command::FileEnd(FileEndParams {
                record_count: r.num(17)?,
                unit_count: r.num(17)?,
            }))
        }
        ID_FILE_END_ACK => {
            let c = FieldReader::new(body).ch()?;
            let disposition = Disposition::from_char(c)
                .ok_or_else(|| OftpError::Codec(format!("invalid disposition '{c}'")))?;
            Ok(Command::FileEndAck { disposition })
        }
        ID_CHANGE_DIRECTION => Ok(Command::ChangeDirection),
        other => Err(OftpError::Codec(format!(
            "unknown command identifier 0x{other:02X}"
        ))),
    }
}

fn encode_start_params(params: &SessionStartParams, buf: &mut BytesMut) -> Result<()> {
    let mut w = FieldWriter::new(buf);
    w.num(u64::from(params.level), 1)?;
    w.text(&params.user_code, 25);
    w.text(&params.password, 8);
    w.num(u64::from(params.buffer_size), 5)?;
    w.ch(params.capabilities.as_char());
    w.flag(params.compression);
    w.flag(params.restart);
    w.flag(params.special_logic);
    w.num(params.credit, 3)?;
    w.flag(params.authentication);
    w.text(&params.reserved, 4);
    w.text(&params.user_data, 8);
    buf.put_u8(CR);
    Ok(())
}

fn decode_start_params(body: &[u8]) -> Result<SessionStartParams> {
    let mut r = FieldReader::new(body);
    let level = r.num(1)? as u32;
    let user_code = r.text(25)?;
    let password = r.text(8)?;
    let buffer_size = r.num(5)? as u32;
    let capabilities_char = r.ch()?;
    let capabilities = TransferCapability::from_char(capabilities_char)
        .ok_or_else(|| OftpError::Codec(format!("invalid capability '{capabilities_char}'")))?;
    Ok(SessionStartParams {
        level,
        user_code,
        password,
        buffer_size,
        capabilities,
        compression: r.flag()?,
        restart: r.flag()?,
        special_logic: r.flag()?,
        credit: r.num(3)?,
        authentication: r.flag()?,
        reserved: r.text(4)?,
        user_data: r.text(8)?,
    })
}
