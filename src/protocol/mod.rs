//! OFTP session negotiation, flow control and lifecycle management.
//!
//! Implements the ODETTE File Transfer Protocol session engine: parameter
//! negotiation at session start, credit-based flow control during file
//! transmission, and unambiguous session termination.
//!
//! # Protocol Overview
//!
//! OFTP is command/response: every inbound protocol data unit maps to at
//! most one outbound unit. A session runs over one connection and is
//! negotiated once, up front.
//!
//! ## Command Flow
//!
//! ```text
//! Initiator                         Responder
//!    |                                  |
//!    |<-------- SSRM (ready) ----------|  Responder greets on connect
//!    |--------- SSID (proposal) ------>|  Initiator proposes parameters
//!    |<-------- SSID (negotiated) -----|  Responder answers with minimums
//!    |                                  |
//!    |--------- SFID (file start) ---->|
//!    |<-------- SFPA (count=0) --------|
//!    |========= DATA x credit ========>|
//!    |<-------- CDT (new window) ------|
//!    |========= DATA ... =============>|
//!    |--------- EFID (file end) ------>|
//!    |<-------- EFPA (no error) -------|
//!    |                                  |
//!    |--------- ESID (reason=0) ------>|  Either side terminates
//! ```
//!
//! ## State Machine
//!
//! | State           | Meaning                              | Transitions              |
//! |-----------------|--------------------------------------|--------------------------|
//! | `AwaitingStart` | Connection up, nothing negotiated    | → Active, Ended          |
//! | `Active`        | Parameters negotiated                | → InTransfer, Ended      |
//! | `InTransfer`    | File transmission running            | → Ended                  |
//! | `Ended`         | Session over, close the connection   | (terminal)               |
//!
//! ## Negotiation
//!
//! Both sides declare a protocol level, a data exchange buffer size and a
//! credit window. The effective session value for each is the pairwise
//! minimum, so neither side ever operates beyond what it declared.
//! Identity and credentials are never taken from the peer.
//!
//! ## Session End Reasons
//!
//! | Code | Meaning                         |
//! |------|---------------------------------|
//! | 0    | Normal termination              |
//! | 1    | Command not recognised          |
//! | 2    | Protocol sequence violation     |
//! | 3    | User code not known             |
//! | 4    | Invalid password                |
//! | 10   | Incompatible protocol level     |

mod command;
mod negotiate;
mod session;

pub use command::{
    Command, Disposition, EndReason, FileEndParams, FileStartParams, SessionStartParams,
    TransferCapability,
};
pub use negotiate::SessionConfiguration;
pub use session::{Session, SessionLifecycle, SessionStats};

/// The single protocol level this engine speaks.
pub const OFTP_LEVEL: u32 = 5;

/// Default data exchange buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: u32 = 2048;

/// Default credit window in data units.
pub const DEFAULT_CREDIT: u64 = 7;
