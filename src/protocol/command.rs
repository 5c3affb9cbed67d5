//! Protocol commands exchanged between OFTP peers.
//!
//! One `Command` variant per protocol data unit. The engine dispatches on
//! variant identity alone; field contents only matter to the negotiator
//! (session start) and to the codec.

use bytes::Bytes;

/// A single OFTP protocol data unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ready greeting sent by the responder once the connection is up (SSRM).
    SessionReady,
    /// Session start proposal from the initiator (SSID).
    SessionStart(SessionStartParams),
    /// Negotiated session start answer from the responder (SSID echo).
    SessionStartAck(SessionStartParams),
    /// Session termination with a reason (ESID).
    SessionEnd {
        /// Why the session is ending.
        reason: EndReason,
        /// Optional free-text detail.
        reason_text: String,
    },
    /// Start of a virtual file transmission (SFID).
    FileStart(FileStartParams),
    /// Positive answer to a file start (SFPA).
    FileStartAck {
        /// Count of data units already received, for restart (0 on a fresh transfer).
        answer_count: u64,
    },
    /// One opaque chunk of file content (DATA).
    Data {
        /// Raw payload, at most the negotiated buffer size.
        payload: Bytes,
    },
    /// Credit grant resetting the sender's transmit window (CDT).
    CreditGrant,
    /// End of a virtual file transmission (EFID).
    FileEnd(FileEndParams),
    /// Positive answer to a file end (EFPA).
    FileEndAck {
        /// Completion disposition reported to the sender.
        disposition: Disposition,
    },
    /// Request to switch the speaker role (CD).
    ChangeDirection,
}

impl Command {
    /// Create a `SessionEnd` with a reason and detail text.
    pub fn session_end(reason: EndReason, reason_text: impl Into<String>) -> Self {
        Self::SessionEnd {
            reason,
            reason_text: reason_text.into(),
        }
    }

    /// Create a `FileStartAck` acknowledging from the given unit count.
    pub fn file_start_ack(answer_count: u64) -> Self {
        Self::FileStartAck { answer_count }
    }

    /// Create a `FileEndAck` with the given disposition.
    pub fn file_end_ack(disposition: Disposition) -> Self {
        Self::FileEndAck { disposition }
    }

    /// Create a `Data` command from a payload chunk.
    pub fn data(payload: impl Into<Bytes>) -> Self {
        Self::Data {
            payload: payload.into(),
        }
    }
}

/// Fields carried by a session start proposal or its negotiated answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStartParams {
    /// Protocol level the peer offers.
    pub level: u32,
    /// Identification code of the peer.
    pub user_code: String,
    /// Password matching the identification code.
    pub password: String,
    /// Data exchange buffer size in bytes.
    pub buffer_size: u32,
    /// Whether the peer can send, receive, or both.
    pub capabilities: TransferCapability,
    /// Buffer compression offered.
    pub compression: bool,
    /// Restart of interrupted transfers offered.
    pub restart: bool,
    /// Special logic (block envelopes) offered.
    pub special_logic: bool,
    /// Credit window: data units allowed before a grant is required.
    pub credit: u64,
    /// Secure authentication offered.
    pub authentication: bool,
    /// Reserved field, carried verbatim.
    pub reserved: String,
    /// Free-form user data, carried verbatim.
    pub user_data: String,
}

/// Transfer direction a peer declares support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferCapability {
    /// Can only send files.
    Sender,
    /// Can only receive files.
    Receiver,
    /// Can do either.
    #[default]
    Both,
}

impl TransferCapability {
    /// Wire character for this capability.
    pub fn as_char(self) -> char {
        match self {
            Self::Sender => 'S',
            Self::Receiver => 'R',
            Self::Both => 'B',
        }
    }

    /// Parse the wire character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(Self::Sender),
            'R' => Some(Self::Receiver),
            'B' => Some(Self::Both),
            _ => None,
        }
    }
}

/// Reason codes carried by a `SessionEnd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Normal session termination.
    Normal,
    /// A command was received that the peer does not recognise.
    CommandNotRecognised,
    /// A command arrived in a state where it is not allowed.
    ProtocolViolation,
    /// The identification code is not known.
    UserCodeNotKnown,
    /// The password does not match the identification code.
    InvalidPassword,
    /// The proposed protocol level is not supported.
    IncompatibleLevel,
    /// Any other reason code received from a peer.
    Other(u8),
}

impl EndReason {
    /// Numeric reason code on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::CommandNotRecognised => 1,
            Self::ProtocolViolation => 2,
            Self::UserCodeNotKnown => 3,
            Self::InvalidPassword => 4,
            Self::IncompatibleLevel => 10,
            Self::Other(code) => code,
        }
    }

    /// Map a wire reason code back to a variant.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Normal,
            1 => Self::CommandNotRecognised,
            2 => Self::ProtocolViolation,
            3 => Self::UserCodeNotKnown,
            4 => Self::InvalidPassword,
            10 => Self::IncompatibleLevel,
            other => Self::Other(other),
        }
    }
}

/// Completion disposition carried by a `FileEndAck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The file was received without error.
    NoError,
    /// The file could not be committed; the sender must assume failure.
    Error,
}

impl Disposition {
    /// Wire character for this disposition.
    pub fn as_char(self) -> char {
        match self {
            Self::NoError => 'N',
            Self::Error => 'E',
        }
    }

    /// Parse the wire character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'N' => Some(Self::NoError),
            'E' => Some(Self::Error),
            _ => None,
        }
    }
}

/// Fields describing the virtual file a sender is about to transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStartParams {
    /// Dataset name of the virtual file.
    pub dataset: String,
    /// File qualifier date, `CCYYMMDD`.
    pub date: String,
    /// File qualifier time, `HHMMSS`.
    pub time: String,
    /// Identification code of the originator.
    pub originator: String,
    /// Identification code of the final destination.
    pub destination: String,
    /// Restart position; 0 for a transfer from the beginning.
    pub restart_position: u64,
}

impl FileStartParams {
    /// Describe a fresh transfer of `dataset`, stamped with the current time.
    pub fn new(
        dataset: impl Into<String>,
        originator: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            dataset: dataset.into(),
            date: now.format("%Y%m%d").to_string(),
            time: now.format("%H%M%S").to_string(),
            originator: originator.into(),
            destination: destination.into(),
            restart_position: 0,
        }
    }
}

/// Fields closing a virtual file transmission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileEndParams {
    /// Number of records in the transmitted file (0 for unstructured files).
    pub record_count: u64,
    /// Number of data units the file was carried in.
    pub unit_count: u64,
}
