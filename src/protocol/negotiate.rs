//! Session configuration and parameter negotiation.
//!
//! A `SessionConfiguration` holds the parameters one side is willing to
//! run a session with. During session start the responder combines its
//! own defaults with the initiator's proposal; the result is the
//! configuration both sides operate under for the rest of the session.

use super::command::{SessionStartParams, TransferCapability};
use super::{DEFAULT_BUFFER_SIZE, DEFAULT_CREDIT, OFTP_LEVEL};

/// Negotiated or default parameters of one OFTP session.
///
/// The numeric fields (`level`, `buffer_size`, `credit`) never exceed
/// what either peer declared; [`SessionConfiguration::negotiate`] is the
/// only place they are computed and nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfiguration {
    /// Protocol level.
    pub level: u32,
    /// Own identification code, sent to the peer.
    pub user_code: String,
    /// Own password, sent to the peer.
    pub password: String,
    /// Data exchange buffer size in bytes.
    pub buffer_size: u32,
    /// Transfer direction capability.
    pub capabilities: TransferCapability,
    /// Buffer compression in use.
    pub compression: bool,
    /// Restart support in use.
    pub restart: bool,
    /// Special logic in use.
    pub special_logic: bool,
    /// Credit window size in data units.
    pub credit: u64,
    /// Secure authentication in use.
    pub authentication: bool,
    /// Reserved field, carried verbatim on the wire.
    pub reserved: String,
    /// Free-form user data, carried verbatim on the wire.
    pub user_data: String,
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            level: OFTP_LEVEL,
            user_code: String::new(),
            password: String::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            capabilities: TransferCapability::Both,
            compression: false,
            restart: false,
            special_logic: false,
            credit: DEFAULT_CREDIT,
            authentication: false,
            reserved: String::new(),
            user_data: String::new(),
        }
    }
}

impl SessionConfiguration {
    /// Create a configuration with the given identity and all other
    /// parameters at their defaults.
    pub fn new(user_code: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_code: user_code.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Set the data exchange buffer size.
    pub fn with_buffer_size(mut self, buffer_size: u32) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the credit window size.
    pub fn with_credit(mut self, credit: u64) -> Self {
        self.credit = credit;
        self
    }

    /// Set the transfer direction capability.
    pub fn with_capabilities(mut self, capabilities: TransferCapability) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Compute the effective configuration from these defaults and a
    /// peer's session start proposal.
    ///
    /// Identity and credential stay ours; `level`, `buffer_size` and
    /// `credit` become the pairwise minimum so neither side is asked to
    /// exceed its declared limits. The remaining capability fields are
    /// taken from the defaults; a richer intersection policy would slot
    /// in here if bilateral negotiation of those flags is ever needed.
    ///
    /// Pure and total: no side effects, no failure case. Format
    /// validation happened in the codec before the proposal got here.
    pub fn negotiate(&self, peer: &SessionStartParams) -> SessionConfiguration {
        SessionConfiguration {
            level: peer.level.min(self.level),
            user_code: self.user_code.clone(),
            password: self.password.clone(),
            buffer_size: peer.buffer_size.min(self.buffer_size),
            capabilities: self.capabilities,
            compression: self.compression,
            restart: self.restart,
            special_logic: self.special_logic,
            credit: peer.credit.min(self.credit),
            authentication: self.authentication,
            reserved: self.reserved.clone(),
            user_data: self.user_data.clone(),
        }
    }

    /// Express this configuration as the fields of a session start
    /// proposal or answer.
    pub fn to_params(&self) -> SessionStartParams {
        SessionStartParams {
            level: self.level,
            user_code: self.user_code.clone(),
            password: self.password.clone(),
            buffer_size: self.buffer_size,
            capabilities: self.capabilities,
            compression: self.compression,
            restart: self.restart,
            special_logic: self.special_logic,
            credit: self.credit,
            authentication: self.authentication,
            reserved: self.reserved.clone(),
            user_data: self.user_data.clone(),
        }
    }
}
