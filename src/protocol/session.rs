//! Per-connection session state and the protocol engine.
//!
//! A [`Session`] is owned by exactly one connection task and mutated only
//! through [`Session::process_command`], which maps every inbound command
//! to at most one outbound command plus state changes. The engine itself
//! never touches the transport: the caller writes the returned command and
//! closes the connection once the lifecycle reaches
//! [`SessionLifecycle::Ended`].

use std::time::{Duration, Instant};

use super::command::{Command, Disposition, EndReason, FileStartParams, SessionStartParams};
use super::negotiate::SessionConfiguration;
use super::OFTP_LEVEL;

/// Lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifecycle {
    /// Connection is up, session start not yet negotiated.
    AwaitingStart,
    /// Parameters negotiated, no transfer in progress.
    Active,
    /// A file transmission has been started.
    InTransfer,
    /// Session is over; the connection should be closed.
    Ended,
}

/// One OFTP session, bound to one connection.
pub struct Session {
    /// Session ID for log correlation.
    id: String,
    /// Parameters this side is willing to accept.
    defaults: SessionConfiguration,
    /// Effective parameters, present once session start completed.
    negotiated: Option<SessionConfiguration>,
    /// Current lifecycle state.
    lifecycle: SessionLifecycle,
    /// Data units received since the last credit grant.
    window_units: u64,
    /// Start of the current file transmission.
    transfer_started: Option<Instant>,
    /// Duration of the most recently completed transmission.
    last_transfer: Option<Duration>,
    /// Commands received over the session lifetime.
    commands_received: u64,
    /// Commands produced over the session lifetime.
    commands_sent: u64,
    /// Data units received over the session lifetime.
    data_units_total: u64,
    /// Completed inbound file transmissions.
    files_received: u64,
}

impl Session {
    /// Create a session seeded with this side's default configuration.
    pub fn new(defaults: SessionConfiguration) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            defaults,
            negotiated: None,
            lifecycle: SessionLifecycle::AwaitingStart,
            window_units: 0,
            transfer_started: None,
            last_transfer: None,
            commands_received: 0,
            commands_sent: 0,
            data_units_total: 0,
            files_received: 0,
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the current lifecycle state.
    pub fn lifecycle(&self) -> SessionLifecycle {
        self.lifecycle
    }

    /// Check whether the session is over and the connection should close.
    pub fn is_ended(&self) -> bool {
        self.lifecycle == SessionLifecycle::Ended
    }

    /// Get the negotiated configuration, if session start completed.
    pub fn configuration(&self) -> Option<&SessionConfiguration> {
        self.negotiated.as_ref()
    }

    /// Duration of the most recently completed file transmission.
    pub fn last_transfer_elapsed(&self) -> Option<Duration> {
        self.last_transfer
    }

    /// Ready greeting the responder sends once its connection is up.
    pub fn create_session_ready(&mut self) -> Command {
        self.commands_sent += 1;
        Command::SessionReady
    }

    /// Session start proposal built from this side's defaults.
    pub fn create_session_start(&mut self) -> Command {
        self.commands_sent += 1;
        Command::SessionStart(self.defaults.to_params())
    }

    /// Start a file transmission as the sending side.
    pub fn create_file_start(&mut self, params: FileStartParams) -> Command {
        self.transfer_started = Some(Instant::now());
        self.lifecycle = SessionLifecycle::InTransfer;
        self.commands_sent += 1;
        Command::FileStart(params)
    }

    /// Terminate the session from this side.
    pub fn create_session_end(&mut self, reason: EndReason) -> Command {
        self.lifecycle = SessionLifecycle::Ended;
        self.commands_sent += 1;
        Command::session_end(reason, "")
    }

    /// Feed one inbound command through the state machine.
    ///
    /// Returns the command to send back, if any. The caller must close the
    /// connection once [`Session::is_ended`] reports true. All timing and
    /// warning output goes through `tracing`; the engine performs no I/O.
    pub fn process_command(&mut self, command: &Command) -> Option<Command> {
        self.commands_received += 1;
        tracing::debug!(session_id = %self.id, command = command_name(command), "command received");

        let response = match command {
            Command::SessionReady => Some(Command::SessionStart(self.defaults.to_params())),
            Command::SessionStart(params) => self.process_session_start(params),
            Command::SessionStartAck(params) => {
                self.adopt_negotiated(params);
                None
            }
            Command::SessionEnd { reason, reason_text } => {
                tracing::info!(
                    session_id = %self.id,
                    code = reason.code(),
                    text = %reason_text,
                    "session end received, closing connection"
                );
                self.lifecycle = SessionLifecycle::Ended;
                None
            }
            Command::FileStart(params) => self.process_file_start(params),
            Command::Data { .. } => self.process_data(),
            Command::FileEnd(_) => self.process_file_end(),
            Command::ChangeDirection => {
                // Speaker turnaround is not implemented; answer with a
                // normal session end carrying a placeholder text.
                Some(Command::session_end(EndReason::Normal, "DUMMY"))
            }
            // Sender-side: the end acknowledgement closes our transfer
            // timer; start acknowledgements and credit grants carry no
            // engine response (the transmitting side drives its window
            // from the negotiated credit and the arriving grants).
            Command::FileEndAck { .. } => {
                if let Some(started) = self.transfer_started {
                    let elapsed = started.elapsed();
                    self.last_transfer = Some(elapsed);
                    tracing::info!(
                        session_id = %self.id,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "file transmission complete"
                    );
                }
                None
            }
            Command::FileStartAck { .. } | Command::CreditGrant => None,
        };

        if response.is_some() {
            self.commands_sent += 1;
        }
        response
    }

    fn process_session_start(&mut self, params: &SessionStartParams) -> Option<Command> {
        if params.level != OFTP_LEVEL {
            tracing::warn!(
                session_id = %self.id,
                offered = params.level,
                supported = OFTP_LEVEL,
                "rejecting session start with incompatible level"
            );
            return Some(Command::session_end(EndReason::IncompatibleLevel, ""));
        }

        let negotiated = self.defaults.negotiate(params);
        let answer = negotiated.to_params();
        tracing::info!(
            session_id = %self.id,
            peer = %params.user_code,
            buffer_size = negotiated.buffer_size,
            credit = negotiated.credit,
            "session established"
        );
        self.negotiated = Some(negotiated);
        self.lifecycle = SessionLifecycle::Active;
        Some(Command::SessionStartAck(answer))
    }

    /// Initiator side: adopt the responder's negotiated answer.
    ///
    /// The answer is re-run through the same min-negotiation. On a correct
    /// responder this is the identity; on a faulty one it still caps every
    /// value at our own defaults.
    fn adopt_negotiated(&mut self, params: &SessionStartParams) {
        let negotiated = self.defaults.negotiate(params);
        tracing::info!(
            session_id = %self.id,
            peer = %params.user_code,
            buffer_size = negotiated.buffer_size,
            credit = negotiated.credit,
            "session established"
        );
        self.negotiated = Some(negotiated);
        self.lifecycle = SessionLifecycle::Active;
    }

    fn process_file_start(&mut self, params: &FileStartParams) -> Option<Command> {
        if self.negotiated.is_none() {
            return self.sequence_violation("file start before session start");
        }
        tracing::debug!(session_id = %self.id, dataset = %params.dataset, "file transmission starting");
        self.transfer_started = Some(Instant::now());
        self.lifecycle = SessionLifecycle::InTransfer;
        Some(Command::file_start_ack(0))
    }

    fn process_data(&mut self) -> Option<Command> {
        let Some(config) = self.negotiated.as_ref() else {
            return self.sequence_violation("data unit before session start");
        };

        self.data_units_total += 1;
        self.window_units += 1;
        if self.window_units == config.credit {
            // Window exhausted: grant a fresh one. The first unit after the
            // grant counts as 1 again, so a grant goes out exactly every
            // `credit` units.
            self.window_units = 0;
            Some(Command::CreditGrant)
        } else {
            None
        }
    }

    fn process_file_end(&mut self) -> Option<Command> {
        if self.negotiated.is_none() {
            return self.sequence_violation("file end before session start");
        }

        if let Some(started) = self.transfer_started {
            let elapsed = started.elapsed();
            self.last_transfer = Some(elapsed);
            tracing::info!(
                session_id = %self.id,
                elapsed_ms = elapsed.as_millis() as u64,
                "file transmission complete"
            );
        }
        self.files_received += 1;
        Some(Command::file_end_ack(Disposition::NoError))
    }

    /// A command arrived that is fatal in the current state: answer with a
    /// protocol-violation session end and close from this side.
    fn sequence_violation(&mut self, detail: &str) -> Option<Command> {
        tracing::warn!(session_id = %self.id, detail, "protocol sequence violation");
        self.lifecycle = SessionLifecycle::Ended;
        Some(Command::session_end(EndReason::ProtocolViolation, ""))
    }

    /// Get session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.id.clone(),
            lifecycle: self.lifecycle,
            commands_sent: self.commands_sent,
            commands_received: self.commands_received,
            data_units_received: self.data_units_total,
            files_received: self.files_received,
        }
    }
}

/// Session statistics.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Session ID.
    pub session_id: String,
    /// Lifecycle state at the time of the snapshot.
    pub lifecycle: SessionLifecycle,
    /// Commands produced.
    pub commands_sent: u64,
    /// Commands consumed.
    pub commands_received: u64,
    /// Data units received in total.
    pub data_units_received: u64,
    /// Completed inbound file transmissions.
    pub files_received: u64,
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::SessionReady => "SSRM",
        Command::SessionStart(_) => "SSID",
        Command::SessionStartAck(_) => "SSID+",
        Command::SessionEnd { .. } => "ESID",
        Command::FileStart(_) => "SFID",
        Command::FileStartAck { .. } => "SFPA",
        Command::Data { .. } => "DATA",
        Command::CreditGrant => "CDT",
        Command::FileEnd(_) => "EFID",
        Command::FileEndAck { .. } => "EFPA",
        Command::ChangeDirection => "CD",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FileEndParams;

    fn defaults() -> SessionConfiguration {
        SessionConfiguration::new("O0055LOCAL", "SECRET")
            .with_buffer_size(2048)
            .with_credit(3)
    }

    fn established() -> Session {
        let mut session = Session::new(defaults());
        let proposal = SessionConfiguration::new("O9999REMOTE", "REMOTEPW")
            .with_buffer_size(1024)
            .with_credit(5)
            .to_params();
        let ack = session.process_command(&Command::SessionStart(proposal));
        assert!(matches!(ack, Some(Command::SessionStartAck(_))));
        session
    }

    #[test]
    fn test_session_start_negotiates_and_activates() {
        let session = established();
        assert_eq!(session.lifecycle(), SessionLifecycle::Active);

        let config = session.configuration().unwrap();
        assert_eq!(config.level, 5);
        assert_eq!(config.buffer_size, 1024);
        assert_eq!(config.credit, 3);
        assert_eq!(config.user_code, "O0055LOCAL");
    }

    #[test]
    fn test_session_start_wrong_level_rejected() {
        let mut session = Session::new(defaults());
        let mut proposal = defaults().to_params();
        proposal.level = 3;

        let response = session.process_command(&Command::SessionStart(proposal));
        match response {
            Some(Command::SessionEnd { reason, .. }) => {
                assert_eq!(reason, EndReason::IncompatibleLevel);
                assert_eq!(reason.code(), 10);
            }
            other => panic!("expected session end, got {other:?}"),
        }
        assert!(session.configuration().is_none());
        assert_eq!(session.lifecycle(), SessionLifecycle::AwaitingStart);
    }

    #[test]
    fn test_credit_grant_on_window_boundary() {
        let mut session = established();
        session.process_command(&Command::FileStart(FileStartParams::new(
            "INVOICES",
            "O9999REMOTE",
            "O0055LOCAL",
        )));

        let payload = Command::data(vec![0u8; 16]);
        assert_eq!(session.process_command(&payload), None);
        assert_eq!(session.process_command(&payload), None);
        assert_eq!(
            session.process_command(&payload),
            Some(Command::CreditGrant)
        );
    }

    #[test]
    fn test_credit_window_cycles_without_drift() {
        let mut session = established();
        session.process_command(&Command::FileStart(FileStartParams::new(
            "INVOICES",
            "O9999REMOTE",
            "O0055LOCAL",
        )));

        let payload = Command::data(vec![0u8; 16]);
        for cycle in 0..4 {
            for unit in 0..2 {
                assert_eq!(
                    session.process_command(&payload),
                    None,
                    "cycle {cycle} unit {unit}"
                );
            }
            assert_eq!(
                session.process_command(&payload),
                Some(Command::CreditGrant)
            );
        }
        assert_eq!(session.stats().data_units_received, 12);
    }

    #[test]
    fn test_file_transmission_round() {
        let mut session = established();

        let ack = session.process_command(&Command::FileStart(FileStartParams::new(
            "INVOICES",
            "O9999REMOTE",
            "O0055LOCAL",
        )));
        assert_eq!(ack, Some(Command::file_start_ack(0)));
        assert_eq!(session.lifecycle(), SessionLifecycle::InTransfer);

        let ack = session.process_command(&Command::FileEnd(FileEndParams::default()));
        assert_eq!(ack, Some(Command::file_end_ack(Disposition::NoError)));
        assert!(session.last_transfer_elapsed().is_some());
        assert_eq!(session.stats().files_received, 1);
    }

    #[test]
    fn test_session_end_closes_without_response() {
        let mut session = established();
        let response = session.process_command(&Command::session_end(EndReason::Normal, "done"));
        assert_eq!(response, None);
        assert!(session.is_ended());
    }

    #[test]
    fn test_change_direction_answers_placeholder_end() {
        let mut session = established();
        let response = session.process_command(&Command::ChangeDirection);
        match response {
            Some(Command::SessionEnd {
                reason,
                reason_text,
            }) => {
                assert_eq!(reason, EndReason::Normal);
                assert_eq!(reason_text, "DUMMY");
            }
            other => panic!("expected session end, got {other:?}"),
        }
        // Placeholder answer does not end the session from this side.
        assert!(!session.is_ended());
    }

    #[test]
    fn test_data_before_session_start_is_fatal() {
        let mut session = Session::new(defaults());
        let response = session.process_command(&Command::data(vec![1, 2, 3]));
        match response {
            Some(Command::SessionEnd { reason, .. }) => {
                assert_eq!(reason, EndReason::ProtocolViolation);
            }
            other => panic!("expected session end, got {other:?}"),
        }
        assert!(session.is_ended());
    }

    #[test]
    fn test_session_ready_triggers_proposal() {
        let mut initiator = Session::new(defaults());
        let response = initiator.process_command(&Command::SessionReady);
        match response {
            Some(Command::SessionStart(params)) => {
                assert_eq!(params.user_code, "O0055LOCAL");
                assert_eq!(params.buffer_size, 2048);
            }
            other => panic!("expected session start, got {other:?}"),
        }
    }

    #[test]
    fn test_initiator_adopts_negotiated_answer() {
        let mut initiator = Session::new(defaults());
        let mut responder = Session::new(
            SessionConfiguration::new("O9999REMOTE", "REMOTEPW")
                .with_buffer_size(1024)
                .with_credit(5),
        );

        let proposal = initiator.process_command(&Command::SessionReady).unwrap();
        let ack = responder.process_command(&proposal).unwrap();
        assert_eq!(initiator.process_command(&ack), None);

        assert_eq!(initiator.lifecycle(), SessionLifecycle::Active);
        assert_eq!(responder.lifecycle(), SessionLifecycle::Active);

        let initiator_cfg = initiator.configuration().unwrap();
        let responder_cfg = responder.configuration().unwrap();
        assert_eq!(initiator_cfg.buffer_size, responder_cfg.buffer_size);
        assert_eq!(initiator_cfg.credit, responder_cfg.credit);
    }
}
