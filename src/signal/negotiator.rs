//! Handshake state machine for establishing the direct peer link.
//!
//! The relay delivers setup messages in whatever order they arrive, so a
//! candidate can show up before the description it depends on. The underlying
//! transport rejects candidates applied before a remote description is set;
//! the negotiator buffers them and drains the queue exactly once, FIFO, the
//! moment the description is accepted.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::messages::{IceCandidate, SessionDescription, SignalMsg};

/// How long a handshake may run before callers should abandon it.
/// Nothing retries on its own; a fresh negotiator is the only recovery.
pub const HANDSHAKE_TIMEOUT_MS: u64 = 30_000;

/// Which side of the handshake this participant plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Creates the data channel and sends the offer
    Initiator,
    /// Waits for an offer and answers it
    Responder,
}

/// The transport-negotiation engine the negotiator drives (in production a
/// WebRTC peer connection; in tests a mock). All operations are best-effort
/// from the negotiator's point of view.
pub trait LinkDriver {
    type Error: std::error::Error;

    /// Produce a local offer description (also set locally by the driver)
    fn create_offer(&mut self) -> Result<SessionDescription, Self::Error>;

    /// Produce a local answer description (also set locally by the driver)
    fn create_answer(&mut self) -> Result<SessionDescription, Self::Error>;

    /// Accept the remote side's description
    fn set_remote_description(&mut self, desc: &SessionDescription) -> Result<(), Self::Error>;

    /// Apply a remote transport candidate; invalid before a remote
    /// description is set
    fn add_candidate(&mut self, candidate: &IceCandidate) -> Result<(), Self::Error>;
}

/// Drives the offer/answer/candidate exchange for one participant
pub struct Negotiator<D: LinkDriver> {
    role: Role,
    driver: D,
    pending_candidates: VecDeque<IceCandidate>,
    remote_desc_set: bool,
    started_at_ms: u64,
}

impl<D: LinkDriver> Negotiator<D> {
    pub fn new(role: Role, driver: D, now_ms: u64) -> Self {
        Self {
            role,
            driver,
            pending_candidates: VecDeque::new(),
            remote_desc_set: false,
            started_at_ms: now_ms,
        }
    }

    /// Kick off the handshake. The initiator produces its offer here; the
    /// responder has nothing to do until an offer arrives.
    pub fn start(&mut self) -> Option<SignalMsg> {
        if self.role != Role::Initiator {
            return None;
        }
        match self.driver.create_offer() {
            Ok(offer) => Some(SignalMsg::Offer { offer }),
            Err(e) => {
                warn!(error = %e, "Failed to create offer");
                None
            }
        }
    }

    /// Handle one raw payload from the relay. Malformed payloads are
    /// dropped; the peer resending is the only retry path. Returns the
    /// outbound signal to relay back, if any.
    pub fn handle_relay_text(&mut self, raw: &str) -> Option<SignalMsg> {
        let msg: SignalMsg = match serde_json::from_str(raw) {
            Ok(msg) => msg,
            Err(_) => {
                debug!("Dropping malformed signaling payload");
                return None;
            }
        };
        self.handle_signal(msg)
    }

    /// Handle one already-decoded signaling message
    pub fn handle_signal(&mut self, msg: SignalMsg) -> Option<SignalMsg> {
        match msg {
            SignalMsg::Offer { offer } => self.handle_offer(offer),
            SignalMsg::Answer { answer } => {
                self.handle_answer(answer);
                None
            }
            SignalMsg::Candidate { candidate } => {
                self.handle_candidate(candidate);
                None
            }
        }
    }

    /// Wrap a locally-gathered candidate for the relay. Sent immediately;
    /// the remote side does its own queuing.
    pub fn local_candidate(&self, candidate: IceCandidate) -> SignalMsg {
        SignalMsg::Candidate { candidate }
    }

    /// True once the remote description has been accepted
    pub fn remote_description_set(&self) -> bool {
        self.remote_desc_set
    }

    /// True once the handshake deadline has passed without completing
    pub fn timed_out(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) > HANDSHAKE_TIMEOUT_MS
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn handle_offer(&mut self, offer: SessionDescription) -> Option<SignalMsg> {
        if self.role != Role::Responder {
            debug!("Initiator ignoring inbound offer");
            return None;
        }
        if self.remote_desc_set {
            debug!("Ignoring duplicate offer");
            return None;
        }

        if let Err(e) = self.driver.set_remote_description(&offer) {
            warn!(error = %e, "Failed to accept offer");
            return None;
        }
        self.remote_desc_set = true;
        self.drain_candidates();

        match self.driver.create_answer() {
            Ok(answer) => Some(SignalMsg::Answer { answer }),
            Err(e) => {
                warn!(error = %e, "Failed to create answer");
                None
            }
        }
    }

    fn handle_answer(&mut self, answer: SessionDescription) {
        if self.role != Role::Initiator {
            debug!("Responder ignoring inbound answer");
            return;
        }
        if self.remote_desc_set {
            debug!("Ignoring duplicate answer");
            return;
        }

        if let Err(e) = self.driver.set_remote_description(&answer) {
            warn!(error = %e, "Failed to accept answer");
            return;
        }
        self.remote_desc_set = true;
        self.drain_candidates();
    }

    fn handle_candidate(&mut self, candidate: IceCandidate) {
        if self.remote_desc_set {
            if let Err(e) = self.driver.add_candidate(&candidate) {
                debug!(error = %e, "Candidate application failed, ignoring");
            }
        } else {
            self.pending_candidates.push_back(candidate);
        }
    }

    /// FIFO drain of candidates that arrived before the remote description.
    /// Runs exactly once; afterwards the queue stays empty and candidates
    /// apply directly.
    fn drain_candidates(&mut self) {
        while let Some(candidate) = self.pending_candidates.pop_front() {
            if let Err(e) = self.driver.add_candidate(&candidate) {
                debug!(error = %e, "Queued candidate application failed, ignoring");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("mock driver failure")]
    struct MockError;

    /// Records every driver call so tests can assert ordering and counts
    #[derive(Default)]
    struct MockDriver {
        applied_candidates: Vec<String>,
        remote_descriptions: Vec<SessionDescription>,
        fail_candidate: Option<String>,
        fail_offer: bool,
    }

    impl LinkDriver for MockDriver {
        type Error = MockError;

        fn create_offer(&mut self) -> Result<SessionDescription, MockError> {
            if self.fail_offer {
                return Err(MockError);
            }
            Ok(SessionDescription::offer("offer-sdp"))
        }

        fn create_answer(&mut self) -> Result<SessionDescription, MockError> {
            Ok(SessionDescription::answer("answer-sdp"))
        }

        fn set_remote_description(
            &mut self,
            desc: &SessionDescription,
        ) -> Result<(), MockError> {
            self.remote_descriptions.push(desc.clone());
            Ok(())
        }

        fn add_candidate(&mut self, candidate: &IceCandidate) -> Result<(), MockError> {
            if self.fail_candidate.as_deref() == Some(candidate.candidate.as_str()) {
                return Err(MockError);
            }
            self.applied_candidates.push(candidate.candidate.clone());
            Ok(())
        }
    }

    fn cand(label: &str) -> IceCandidate {
        IceCandidate {
            candidate: label.to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_m_line_index: Some(0),
        }
    }

    #[test]
    fn initiator_start_emits_offer() {
        let mut neg = Negotiator::new(Role::Initiator, MockDriver::default(), 0);
        match neg.start() {
            Some(SignalMsg::Offer { offer }) => assert_eq!(offer.sdp, "offer-sdp"),
            other => panic!("expected offer, got {:?}", other),
        }
    }

    #[test]
    fn responder_start_is_silent() {
        let mut neg = Negotiator::new(Role::Responder, MockDriver::default(), 0);
        assert!(neg.start().is_none());
    }

    #[test]
    fn responder_answers_offer_and_marks_remote_set() {
        let mut neg = Negotiator::new(Role::Responder, MockDriver::default(), 0);
        let out = neg.handle_signal(SignalMsg::Offer {
            offer: SessionDescription::offer("remote-offer"),
        });
        assert!(matches!(out, Some(SignalMsg::Answer { .. })));
        assert!(neg.remote_description_set());
        assert_eq!(neg.driver().remote_descriptions.len(), 1);
    }

    #[test]
    fn queued_candidates_drain_fifo_exactly_once() {
        let mut neg = Negotiator::new(Role::Initiator, MockDriver::default(), 0);
        neg.start();

        // Candidates arrive over the relay before the answer
        for label in ["a", "b", "c"] {
            neg.handle_signal(SignalMsg::Candidate {
                candidate: cand(label),
            });
        }
        assert!(neg.driver().applied_candidates.is_empty());

        neg.handle_signal(SignalMsg::Answer {
            answer: SessionDescription::answer("remote-answer"),
        });
        assert_eq!(neg.driver().applied_candidates, vec!["a", "b", "c"]);

        // A duplicate answer must not re-apply anything
        neg.handle_signal(SignalMsg::Answer {
            answer: SessionDescription::answer("remote-answer"),
        });
        assert_eq!(neg.driver().remote_descriptions.len(), 1);
        assert_eq!(neg.driver().applied_candidates, vec!["a", "b", "c"]);

        // Late candidates now apply immediately
        neg.handle_signal(SignalMsg::Candidate {
            candidate: cand("d"),
        });
        assert_eq!(neg.driver().applied_candidates, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn failed_candidate_does_not_stop_the_drain() {
        let driver = MockDriver {
            fail_candidate: Some("b".to_string()),
            ..MockDriver::default()
        };
        let mut neg = Negotiator::new(Role::Responder, driver, 0);

        for label in ["a", "b", "c"] {
            neg.handle_signal(SignalMsg::Candidate {
                candidate: cand(label),
            });
        }
        neg.handle_signal(SignalMsg::Offer {
            offer: SessionDescription::offer("remote-offer"),
        });

        assert_eq!(neg.driver().applied_candidates, vec!["a", "c"]);
    }

    #[test]
    fn malformed_relay_payload_is_dropped() {
        let mut neg = Negotiator::new(Role::Responder, MockDriver::default(), 0);
        assert!(neg.handle_relay_text("not json at all").is_none());
        assert!(neg.handle_relay_text(r#"{"unrelated":1}"#).is_none());
        assert!(!neg.remote_description_set());
    }

    #[test]
    fn initiator_ignores_inbound_offer() {
        let mut neg = Negotiator::new(Role::Initiator, MockDriver::default(), 0);
        let out = neg.handle_signal(SignalMsg::Offer {
            offer: SessionDescription::offer("glare"),
        });
        assert!(out.is_none());
        assert!(neg.driver().remote_descriptions.is_empty());
    }

    #[test]
    fn handshake_times_out_after_deadline() {
        let neg = Negotiator::new(Role::Initiator, MockDriver::default(), 1_000);
        assert!(!neg.timed_out(1_000 + HANDSHAKE_TIMEOUT_MS));
        assert!(neg.timed_out(1_001 + HANDSHAKE_TIMEOUT_MS));
    }

    #[test]
    fn failed_offer_creation_is_swallowed() {
        let driver = MockDriver {
            fail_offer: true,
            ..MockDriver::default()
        };
        let mut neg = Negotiator::new(Role::Initiator, driver, 0);
        assert!(neg.start().is_none());
    }
}
