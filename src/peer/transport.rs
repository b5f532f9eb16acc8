//! Framing and gating for the established peer channel.
//!
//! Delivery is fire-and-forget: a send while the channel is closed is
//! silently dropped, never queued. That is harmless for the per-tick
//! position stream, but one-shot facts (character selection, health
//! baseline) must be re-announced when the channel opens.

use serde::Serialize;
use tracing::{debug, warn};

use super::protocol::{CharacterId, PeerMsg};

/// The underlying data channel as the transport sees it (in production a
/// WebRTC data channel; in tests a recording stub)
pub trait MessageSink {
    fn is_open(&self) -> bool;
    fn send_text(&mut self, text: String);
}

/// Typed message framing over a [`MessageSink`]
pub struct PeerTransport<S: MessageSink> {
    sink: S,
}

impl<S: MessageSink> PeerTransport<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// True once the underlying channel is open
    pub fn is_open(&self) -> bool {
        self.sink.is_open()
    }

    /// Send a message if the channel is open, drop it silently otherwise
    pub fn send(&mut self, msg: &PeerMsg) {
        if !self.sink.is_open() {
            debug!("Channel not open, dropping outbound message");
            return;
        }
        match serde_json::to_string(msg) {
            Ok(json) => self.sink.send_text(json),
            Err(e) => warn!(error = %e, "Failed to encode peer message"),
        }
    }

    /// Send every message in order, with the same drop-when-closed rule
    pub fn send_all(&mut self, msgs: &[PeerMsg]) {
        for msg in msgs {
            self.send(msg);
        }
    }

    /// Re-announce the one-shot facts when the channel opens: the character
    /// selection (if one was made before open, that send was dropped) and
    /// the health baseline so the peer's view is correct before any damage.
    pub fn announce_open(&mut self, character: Option<CharacterId>, hp: f32) {
        if let Some(character) = character {
            self.send(&PeerMsg::Char { character });
        }
        self.send(&PeerMsg::HpSync { hp });
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

/// Decode one inbound frame. Unknown `type` tags and malformed payloads are
/// ignored, per the protocol's drop-don't-propagate error model.
pub fn decode(raw: &str) -> Option<PeerMsg> {
    match serde_json::from_str(raw) {
        Ok(msg) => Some(msg),
        Err(_) => {
            debug!("Ignoring unrecognized peer payload");
            None
        }
    }
}

/// Encode a message to its wire form (used by callers that manage their own
/// channel, e.g. a browser-side binding)
pub fn encode<T: Serialize>(msg: &T) -> Option<String> {
    serde_json::to_string(msg).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::protocol::HpTarget;

    /// Records sent frames; open state is flipped by the test
    #[derive(Default)]
    struct RecordingSink {
        open: bool,
        sent: Vec<String>,
    }

    impl MessageSink for RecordingSink {
        fn is_open(&self) -> bool {
            self.open
        }

        fn send_text(&mut self, text: String) {
            self.sent.push(text);
        }
    }

    #[test]
    fn send_is_dropped_while_closed() {
        let mut transport = PeerTransport::new(RecordingSink::default());
        transport.send(&PeerMsg::Pos { x: 1.0, y: 2.0 });
        assert!(transport.sink().sent.is_empty());

        transport.sink_mut().open = true;
        transport.send(&PeerMsg::Pos { x: 1.0, y: 2.0 });
        assert_eq!(transport.sink().sent.len(), 1);
    }

    #[test]
    fn announce_open_resends_char_and_hp_baseline() {
        let mut transport = PeerTransport::new(RecordingSink {
            open: true,
            sent: Vec::new(),
        });
        transport.announce_open(Some(CharacterId::Mila), 100.0);

        let sent = &transport.sink().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(decode(&sent[0]), Some(PeerMsg::Char { character: CharacterId::Mila }));
        assert_eq!(decode(&sent[1]), Some(PeerMsg::HpSync { hp: 100.0 }));
    }

    #[test]
    fn announce_open_without_selection_sends_only_hp() {
        let mut transport = PeerTransport::new(RecordingSink {
            open: true,
            sent: Vec::new(),
        });
        transport.announce_open(None, 90.0);
        assert_eq!(transport.sink().sent.len(), 1);
    }

    #[test]
    fn unknown_type_is_ignored() {
        assert_eq!(decode(r#"{"type":"emote","id":"wave"}"#), None);
        assert_eq!(decode("garbage"), None);
    }

    #[test]
    fn known_messages_decode() {
        let msg = decode(r#"{"type":"hp_update","target":"you","hp":55}"#).unwrap();
        assert_eq!(
            msg,
            PeerMsg::HpUpdate {
                target: HpTarget::You,
                hp: 55.0,
                knockback: None,
            }
        );
    }
}
