//! Signaling wire types
//! These are the relay-carried setup messages; field names match the JSON
//! a browser WebRTC stack produces, so either end may be a browser.

use serde::{Deserialize, Serialize};

/// A session description produced by one side of the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// "offer" or "answer"
    #[serde(rename = "type")]
    pub sdp_type: String,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: "offer".to_string(),
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: "answer".to_string(),
            sdp: sdp.into(),
        }
    }
}

/// A transport candidate gathered during negotiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u32>,
}

/// Messages exchanged over the relay channel.
/// The wire shape is `{"offer": ...}`, `{"answer": ...}` or
/// `{"candidate": ...}` - disambiguated by field name, not by tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalMsg {
    Offer { offer: SessionDescription },
    Answer { answer: SessionDescription },
    Candidate { candidate: IceCandidate },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_round_trips_with_browser_field_names() {
        let msg = SignalMsg::Offer {
            offer: SessionDescription::offer("v=0 fake-sdp"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"offer\""));
        assert!(json.contains("\"type\":\"offer\""));

        let back: SignalMsg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn candidate_uses_camel_case_fields() {
        let raw = r#"{"candidate":{"candidate":"candidate:1 1 udp 2113937151 192.168.0.7 50000 typ host","sdpMid":"0","sdpMLineIndex":0}}"#;
        let msg: SignalMsg = serde_json::from_str(raw).unwrap();
        match msg {
            SignalMsg::Candidate { candidate } => {
                assert_eq!(candidate.sdp_mid.as_deref(), Some("0"));
                assert_eq!(candidate.sdp_m_line_index, Some(0));
            }
            other => panic!("expected candidate, got {:?}", other),
        }
    }

    #[test]
    fn offer_and_answer_do_not_cross_parse() {
        let raw = r#"{"answer":{"type":"answer","sdp":"v=0"}}"#;
        let msg: SignalMsg = serde_json::from_str(raw).unwrap();
        assert!(matches!(msg, SignalMsg::Answer { .. }));
    }
}
