//! Link negotiation: the setup handshake that turns two relay clients into
//! a direct peer pair

pub mod messages;
pub mod negotiator;

pub use messages::{IceCandidate, SessionDescription, SignalMsg};
pub use negotiator::{LinkDriver, Negotiator, Role, HANDSHAKE_TIMEOUT_MS};
