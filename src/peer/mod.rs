//! Peer transport: typed messages over the established direct link

pub mod protocol;
pub mod transport;

pub use protocol::{CharacterId, HpTarget, Knockback, Owner, PeerMsg, ProjectileKind};
pub use transport::{MessageSink, PeerTransport};
