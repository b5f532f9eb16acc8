//! Duel Arena - peer-to-peer two-player arena game.
//!
//! The crate splits into two halves:
//! - The **relay server** (`relay`, `http`, `app`, `config`): a minimal
//!   axum WebSocket service that pairs exactly two clients per room and
//!   forwards their opaque setup messages. It never interprets payloads.
//! - The **client session core** (`signal`, `peer`, `game`): the handshake
//!   state machine that turns two relay clients into a direct peer pair,
//!   the typed message transport over the established channel, and the
//!   locally simulated, message-reconciled combat loop.
//!
//! Both peers simulate independently; there is no authoritative server.
//! Damage authority follows projectile ownership: whichever side's
//! projectile connects computes the result and reports it.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod peer;
pub mod relay;
pub mod signal;
pub mod util;
