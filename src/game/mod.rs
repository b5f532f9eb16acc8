//! Combat/movement simulation modules

pub mod characters;
pub mod session;
pub mod simulator;

pub use characters::{CharacterStats, KindStats, OnHit};
pub use session::{ArenaBounds, Projectile, ProjectileKey, SessionState, Vec2};
pub use simulator::{Outcome, Simulator, TickInput};
