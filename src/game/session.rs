//! Per-peer session state: the local model of both players

use std::collections::HashMap;

use crate::peer::protocol::{CharacterId, Owner, ProjectileKind};

use super::characters::{DEFAULT_MAX_HEALTH, DEFAULT_MOVE_SPEED, CharacterStats};

/// 2D vector/position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector from `from` toward `to`; falls back to +x when the two
    /// points coincide
    pub fn toward(from: Vec2, to: Vec2) -> Vec2 {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 0.001 {
            return Vec2::new(1.0, 0.0);
        }
        Vec2::new(dx / len, dy / len)
    }

    pub fn scaled(self, factor: f32) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }

    pub fn offset(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn distance_to(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Playable area; fighters are clamped inside the margin
#[derive(Debug, Clone, Copy)]
pub struct ArenaBounds {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl ArenaBounds {
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.clamp(self.margin, self.width - self.margin),
            pos.y.clamp(self.margin, self.height - self.margin),
        )
    }

    /// Where the local fighter starts
    pub fn local_spawn(&self) -> Vec2 {
        Vec2::new(self.width * 0.2, self.height * 0.5)
    }

    /// Where the remote fighter is assumed to start
    pub fn remote_spawn(&self) -> Vec2 {
        Vec2::new(self.width * 0.8, self.height * 0.5)
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 32.0,
        }
    }
}

/// Map key for projectiles. Local and mirrored projectiles use independent
/// id counters, so the owner is part of the key: a peer's "7" can never
/// collide with our own "7".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectileKey {
    pub owner: Owner,
    pub id: String,
}

/// A live projectile
#[derive(Debug, Clone)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub pos: Vec2,
    /// Velocity in units per second
    pub vel: Vec2,
    /// Lifetime in milliseconds
    pub ttl_ms: u64,
    /// Creation timestamp (local clock, milliseconds)
    pub born_ms: u64,
}

impl Projectile {
    /// A projectile survives while (now - born) <= ttl
    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.born_ms) > self.ttl_ms
    }
}

/// The local model of the duel. Mutated only by the owning simulation;
/// consistency with the peer is eventual and message-driven.
#[derive(Debug)]
pub struct SessionState {
    pub local_char: Option<CharacterId>,
    pub local_pos: Vec2,
    pub local_hp: f32,
    pub local_max_hp: f32,
    pub local_move_speed: f32,

    pub remote_char: Option<CharacterId>,
    pub remote_pos: Vec2,
    pub remote_hp: f32,
    pub remote_max_hp: f32,

    pub projectiles: HashMap<ProjectileKey, Projectile>,
    next_projectile_id: u64,

    /// Earliest timestamps at which the next basic attack / skill may fire
    pub attack_ready_at_ms: u64,
    pub skill_ready_at_ms: u64,

    /// Last local attack action, drives the stealth timer
    pub last_attack_at_ms: Option<u64>,
    /// Last attack observed from the peer (via `spawn`), for remote stealth
    pub remote_last_attack_at_ms: Option<u64>,
}

impl SessionState {
    pub fn new(arena: &ArenaBounds) -> Self {
        Self {
            local_char: None,
            local_pos: arena.local_spawn(),
            local_hp: DEFAULT_MAX_HEALTH,
            local_max_hp: DEFAULT_MAX_HEALTH,
            local_move_speed: DEFAULT_MOVE_SPEED,
            remote_char: None,
            remote_pos: arena.remote_spawn(),
            remote_hp: DEFAULT_MAX_HEALTH,
            remote_max_hp: DEFAULT_MAX_HEALTH,
            projectiles: HashMap::new(),
            next_projectile_id: 1,
            attack_ready_at_ms: 0,
            skill_ready_at_ms: 0,
            last_attack_at_ms: None,
            remote_last_attack_at_ms: None,
        }
    }

    /// Apply a character selection to the local fighter
    pub fn set_local_character(&mut self, character: CharacterId) {
        let stats = CharacterStats::for_character(character);
        self.local_char = Some(character);
        self.local_max_hp = stats.max_health;
        self.local_hp = stats.max_health;
        self.local_move_speed = stats.move_speed;
    }

    /// Next id in the local projectile namespace
    pub fn allocate_projectile_id(&mut self) -> String {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        id.to_string()
    }

    /// Count of projectiles owned by the given side
    pub fn projectile_count(&self, owner: Owner) -> usize {
        self.projectiles.keys().filter(|k| k.owner == owner).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_positions_inside_margin() {
        let arena = ArenaBounds::default();
        let clamped = arena.clamp(Vec2::new(-50.0, 10_000.0));
        assert_eq!(clamped.x, 32.0);
        assert_eq!(clamped.y, 568.0);
    }

    #[test]
    fn projectile_ids_are_monotonic() {
        let arena = ArenaBounds::default();
        let mut state = SessionState::new(&arena);
        assert_eq!(state.allocate_projectile_id(), "1");
        assert_eq!(state.allocate_projectile_id(), "2");
    }

    #[test]
    fn projectile_lives_through_its_ttl_boundary() {
        let projectile = Projectile {
            kind: crate::peer::protocol::ProjectileKind::FyeroBasic,
            pos: Vec2::default(),
            vel: Vec2::default(),
            ttl_ms: 400,
            born_ms: 1_000,
        };
        assert!(!projectile.expired(1_400));
        assert!(projectile.expired(1_401));
    }

    #[test]
    fn toward_falls_back_when_points_coincide() {
        let unit = Vec2::toward(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0));
        assert_eq!(unit, Vec2::new(1.0, 0.0));
    }
}
