//! Character and projectile stat tables

use crate::peer::protocol::{CharacterId, ProjectileKind};

/// Radius around a fighter within which a projectile connects
pub const HIT_RADIUS: f32 = 40.0;

/// Movement speed used before a character has been selected
pub const DEFAULT_MOVE_SPEED: f32 = 180.0;

/// Starting health used before a character has been selected
pub const DEFAULT_MAX_HEALTH: f32 = 100.0;

/// Per-character stats
#[derive(Debug, Clone, Copy)]
pub struct CharacterStats {
    /// Maximum health
    pub max_health: f32,
    /// Movement speed in units per second
    pub move_speed: f32,
    /// Basic attack cooldown (milliseconds)
    pub attack_cooldown_ms: u64,
    /// Skill cooldown (milliseconds)
    pub skill_cooldown_ms: u64,
    /// Idle time after the last attack before the character fades to
    /// stealth; None for characters without stealth
    pub stealth_after_ms: Option<u64>,
}

impl CharacterStats {
    pub fn for_character(character: CharacterId) -> Self {
        match character {
            CharacterId::Mila => Self {
                max_health: 100.0,
                move_speed: 180.0,
                attack_cooldown_ms: 500,
                skill_cooldown_ms: 5000,
                stealth_after_ms: None,
            },
            CharacterId::Gustav => Self {
                max_health: 120.0,
                move_speed: 150.0,
                attack_cooldown_ms: 500,
                skill_cooldown_ms: 5000,
                stealth_after_ms: None,
            },
            CharacterId::Fyero => Self {
                max_health: 90.0,
                move_speed: 200.0,
                attack_cooldown_ms: 500,
                skill_cooldown_ms: 5000,
                stealth_after_ms: Some(3000),
            },
        }
    }
}

/// Side effect applied when a projectile connects
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnHit {
    None,
    /// Heal the attacker by this amount, capped at max health
    Lifesteal(f32),
    /// Displace the victim this many units along the attacker->victim vector
    Knockback(f32),
}

/// Per-kind damage/effect profile
#[derive(Debug, Clone, Copy)]
pub struct KindStats {
    /// Damage per hit
    pub damage: f32,
    /// Travel speed in units per second (0 for static hitboxes)
    pub speed: f32,
    /// Lifetime in milliseconds
    pub ttl_ms: u64,
    /// On-hit side effect
    pub on_hit: OnHit,
}

impl KindStats {
    pub fn for_kind(kind: ProjectileKind) -> Self {
        match kind {
            ProjectileKind::MilaSlash => Self {
                damage: 8.0,
                speed: 0.0,
                ttl_ms: 200,
                on_hit: OnHit::Lifesteal(5.0),
            },
            ProjectileKind::MilaEnergy => Self {
                damage: 30.0,
                speed: 120.0,
                ttl_ms: 2500,
                on_hit: OnHit::Knockback(80.0),
            },
            ProjectileKind::GustavBasic => Self {
                damage: 10.0,
                speed: 360.0,
                ttl_ms: 2000,
                on_hit: OnHit::None,
            },
            ProjectileKind::GustavNova => Self {
                damage: 12.0,
                speed: 240.0,
                ttl_ms: 2200,
                on_hit: OnHit::None,
            },
            ProjectileKind::FyeroBasic => Self {
                damage: 10.0,
                speed: 0.0,
                ttl_ms: 400,
                on_hit: OnHit::None,
            },
            ProjectileKind::FyeroFlame => Self {
                damage: 20.0,
                speed: 0.0,
                ttl_ms: 700,
                on_hit: OnHit::None,
            },
        }
    }
}
