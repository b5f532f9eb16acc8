//! Peer protocol message definitions
//! These are the wire types exchanged over the direct data channel once
//! negotiation completes

use serde::{Deserialize, Serialize};

/// Characters available in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterId {
    /// Lifesteal slashes and a knockback orb
    Mila,
    /// Tanky, aimed bullets and a radial nova
    Gustav,
    /// Fast melee fighter that fades to stealth between attacks
    Fyero,
}

/// Projectile kinds, one damage/effect profile each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    MilaSlash,
    MilaEnergy,
    GustavBasic,
    GustavNova,
    FyeroBasic,
    FyeroFlame,
}

/// Which peer's simulation a projectile damages, from the sender's
/// perspective. A projectile travels the wire as `self` and is mirrored on
/// the receiving side as `peer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    #[serde(rename = "self")]
    Local,
    #[serde(rename = "peer")]
    Remote,
}

impl Owner {
    /// The same projectile seen from the other peer's side
    pub fn flipped(self) -> Self {
        match self {
            Owner::Local => Owner::Remote,
            Owner::Remote => Owner::Local,
        }
    }
}

/// Who an `hp_update` is about, from the sender's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HpTarget {
    /// The sender itself (e.g. announcing a lifesteal heal)
    #[serde(rename = "you")]
    You,
    /// The sender's opponent, i.e. the receiver
    #[serde(rename = "enemy")]
    Enemy,
}

/// Displacement the attacker computed for a knockback hit. Shipped with the
/// new health so the victim applies the exact delta the attacker already
/// applied to its own view, keeping both simulations consistent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    pub dx: f32,
    pub dy: f32,
}

/// Messages exchanged between the two peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMsg {
    /// Sender's current position, resent every tick
    Pos { x: f32, y: f32 },

    /// Sender's chosen character
    Char {
        #[serde(rename = "char")]
        character: CharacterId,
    },

    /// A projectile the sender spawned; the receiver mirrors it with the
    /// owner flipped
    Spawn {
        id: String,
        kind: ProjectileKind,
        owner: Owner,
        x: f32,
        y: f32,
        /// Velocity in units per second
        vx: f32,
        vy: f32,
        /// Lifetime in milliseconds
        ttl: u64,
    },

    /// Authoritative new health for the named side, computed by the peer
    /// that detected the collision. The receiver applies it without
    /// recomputing damage.
    HpUpdate {
        target: HpTarget,
        hp: f32,
        #[serde(skip_serializing_if = "Option::is_none")]
        knockback: Option<Knockback>,
    },

    /// Sender's current health, announced once when the channel opens
    HpSync { hp: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_serializes_with_expected_tags() {
        let msg = PeerMsg::Spawn {
            id: "7".to_string(),
            kind: ProjectileKind::GustavBasic,
            owner: Owner::Local,
            x: 100.0,
            y: 200.0,
            vx: 360.0,
            vy: 0.0,
            ttl: 2000,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"spawn\""));
        assert!(json.contains("\"kind\":\"gustav_basic\""));
        assert!(json.contains("\"owner\":\"self\""));
    }

    #[test]
    fn char_field_uses_original_wire_name() {
        let msg = PeerMsg::Char {
            character: CharacterId::Fyero,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"char","char":"fyero"}"#);
    }

    #[test]
    fn hp_update_omits_absent_knockback() {
        let msg = PeerMsg::HpUpdate {
            target: HpTarget::Enemy,
            hp: 90.0,
            knockback: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("knockback"));
        assert!(json.contains("\"target\":\"enemy\""));
    }

    #[test]
    fn owner_flips_between_perspectives() {
        assert_eq!(Owner::Local.flipped(), Owner::Remote);
        assert_eq!(Owner::Remote.flipped(), Owner::Local);
    }
}
