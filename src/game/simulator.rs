//! Per-peer combat/movement simulation.
//!
//! Both peers run this loop independently and reconcile through the peer
//! protocol. Authority is split by ownership: the side whose projectile
//! connects computes the damage (and any knockback displacement) and reports
//! the victim's new health; the victim applies it without recomputing.
//! Mirrored peer-owned projectiles are display-only here and expire by ttl.

use std::f32::consts::TAU;

use tracing::debug;

use crate::peer::protocol::{CharacterId, HpTarget, Knockback, Owner, PeerMsg, ProjectileKind};

use super::characters::{CharacterStats, KindStats, OnHit, HIT_RADIUS};
use super::session::{ArenaBounds, Projectile, ProjectileKey, SessionState, Vec2};

/// Joystick displacement for one tick, each axis in [-1, 1]
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub move_x: f32,
    pub move_y: f32,
}

/// Observational match result. Reaching a terminal state does not halt the
/// simulation or lock inputs; any lockout is left to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Victory,
    Defeat,
    Draw,
}

/// One peer's simulation controller
pub struct Simulator {
    state: SessionState,
    arena: ArenaBounds,
}

impl Simulator {
    pub fn new(arena: ArenaBounds) -> Self {
        Self {
            state: SessionState::new(&arena),
            arena,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn arena(&self) -> &ArenaBounds {
        &self.arena
    }

    /// Select the local character. Returns the `char` message for the caller
    /// to send now (dropped if the channel is closed) and to re-send on open.
    pub fn select_character(&mut self, character: CharacterId, now_ms: u64) -> PeerMsg {
        self.state.set_local_character(character);
        // Stealth counts idle time from selection until the first attack
        self.state.last_attack_at_ms = Some(now_ms);
        PeerMsg::Char { character }
    }

    /// Run one simulation step. `dt_secs` is the measured elapsed time since
    /// the previous tick; all velocities are units/second, so the simulation
    /// speed is independent of the caller's frame rate.
    pub fn tick(&mut self, now_ms: u64, dt_secs: f32, input: &TickInput) -> Vec<PeerMsg> {
        let mut out = Vec::new();
        let arena = self.arena;
        let state = &mut self.state;

        // Movement, clamped to the arena
        let step = Vec2::new(
            input.move_x.clamp(-1.0, 1.0) * state.local_move_speed * dt_secs,
            input.move_y.clamp(-1.0, 1.0) * state.local_move_speed * dt_secs,
        );
        state.local_pos = arena.clamp(state.local_pos.offset(step));

        // Position is broadcast every tick, unconditionally. Lost frames
        // before the channel opens are harmless: the next tick resends.
        out.push(PeerMsg::Pos {
            x: state.local_pos.x,
            y: state.local_pos.y,
        });

        // Expire, then advance surviving projectiles
        state.projectiles.retain(|_, p| !p.expired(now_ms));
        for projectile in state.projectiles.values_mut() {
            projectile.pos = projectile.pos.offset(projectile.vel.scaled(dt_secs));
        }

        // Only our own projectiles are collided here; damage from the
        // peer's projectiles arrives as hp_update messages.
        let remote_pos = state.remote_pos;
        let hits: Vec<(ProjectileKey, ProjectileKind)> = state
            .projectiles
            .iter()
            .filter(|(key, p)| {
                key.owner == Owner::Local && p.pos.distance_to(remote_pos) < HIT_RADIUS
            })
            .map(|(key, p)| (key.clone(), p.kind))
            .collect();

        for (key, kind) in hits {
            // Removing the projectile first guarantees a single hit per
            // projectile, never repeated damage while overlapping
            state.projectiles.remove(&key);

            let stats = KindStats::for_kind(kind);
            let mut knockback = None;

            match stats.on_hit {
                OnHit::Lifesteal(amount) => {
                    state.local_hp = (state.local_hp + amount).min(state.local_max_hp);
                    out.push(PeerMsg::HpUpdate {
                        target: HpTarget::You,
                        hp: state.local_hp,
                        knockback: None,
                    });
                }
                OnHit::Knockback(distance) => {
                    let delta =
                        Vec2::toward(state.local_pos, state.remote_pos).scaled(distance);
                    state.remote_pos = arena.clamp(state.remote_pos.offset(delta));
                    knockback = Some(Knockback {
                        dx: delta.x,
                        dy: delta.y,
                    });
                }
                OnHit::None => {}
            }

            state.remote_hp = (state.remote_hp - stats.damage).max(0.0);
            debug!(?kind, remote_hp = state.remote_hp, "Projectile connected");

            out.push(PeerMsg::HpUpdate {
                target: HpTarget::Enemy,
                hp: state.remote_hp,
                knockback,
            });
        }

        out
    }

    /// Trigger the basic attack. No-op while on cooldown or before a
    /// character is selected.
    pub fn basic_attack(&mut self, now_ms: u64) -> Vec<PeerMsg> {
        let Some(character) = self.state.local_char else {
            return Vec::new();
        };
        if now_ms < self.state.attack_ready_at_ms {
            return Vec::new();
        }

        let stats = CharacterStats::for_character(character);
        self.state.attack_ready_at_ms = now_ms + stats.attack_cooldown_ms;
        self.state.last_attack_at_ms = Some(now_ms);

        let facing = Vec2::toward(self.state.local_pos, self.state.remote_pos);
        let origin = self.state.local_pos;

        match character {
            CharacterId::Mila => {
                // Short-lived slash hitbox just in front of her
                vec![self.spawn_local(
                    ProjectileKind::MilaSlash,
                    origin.offset(facing.scaled(40.0)),
                    Vec2::default(),
                    now_ms,
                )]
            }
            CharacterId::Gustav => {
                // Bullet aimed at the last-known remote position
                let speed = KindStats::for_kind(ProjectileKind::GustavBasic).speed;
                vec![self.spawn_local(
                    ProjectileKind::GustavBasic,
                    origin,
                    facing.scaled(speed),
                    now_ms,
                )]
            }
            CharacterId::Fyero => vec![self.spawn_local(
                ProjectileKind::FyeroBasic,
                origin.offset(facing.scaled(30.0)),
                Vec2::default(),
                now_ms,
            )],
        }
    }

    /// Trigger the character skill. Same gating rules as the basic attack,
    /// on its own independent cooldown.
    pub fn skill(&mut self, now_ms: u64) -> Vec<PeerMsg> {
        let Some(character) = self.state.local_char else {
            return Vec::new();
        };
        if now_ms < self.state.skill_ready_at_ms {
            return Vec::new();
        }

        let stats = CharacterStats::for_character(character);
        self.state.skill_ready_at_ms = now_ms + stats.skill_cooldown_ms;
        self.state.last_attack_at_ms = Some(now_ms);

        let facing = Vec2::toward(self.state.local_pos, self.state.remote_pos);
        let origin = self.state.local_pos;

        match character {
            CharacterId::Mila => {
                // Slow heavy orb drifting toward the foe
                let speed = KindStats::for_kind(ProjectileKind::MilaEnergy).speed;
                vec![self.spawn_local(
                    ProjectileKind::MilaEnergy,
                    origin,
                    facing.scaled(speed),
                    now_ms,
                )]
            }
            CharacterId::Gustav => {
                // Radial nova, six projectiles
                let speed = KindStats::for_kind(ProjectileKind::GustavNova).speed;
                (0..6)
                    .map(|i| {
                        let angle = i as f32 * (TAU / 6.0);
                        self.spawn_local(
                            ProjectileKind::GustavNova,
                            origin,
                            Vec2::new(angle.cos() * speed, angle.sin() * speed),
                            now_ms,
                        )
                    })
                    .collect()
            }
            CharacterId::Fyero => vec![self.spawn_local(
                ProjectileKind::FyeroFlame,
                origin.offset(facing.scaled(30.0)),
                Vec2::default(),
                now_ms,
            )],
        }
    }

    /// Apply one inbound peer message to the session state
    pub fn apply_message(&mut self, now_ms: u64, msg: PeerMsg) {
        let state = &mut self.state;
        match msg {
            PeerMsg::Pos { x, y } => {
                state.remote_pos = self.arena.clamp(Vec2::new(x, y));
            }
            PeerMsg::Char { character } => {
                let stats = CharacterStats::for_character(character);
                state.remote_char = Some(character);
                state.remote_max_hp = stats.max_health;
                // Stealth idle time for the remote counts from when we
                // learn the character; spawn receipts reset it below
                state.remote_last_attack_at_ms = Some(now_ms);
            }
            PeerMsg::Spawn {
                id,
                kind,
                owner,
                x,
                y,
                vx,
                vy,
                ttl,
            } => {
                // The sender's `self` is our `peer`. Inbound ids are opaque:
                // the flipped owner in the key keeps them out of the local
                // id namespace.
                let key = ProjectileKey {
                    owner: owner.flipped(),
                    id,
                };
                state.projectiles.insert(
                    key,
                    Projectile {
                        kind,
                        pos: Vec2::new(x, y),
                        vel: Vec2::new(vx, vy),
                        ttl_ms: ttl,
                        born_ms: now_ms,
                    },
                );
                state.remote_last_attack_at_ms = Some(now_ms);
            }
            PeerMsg::HpUpdate {
                target,
                hp,
                knockback,
            } => match target {
                // The sender's enemy is us: authoritative damage report
                HpTarget::Enemy => {
                    state.local_hp = hp.clamp(0.0, state.local_max_hp);
                    if let Some(kb) = knockback {
                        state.local_pos = self
                            .arena
                            .clamp(state.local_pos.offset(Vec2::new(kb.dx, kb.dy)));
                    }
                }
                // The sender reporting its own health (e.g. lifesteal). Max
                // health is the owner's business; only floor at zero here.
                HpTarget::You => {
                    state.remote_hp = hp.max(0.0);
                }
            },
            PeerMsg::HpSync { hp } => {
                state.remote_hp = hp.max(0.0);
            }
        }
    }

    /// Observational win/loss from the health values; never locks anything
    pub fn outcome(&self) -> Outcome {
        let local_down = self.state.local_hp <= 0.0;
        let remote_down = self.state.remote_hp <= 0.0;
        match (local_down, remote_down) {
            (true, true) => Outcome::Draw,
            (true, false) => Outcome::Defeat,
            (false, true) => Outcome::Victory,
            (false, false) => Outcome::InProgress,
        }
    }

    /// Whether the local fighter has faded to stealth (semi-transparent in
    /// the own view, hidden from the peer's). Presentation reads this; the
    /// simulator only tracks the attack timestamps behind it.
    pub fn is_stealthed(&self, now_ms: u64) -> bool {
        let Some(character) = self.state.local_char else {
            return false;
        };
        let Some(threshold) = CharacterStats::for_character(character).stealth_after_ms else {
            return false;
        };
        self.state
            .last_attack_at_ms
            .is_some_and(|last| now_ms.saturating_sub(last) > threshold)
    }

    /// Same rule applied to the remote fighter, from locally observed
    /// attack activity
    pub fn is_remote_stealthed(&self, now_ms: u64) -> bool {
        let Some(character) = self.state.remote_char else {
            return false;
        };
        let Some(threshold) = CharacterStats::for_character(character).stealth_after_ms else {
            return false;
        };
        self.state
            .remote_last_attack_at_ms
            .is_some_and(|last| now_ms.saturating_sub(last) > threshold)
    }

    fn spawn_local(
        &mut self,
        kind: ProjectileKind,
        pos: Vec2,
        vel: Vec2,
        now_ms: u64,
    ) -> PeerMsg {
        let stats = KindStats::for_kind(kind);
        let id = self.state.allocate_projectile_id();

        self.state.projectiles.insert(
            ProjectileKey {
                owner: Owner::Local,
                id: id.clone(),
            },
            Projectile {
                kind,
                pos,
                vel,
                ttl_ms: stats.ttl_ms,
                born_ms: now_ms,
            },
        );

        PeerMsg::Spawn {
            id,
            kind,
            owner: Owner::Local,
            x: pos.x,
            y: pos.y,
            vx: vel.x,
            vy: vel.y,
            ttl: stats.ttl_ms,
        }
    }
}
