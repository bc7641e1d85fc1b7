//! Travelling effects: projectiles and damage-over-time.
//!
//! Both are advanced once per simulation step and end by calling into the
//! combat resolver.
//!
//! # Projectiles
//!
//! - Homing projectiles steer toward a living target at constant speed,
//!   limited by the configured turn rate.
//! - Everything else drifts with the configured wind acceleration.
//! - Movement is sub-stepped so no step travels farther than the collision
//!   threshold; fast projectiles cannot skip over a target.
//!
//! A projectile is removed on its first hit or when its lifetime runs out.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ability::DotSpec;
use crate::entity::CombatantId;
use crate::resolver::StrikeMeta;
use crate::simulation::Simulation;

/// Upper bound on movement sub-steps per simulation step.
const MAX_SUBSTEPS: u32 = 64;

/// Which side fired a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    /// Player or ally; strikes the enemy side.
    PlayerSide,
    /// Boss or minion; strikes the player side.
    EnemySide,
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Session-unique id.
    pub id: u64,
    /// Ability that launched it.
    pub ability: String,
    /// Current position.
    pub position: Vec3,
    /// Current velocity.
    pub velocity: Vec3,
    /// Seconds until it fizzles.
    pub lifetime: f32,
    /// Damage on impact.
    pub damage: f32,
    /// Combatant it steers toward, if homing.
    pub homing_target: Option<CombatantId>,
    /// Damage-over-time applied to whatever it hits.
    pub dot: Option<DotSpec>,
    /// Side it was fired from.
    pub faction: Faction,
    /// Combatant that fired it.
    pub attacker: Option<CombatantId>,
}

impl Projectile {
    /// Moves the projectile by `dt`.
    ///
    /// With a `target` position it steers toward it, keeping its speed;
    /// otherwise `wind` accelerates it.
    pub fn advance(&mut self, dt: f32, target: Option<Vec3>, wind: Vec3, turn_rate: f32) {
        match target {
            Some(target) => {
                let speed = self.velocity.length();
                let desired = (target - self.position).normalize_or_zero();
                let current = self.velocity.normalize_or_zero();
                let direction = steer(current, desired, turn_rate * dt);
                self.velocity = direction * speed;
            }
            None => self.velocity += wind * dt,
        }
        self.position += self.velocity * dt;
    }
}

/// Rotates `current` toward `desired` by at most `max_angle` radians.
fn steer(current: Vec3, desired: Vec3, max_angle: f32) -> Vec3 {
    if desired == Vec3::ZERO {
        return current;
    }
    if current == Vec3::ZERO {
        return desired;
    }
    let angle = current.angle_between(desired);
    if angle <= max_angle || angle <= f32::EPSILON {
        return desired;
    }
    let blended = current.lerp(desired, max_angle / angle).normalize_or_zero();
    if blended == Vec3::ZERO {
        // Exactly opposite: any perpendicular turn will do
        current.any_orthogonal_vector().normalize_or_zero()
    } else {
        blended
    }
}

/// Damage applied to one target on a fixed interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageOverTime {
    /// Combatant taking damage.
    pub target: CombatantId,
    /// Combatant credited with the damage.
    pub attacker: Option<CombatantId>,
    /// Ability that applied it.
    pub ability: String,
    /// Damage per tick.
    pub damage_per_tick: f32,
    /// Seconds between ticks.
    pub interval: f32,
    /// Time accumulated toward the next tick.
    pub timer: f32,
    /// Ticks left.
    pub remaining_ticks: u32,
}

impl DamageOverTime {
    /// Builds a DoT from a projectile's rider.
    #[must_use]
    pub fn from_spec(spec: &DotSpec, target: CombatantId, attacker: Option<CombatantId>, ability: &str) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let interval = if spec.ticks > 0 && spec.duration > 0.0 {
            spec.duration / spec.ticks as f32
        } else {
            1.0
        };
        Self {
            target,
            attacker,
            ability: ability.to_string(),
            damage_per_tick: spec.damage_per_tick,
            interval,
            timer: 0.0,
            remaining_ticks: spec.ticks,
        }
    }

    /// Advances the timer and returns how many ticks are due.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.timer += dt;
        let mut due = 0;
        while self.remaining_ticks > 0 && self.timer >= self.interval {
            self.timer -= self.interval;
            self.remaining_ticks -= 1;
            due += 1;
        }
        due
    }
}

impl Simulation {
    /// Adds an externally built projectile (e.g. an enemy bolt).
    ///
    /// The id is reassigned to keep ids unique.
    pub fn spawn_projectile(&mut self, mut projectile: Projectile) -> u64 {
        projectile.id = self.next_projectile_id;
        self.next_projectile_id += 1;
        let id = projectile.id;
        self.projectiles.push(projectile);
        id
    }

    /// Projectiles currently in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Damage-over-time effects currently ticking.
    #[must_use]
    pub fn damage_over_time(&self) -> &[DamageOverTime] {
        &self.dots
    }

    pub(crate) fn update_projectiles(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let flying = std::mem::take(&mut self.projectiles);
        let mut survivors = Vec::with_capacity(flying.len());
        for mut projectile in flying {
            if self.fly(&mut projectile, dt) {
                survivors.push(projectile);
            }
        }
        survivors.append(&mut self.projectiles);
        self.projectiles = survivors;
    }

    /// Moves one projectile through this step. Returns false once it is spent.
    fn fly(&mut self, projectile: &mut Projectile, dt: f32) -> bool {
        let threshold = self.config.collision_threshold;
        let travel = projectile.velocity.length() * dt;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let substeps = ((travel / threshold).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        #[allow(clippy::cast_precision_loss)]
        let h = dt / substeps as f32;

        for _ in 0..substeps {
            let homing = projectile
                .homing_target
                .filter(|id| self.arena.get(*id).is_some_and(|c| c.is_alive()));
            let target = homing.and_then(|id| self.arena.position(id));
            projectile.advance(h, target, self.config.wind, self.config.homing_turn_rate);
            if self.impact(projectile, homing) {
                return false;
            }
        }
        projectile.lifetime -= dt;
        projectile.lifetime > 0.0
    }

    fn impact(&mut self, projectile: &Projectile, homing: Option<CombatantId>) -> bool {
        let mut meta = StrikeMeta::new(projectile.ability.clone());
        meta.attacker = projectile.attacker;

        let report = match (projectile.faction, homing) {
            (Faction::PlayerSide, Some(target)) => {
                let threshold = self.config.collision_threshold;
                let close = self
                    .arena
                    .position(target)
                    .is_some_and(|p| p.distance_squared(projectile.position) <= threshold * threshold);
                if close {
                    self.resolver().damage_by_id(target, projectile.damage, &meta)
                } else {
                    None
                }
            }
            (Faction::PlayerSide, None) => self.resolver().strike(projectile.position, projectile.damage, &meta, None),
            (Faction::EnemySide, _) => {
                return self.resolver().resolve_strike_against_player_side(
                    projectile.position,
                    projectile.damage,
                    &meta,
                    None,
                );
            }
        };

        let Some(hit) = report else {
            return false;
        };
        if let Some(spec) = projectile.dot.as_ref().filter(|d| d.ticks > 0) {
            self.dots
                .push(DamageOverTime::from_spec(spec, hit.target, projectile.attacker, &projectile.ability));
        }
        true
    }

    pub(crate) fn update_damage_over_time(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let ticking = std::mem::take(&mut self.dots);
        let mut survivors = Vec::with_capacity(ticking.len());
        for mut dot in ticking {
            let alive = self.arena.get(dot.target).is_some_and(|c| c.is_alive());
            if !alive {
                continue;
            }
            let due = dot.advance(dt);
            let mut meta = StrikeMeta::new(dot.ability.clone());
            meta.attacker = dot.attacker;
            for _ in 0..due {
                if self.resolver().damage_by_id(dot.target, dot.damage_per_tick, &meta).is_none() {
                    break;
                }
            }
            if dot.remaining_ticks > 0 {
                survivors.push(dot);
            }
        }
        survivors.append(&mut self.dots);
        self.dots = survivors;
    }
}
