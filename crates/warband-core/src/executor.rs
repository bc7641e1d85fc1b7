//! Named-ability executors.
//!
//! Three tables map ability names to an [`AbilityEffect`]:
//!
//! - **instant**: abilities with no cast or windup
//! - **cast completion**: effects fired when a cast finishes
//! - **windup completion**: strikes fired when a windup finishes
//!
//! A name missing from a table falls back to that table's default variant
//! (generic, projectile, and melee strike respectively). The tables are
//! plain data in an [`ExecutorRegistry`], so new abilities can be wired up
//! without touching the execution code.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ability::AbilityDefinition;
use crate::entity::{CombatantId, CombatantKind};
use crate::phase::{ChannelEffect, ChannelState};
use crate::projectile::{Faction, Projectile};
use crate::resolver::StrikeMeta;
use crate::resource::ResourceColor;
use crate::simulation::Simulation;

/// What an ability does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityEffect {
    /// Strike the first enemy in front of the actor.
    MeleeStrike,
    /// Launch a projectile toward the current target.
    Projectile {
        /// Steer toward the target while it lives.
        homing: bool,
    },
    /// Heal the actor.
    SelfHeal,
    /// Close distance toward the target, then strike.
    Dash,
    /// Hit every enemy within range of the actor.
    AreaStrike,
    /// Start a channel that ticks once per second.
    Channel,
    /// Grant a free-cast buff for the given color.
    FreeCast {
        /// Color the buff applies to.
        color: ResourceColor,
    },
    /// Derive the behavior from the definition's numbers.
    Generic,
}

/// Which executor table to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorTable {
    /// Abilities with no cast or windup.
    Instant,
    /// Effects fired when a cast completes.
    CastCompletion,
    /// Strikes fired when a windup completes.
    WindupCompletion,
}

impl ExecutorTable {
    /// Effect used when a name is missing from this table.
    #[must_use]
    pub const fn default_effect(self) -> AbilityEffect {
        match self {
            Self::Instant => AbilityEffect::Generic,
            Self::CastCompletion => AbilityEffect::Projectile { homing: false },
            Self::WindupCompletion => AbilityEffect::MeleeStrike,
        }
    }
}

/// Name-keyed executor tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutorRegistry {
    instant: HashMap<String, AbilityEffect>,
    cast: HashMap<String, AbilityEffect>,
    windup: HashMap<String, AbilityEffect>,
}

impl ExecutorRegistry {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables wired to the built-in ability catalog.
    #[must_use]
    pub fn builtin() -> Self {
        use AbilityEffect::{AreaStrike, Channel, Dash, FreeCast, MeleeStrike, Projectile, SelfHeal};
        let mut registry = Self::new();
        for (name, effect) in [
            ("Sword", MeleeStrike),
            ("Fireball", Projectile { homing: false }),
            ("Chaos Bolt", Projectile { homing: false }),
            ("Heal", SelfHeal),
            ("Dash Attack", Dash),
            ("Whirlwind", AreaStrike),
            ("Drain Life", Channel),
            ("Soothing Winds", Channel),
            (
                "Clarity",
                FreeCast {
                    color: ResourceColor::Blue,
                },
            ),
        ] {
            registry.register(ExecutorTable::Instant, name, effect);
        }
        for (name, effect) in [
            ("Greater Fireball", Projectile { homing: true }),
            ("Frost Lance", Projectile { homing: true }),
            ("Greater Heal", SelfHeal),
        ] {
            registry.register(ExecutorTable::CastCompletion, name, effect);
        }
        for (name, effect) in [
            ("Heavy Strike", MeleeStrike),
            ("Crushing Blow", MeleeStrike),
            ("Leap Slam", Dash),
        ] {
            registry.register(ExecutorTable::WindupCompletion, name, effect);
        }
        registry
    }

    fn table(&self, table: ExecutorTable) -> &HashMap<String, AbilityEffect> {
        match table {
            ExecutorTable::Instant => &self.instant,
            ExecutorTable::CastCompletion => &self.cast,
            ExecutorTable::WindupCompletion => &self.windup,
        }
    }

    /// Adds or replaces an entry.
    pub fn register(&mut self, table: ExecutorTable, name: impl Into<String>, effect: AbilityEffect) {
        let map = match table {
            ExecutorTable::Instant => &mut self.instant,
            ExecutorTable::CastCompletion => &mut self.cast,
            ExecutorTable::WindupCompletion => &mut self.windup,
        };
        map.insert(name.into(), effect);
    }

    /// Exact lookup, without fallback.
    #[must_use]
    pub fn lookup(&self, table: ExecutorTable, name: &str) -> Option<AbilityEffect> {
        self.table(table).get(name).copied()
    }

    /// Lookup with the table's default as fallback.
    #[must_use]
    pub fn resolve(&self, table: ExecutorTable, name: &str) -> AbilityEffect {
        self.lookup(table, name).unwrap_or(table.default_effect())
    }
}

/// Picks an effect for a definition that has no table entry.
#[must_use]
pub fn generic_effect(definition: &AbilityDefinition, melee_reach: f32) -> Option<AbilityEffect> {
    if definition.channel_duration > 0.0 {
        Some(AbilityEffect::Channel)
    } else if definition.heal > 0.0 && (definition.self_cast || definition.damage <= 0.0) {
        Some(AbilityEffect::SelfHeal)
    } else if definition.damage > 0.0 {
        if definition.melee || (definition.range > 0.0 && definition.range <= melee_reach) {
            Some(AbilityEffect::MeleeStrike)
        } else {
            Some(AbilityEffect::Projectile { homing: false })
        }
    } else {
        None
    }
}

/// One firing of an ability.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Execution {
    pub(crate) actor: CombatantId,
    pub(crate) slot: usize,
    pub(crate) definition: AbilityDefinition,
    pub(crate) damage_multiplier: f32,
}

impl Execution {
    fn damage(&self) -> f32 {
        self.definition.damage * self.damage_multiplier
    }

    fn meta(&self) -> StrikeMeta {
        StrikeMeta::new(self.definition.name.clone())
            .by(self.actor)
            .melee(self.definition.melee)
    }
}

impl Simulation {
    /// Runs `effect` for `exec`.
    pub(crate) fn execute_effect(&mut self, exec: &Execution, effect: AbilityEffect) {
        tracing::debug!(
            target: "warband::executor",
            ability = %exec.definition.name,
            actor = %exec.actor,
            ?effect,
            "execute"
        );
        match effect {
            AbilityEffect::MeleeStrike => self.melee_strike(exec),
            AbilityEffect::Projectile { homing } => self.launch_projectile(exec, homing),
            AbilityEffect::SelfHeal => {
                let heal = exec.definition.heal;
                self.resolver().restore_health(exec.actor, heal, &exec.definition.name);
            }
            AbilityEffect::Dash => self.dash_strike(exec),
            AbilityEffect::AreaStrike => self.area_strike(exec),
            AbilityEffect::Channel => self.start_channel(exec),
            AbilityEffect::FreeCast { color } => {
                if let Some(control) = self.arena.control_mut(exec.actor) {
                    control.free_cast = Some(color);
                }
                self.feedback.info(format!("Next {color} ability is free"));
            }
            AbilityEffect::Generic => match generic_effect(&exec.definition, self.config.melee_reach) {
                Some(derived) => self.execute_effect(exec, derived),
                None => self
                    .feedback
                    .info(format!("{} has no effect", exec.definition.name)),
            },
        }
    }

    /// Point in front of the actor where a melee strike lands, snapped to terrain.
    fn strike_point(&mut self, actor: CombatantId) -> Option<Vec3> {
        let target = self.current_target_position();
        let reach = self.config.melee_reach;
        let combatant = self.arena.get_mut(actor)?;
        if let Some(target) = target {
            combatant.face_towards(target);
        }
        let mut point = combatant.position + combatant.facing * reach;
        point.y = self.terrain.terrain_height(point.x, point.z);
        Some(point)
    }

    fn melee_strike(&mut self, exec: &Execution) {
        let Some(point) = self.strike_point(exec.actor) else {
            return;
        };
        let meta = exec.meta();
        if !self.resolver().resolve_strike(point, exec.damage(), &meta, None) {
            self.feedback.info(format!("{} missed", exec.definition.name));
        }
    }

    fn dash_strike(&mut self, exec: &Execution) {
        let target = self.current_target_position();
        let stop_short = self.config.melee_reach * 0.5;
        let Some(combatant) = self.arena.get_mut(exec.actor) else {
            return;
        };
        let travel = match target {
            Some(target) => {
                combatant.face_towards(target);
                let flat = Vec3::new(target.x - combatant.position.x, 0.0, target.z - combatant.position.z);
                (flat.length() - stop_short).clamp(0.0, exec.definition.range)
            }
            None => exec.definition.range,
        };
        let mut destination = combatant.position + combatant.facing * travel;
        destination.y = self.terrain.terrain_height(destination.x, destination.z);
        combatant.position = destination;
        self.melee_strike(exec);
    }

    fn area_strike(&mut self, exec: &Execution) {
        let Some(center) = self.arena.position(exec.actor) else {
            return;
        };
        let radius = if exec.definition.range > 0.0 {
            exec.definition.range
        } else {
            self.config.melee_reach
        };
        let meta = exec.meta();
        let damage = exec.damage();
        let dummy = self.arena.dummy().filter(|d| self.current_target == Some(*d));
        let victims: Vec<CombatantId> = self
            .arena
            .query_radius(center, radius)
            .into_iter()
            .filter(|id| {
                self.arena.get(*id).is_some_and(|c| {
                    let enemy = matches!(c.kind(), CombatantKind::Boss | CombatantKind::Minion);
                    (enemy && c.is_alive()) || Some(*id) == dummy
                })
            })
            .collect();
        // Each victim takes a plain hit; the swing is credited once below.
        let splash = meta.clone().melee(false);
        let mut resolver = self.resolver();
        let hits = victims
            .into_iter()
            .filter(|id| resolver.damage_by_id(*id, damage, &splash).is_some())
            .count();
        if meta.melee {
            resolver.credit_melee(meta.attacker, hits > 0);
        }
        self.feedback
            .info(format!("{} struck {hits} enemies", exec.definition.name));
    }

    fn launch_projectile(&mut self, exec: &Execution, homing: bool) {
        let target = self.current_target.filter(|id| self.arena.contains(*id));
        let target_position = self.current_target_position();
        let Some(actor) = self.arena.get_mut(exec.actor) else {
            return;
        };
        if let Some(p) = target_position {
            actor.face_towards(p);
        }
        let origin = actor.position;
        let direction = target_position
            .map(|p| (p - origin).normalize_or_zero())
            .filter(|d| *d != Vec3::ZERO)
            .unwrap_or(actor.facing);

        let dot = exec.definition.dot.map(|mut dot| {
            dot.damage_per_tick *= exec.damage_multiplier;
            dot
        });
        let projectile = Projectile {
            id: self.next_projectile_id,
            ability: exec.definition.name.clone(),
            position: origin,
            velocity: direction * self.config.projectile_speed,
            lifetime: self.config.projectile_lifetime,
            damage: exec.damage(),
            homing_target: if homing { target } else { None },
            dot,
            faction: Faction::PlayerSide,
            attacker: Some(exec.actor),
        };
        self.next_projectile_id += 1;
        self.projectiles.push(projectile);
    }

    fn start_channel(&mut self, exec: &Execution) {
        let definition = &exec.definition;
        let total = if definition.damage > 0.0 {
            ChannelEffect::Damage(exec.damage())
        } else {
            ChannelEffect::Heal(definition.heal)
        };
        let channel = ChannelState::new(exec.slot, definition.name.clone(), definition.channel_duration, total);
        let seconds = channel.total;
        self.interrupt_channel(exec.actor);
        let Some(control) = self.arena.control_mut(exec.actor) else {
            return;
        };
        match control.phase.begin_channel(channel) {
            Ok(()) => self
                .feedback
                .info(format!("Channeling {} ({seconds:.1}s)", definition.name)),
            Err(err) => self.feedback.error(format!("{}: {err}", definition.name)),
        }
    }
}
