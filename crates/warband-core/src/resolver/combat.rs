//! Combat resolver: target selection, damage application, kill bookkeeping.
//!
//! The `CombatResolver` handles:
//! - Positional strikes against the enemy side (dummy, boss, minions)
//! - Positional strikes against the player side (player, allies)
//! - Id-addressed and current-target damage
//! - Healing with indicators
//! - Melee streak and red mana generation
//!
//! # Kill Detection
//!
//! Kills are detected from a census of living enemies taken before the hit
//! and compared afterwards, so the resolver never has to work out which
//! code path caused a death.

use glam::Vec3;

use crate::arena::Arena;
use crate::config::SimConfig;
use crate::entity::{CombatantId, CombatantKind};
use crate::output::{Feedback, GameEvent, IndicatorKind};
use crate::resource::ResourceColor;

use super::{EnemyCensus, HitReport, StrikeMeta};

/// Short-lived resolver borrowing the arena and feedback bundle.
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use warband_core::arena::Arena;
/// use warband_core::config::SimConfig;
/// use warband_core::entity::CombatantKind;
/// use warband_core::output::Feedback;
/// use warband_core::resolver::{CombatResolver, StrikeMeta};
/// use warband_core::resource::ResourceLedger;
///
/// let config = SimConfig::default();
/// let mut arena = Arena::new();
/// let mut feedback = Feedback::new(&config);
/// let minion = arena.spawn(CombatantKind::Minion, Vec3::new(1.0, 0.0, 0.0), ResourceLedger::new(20.0));
///
/// let mut resolver = CombatResolver::new(&mut arena, &mut feedback, &config, None);
/// assert!(resolver.resolve_strike(Vec3::ZERO, 25.0, &StrikeMeta::new("Sword"), None));
/// assert!(!arena.get(minion).unwrap().is_alive());
/// ```
pub struct CombatResolver<'a> {
    arena: &'a mut Arena,
    feedback: &'a mut Feedback,
    config: &'a SimConfig,
    current_target: Option<CombatantId>,
}

impl<'a> CombatResolver<'a> {
    /// Creates a resolver.
    ///
    /// # Arguments
    ///
    /// * `arena` - Combatants to strike
    /// * `feedback` - Log, indicators, events, and DPS tracker
    /// * `config` - Collision threshold and indicator tunables
    /// * `current_target` - Selected target (gates dummy hits)
    pub fn new(
        arena: &'a mut Arena,
        feedback: &'a mut Feedback,
        config: &'a SimConfig,
        current_target: Option<CombatantId>,
    ) -> Self {
        Self {
            arena,
            feedback,
            config,
            current_target,
        }
    }

    // =========================================================================
    // Positional strikes
    // =========================================================================

    /// Resolves a player-side strike at `origin`.
    ///
    /// Checks dummy (if targeted), boss, then minions, and hits only the
    /// first match. `threshold` overrides the configured collision threshold.
    ///
    /// # Returns
    ///
    /// `true` if something was hit.
    pub fn resolve_strike(&mut self, origin: Vec3, damage: f32, meta: &StrikeMeta, threshold: Option<f32>) -> bool {
        self.strike(origin, damage, meta, threshold).is_some()
    }

    /// Same as [`resolve_strike`](Self::resolve_strike), returning the hit.
    pub fn strike(
        &mut self,
        origin: Vec3,
        damage: f32,
        meta: &StrikeMeta,
        threshold: Option<f32>,
    ) -> Option<HitReport> {
        let reach = threshold.unwrap_or(self.config.collision_threshold);
        let reach_sq = reach * reach;
        let census = EnemyCensus::take(self.arena);

        let mut report = self.strike_dummy(origin, reach_sq, damage, meta);
        if report.is_none() {
            let boss = self.boss_candidates();
            report = self.strike_first_within(&boss, origin, reach_sq, damage, meta);
        }
        if report.is_none() {
            let minions = self.arena.alive_of(CombatantKind::Minion);
            report = self.strike_first_within(&minions, origin, reach_sq, damage, meta);
        }

        if meta.melee {
            self.credit_melee(meta.attacker, report.is_some());
        }
        self.raise_kill_events(&census, meta.attacker);
        report
    }

    /// Credits one melee swing, however many targets it struck.
    ///
    /// A connecting swing grants red mana and extends the streak; a whiff
    /// resets the streak.
    pub fn credit_melee(&mut self, attacker: Option<CombatantId>, connected: bool) {
        if connected {
            self.melee_hit(attacker);
        } else {
            self.melee_miss(attacker);
        }
    }

    /// Resolves an enemy strike at `origin` against the player, then allies.
    ///
    /// # Returns
    ///
    /// `true` if a player-side combatant was hit.
    pub fn resolve_strike_against_player_side(
        &mut self,
        origin: Vec3,
        damage: f32,
        meta: &StrikeMeta,
        threshold: Option<f32>,
    ) -> bool {
        let reach = threshold.unwrap_or(self.config.collision_threshold);
        let candidates: Vec<CombatantId> = self
            .arena
            .controlled()
            .into_iter()
            .filter(|id| self.arena.get(*id).is_some_and(|c| c.is_alive()))
            .collect();
        let report = self.strike_first_within(&candidates, origin, reach * reach, damage, meta);
        if let Some(hit) = report {
            self.raise_defeat_event(&hit);
        }
        report.is_some()
    }

    fn boss_candidates(&self) -> Vec<CombatantId> {
        self.arena
            .boss()
            .filter(|id| self.arena.get(*id).is_some_and(|c| c.is_alive()))
            .into_iter()
            .collect()
    }

    fn strike_dummy(&mut self, origin: Vec3, reach_sq: f32, damage: f32, meta: &StrikeMeta) -> Option<HitReport> {
        let dummy = self.arena.dummy()?;
        if self.current_target != Some(dummy) {
            return None;
        }
        let position = self.arena.position(dummy)?;
        if origin.distance_squared(position) <= reach_sq {
            self.apply_hit(dummy, damage, meta)
        } else {
            self.feedback.dps.record_miss();
            None
        }
    }

    fn strike_first_within(
        &mut self,
        candidates: &[CombatantId],
        origin: Vec3,
        reach_sq: f32,
        damage: f32,
        meta: &StrikeMeta,
    ) -> Option<HitReport> {
        let target = candidates.iter().copied().find(|id| {
            self.arena
                .position(*id)
                .is_some_and(|p| origin.distance_squared(p) <= reach_sq)
        })?;
        self.apply_hit(target, damage, meta)
    }

    // =========================================================================
    // Targeted damage
    // =========================================================================

    /// Damages a specific minion.
    ///
    /// Returns `None` if `id` is not a living minion.
    pub fn damage_minion_by_id(&mut self, id: CombatantId, damage: f32, meta: &StrikeMeta) -> Option<HitReport> {
        if self.arena.get(id)?.kind() != CombatantKind::Minion {
            return None;
        }
        self.damage_by_id(id, damage, meta)
    }

    /// Damages the practice dummy, recording the hit for DPS.
    pub fn damage_target_dummy(&mut self, damage: f32, meta: &StrikeMeta) -> Option<HitReport> {
        let dummy = self.arena.dummy()?;
        self.damage_by_id(dummy, damage, meta)
    }

    /// Damages the boss.
    pub fn damage_boss(&mut self, damage: f32, meta: &StrikeMeta) -> Option<HitReport> {
        let boss = self.arena.boss()?;
        self.damage_by_id(boss, damage, meta)
    }

    /// Damages whatever the current target is.
    ///
    /// Returns `None` with no current target or a dead one.
    pub fn damage_current_target(&mut self, damage: f32, meta: &StrikeMeta) -> Option<HitReport> {
        let target = self.current_target?;
        self.damage_by_id(target, damage, meta)
    }

    /// Damages any combatant by id, raising the matching kill or defeat event.
    pub fn damage_by_id(&mut self, id: CombatantId, damage: f32, meta: &StrikeMeta) -> Option<HitReport> {
        let census = EnemyCensus::take(self.arena);
        let report = self.apply_hit(id, damage, meta)?;
        if meta.melee {
            self.melee_hit(meta.attacker);
        }
        if report.kind.is_player_side() {
            self.raise_defeat_event(&report);
        } else {
            self.raise_kill_events(&census, meta.attacker);
        }
        Some(report)
    }

    /// Restores health to `id`, spawning a heal indicator when any was restored.
    ///
    /// # Returns
    ///
    /// The health actually restored.
    pub fn restore_health(&mut self, id: CombatantId, amount: f32, source: &str) -> f32 {
        let Some(combatant) = self.arena.get_mut(id) else {
            return 0.0;
        };
        if !combatant.is_alive() {
            return 0.0;
        }
        let restored = combatant.ledger.heal(amount);
        let position = combatant.position;
        let name = combatant.to_string();
        if restored > 0.0 {
            self.feedback.indicate(
                position + Vec3::Y * self.config.indicator_offset,
                restored,
                IndicatorKind::Heal,
                self.config.indicator_lifetime,
            );
            self.feedback.info(format!("{source} heals {name} for {restored:.0}"));
        }
        restored
    }

    // =========================================================================
    // Shared hit path
    // =========================================================================

    fn apply_hit(&mut self, id: CombatantId, damage: f32, meta: &StrikeMeta) -> Option<HitReport> {
        let target = self.arena.get_mut(id)?;
        let kind = target.kind();
        if kind != CombatantKind::Dummy && !target.is_alive() {
            return None;
        }
        let (before, after) = if kind == CombatantKind::Dummy {
            let health = target.ledger.health();
            (health, health)
        } else {
            target.ledger.take_damage(damage)
        };
        let position = target.position;
        let name = target.to_string();

        if kind == CombatantKind::Dummy {
            self.feedback.dps.record_hit(damage);
        }
        if damage >= 0.0 {
            self.feedback.indicate(
                position + Vec3::Y * self.config.indicator_offset,
                damage,
                IndicatorKind::Damage,
                self.config.indicator_lifetime,
            );
        }
        let killed = before > 0.0 && after <= 0.0;
        self.feedback.info(format!("{} hits {name} for {damage:.0}", meta.ability));
        if killed {
            tracing::debug!(target: "warband::combat", ability = %meta.ability, victim = %id, "kill");
            self.feedback.info(format!("{name} has been defeated"));
        }
        Some(HitReport {
            target: id,
            kind,
            damage,
            killed,
        })
    }

    fn melee_hit(&mut self, attacker: Option<CombatantId>) {
        let Some(id) = attacker else {
            return;
        };
        let Some(combatant) = self.arena.get_mut(id) else {
            return;
        };
        combatant.ledger.gain(ResourceColor::Red, self.config.red_mana_per_melee_hit);
        let Some(control) = combatant.as_controlled_mut() else {
            return;
        };
        control.melee_streak += 1;
        let streak = control.melee_streak;
        self.feedback.emit(GameEvent::MeleeHit { attacker: id, streak });
        if streak % self.config.melee_streak_milestone == 0 {
            self.feedback.info(format!("{streak} hit melee streak!"));
            self.feedback.emit(GameEvent::MeleeStreak { attacker: id, streak });
        }
    }

    fn melee_miss(&mut self, attacker: Option<CombatantId>) {
        let Some(id) = attacker else {
            return;
        };
        if let Some(control) = self.arena.control_mut(id) {
            control.melee_streak = 0;
        }
    }

    fn raise_kill_events(&mut self, before: &EnemyCensus, killer: Option<CombatantId>) {
        let after = EnemyCensus::take(self.arena);
        if let Some(boss) = before.living_boss {
            if after.living_boss.is_none() {
                self.feedback.emit(GameEvent::BossKilled { boss, killer });
            }
        }
        for _ in after.minions_alive..before.minions_alive {
            self.feedback.emit(GameEvent::MinionKilled {
                killer,
                remaining: after.minions_alive,
            });
        }
        for opponent in &before.duelists_alive {
            if !after.duelists_alive.contains(opponent) {
                self.feedback.emit(GameEvent::DuelWon { opponent: *opponent });
            }
        }
    }

    fn raise_defeat_event(&mut self, hit: &HitReport) {
        if !hit.killed {
            return;
        }
        match hit.kind {
            CombatantKind::Player => self.feedback.emit(GameEvent::PlayerDefeated { player: hit.target }),
            CombatantKind::Ally => self.feedback.emit(GameEvent::AllyDefeated { ally: hit.target }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceLedger;

    struct Fixture {
        arena: Arena,
        feedback: Feedback,
        config: SimConfig,
        target: Option<CombatantId>,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SimConfig::default();
            Self {
                arena: Arena::new(),
                feedback: Feedback::new(&config),
                config,
                target: None,
            }
        }

        fn spawn(&mut self, kind: CombatantKind, x: f32, health: f32) -> CombatantId {
            self.arena
                .spawn(kind, Vec3::new(x, 0.0, 0.0), ResourceLedger::new(health))
        }

        fn resolver(&mut self) -> CombatResolver<'_> {
            CombatResolver::new(&mut self.arena, &mut self.feedback, &self.config, self.target)
        }

        fn health(&self, id: CombatantId) -> f32 {
            self.arena.get(id).unwrap().ledger.health()
        }
    }

    fn meta() -> StrikeMeta {
        StrikeMeta::new("Test Strike")
    }

    mod target_order {
        use super::*;

        #[test]
        fn targeted_dummy_beats_boss_and_minions() {
            let mut fx = Fixture::new();
            let dummy = fx.spawn(CombatantKind::Dummy, 0.5, 1000.0);
            let boss = fx.spawn(CombatantKind::Boss, 0.5, 500.0);
            let minion = fx.spawn(CombatantKind::Minion, 0.5, 50.0);
            fx.target = Some(dummy);

            let hit = fx.resolver().strike(Vec3::ZERO, 40.0, &meta(), None).unwrap();
            assert_eq!(hit.target, dummy);
            assert_eq!(fx.health(boss), 500.0);
            assert_eq!(fx.health(minion), 50.0);
            assert_eq!(fx.health(dummy), 1000.0);
            assert_eq!(fx.feedback.dps.hits(), 1);
        }

        #[test]
        fn untargeted_dummy_is_skipped() {
            let mut fx = Fixture::new();
            fx.spawn(CombatantKind::Dummy, 0.5, 1000.0);
            let boss = fx.spawn(CombatantKind::Boss, 0.5, 500.0);

            let hit = fx.resolver().strike(Vec3::ZERO, 40.0, &meta(), None).unwrap();
            assert_eq!(hit.target, boss);
            assert_eq!(fx.feedback.dps.hits(), 0);
            assert_eq!(fx.feedback.dps.misses(), 0);
        }

        #[test]
        fn dummy_miss_is_recorded_then_boss_checked() {
            let mut fx = Fixture::new();
            let dummy = fx.spawn(CombatantKind::Dummy, 10.0, 1000.0);
            let boss = fx.spawn(CombatantKind::Boss, 1.0, 500.0);
            fx.target = Some(dummy);

            let hit = fx.resolver().strike(Vec3::ZERO, 40.0, &meta(), None).unwrap();
            assert_eq!(hit.target, boss);
            assert_eq!(fx.feedback.dps.misses(), 1);
        }

        #[test]
        fn only_first_minion_is_hit() {
            let mut fx = Fixture::new();
            let m1 = fx.spawn(CombatantKind::Minion, 1.0, 50.0);
            let m2 = fx.spawn(CombatantKind::Minion, 0.5, 50.0);

            assert!(fx.resolver().resolve_strike(Vec3::ZERO, 10.0, &meta(), None));
            assert_eq!(fx.health(m1), 40.0);
            assert_eq!(fx.health(m2), 50.0);
        }

        #[test]
        fn threshold_override_extends_reach() {
            let mut fx = Fixture::new();
            let minion = fx.spawn(CombatantKind::Minion, 3.0, 50.0);

            assert!(!fx.resolver().resolve_strike(Vec3::ZERO, 10.0, &meta(), None));
            assert!(fx.resolver().resolve_strike(Vec3::ZERO, 10.0, &meta(), Some(3.0)));
            assert_eq!(fx.health(minion), 40.0);
        }

        #[test]
        fn dead_enemies_are_not_targets() {
            let mut fx = Fixture::new();
            let boss = fx.spawn(CombatantKind::Boss, 0.5, 500.0);
            let minion = fx.spawn(CombatantKind::Minion, 0.5, 50.0);
            fx.arena.get_mut(boss).unwrap().ledger.set_health(0.0);

            let hit = fx.resolver().strike(Vec3::ZERO, 10.0, &meta(), None).unwrap();
            assert_eq!(hit.target, minion);
        }
    }

    mod kills {
        use super::*;

        #[test]
        fn dummy_never_dies() {
            let mut fx = Fixture::new();
            let dummy = fx.spawn(CombatantKind::Dummy, 0.0, 10.0);
            fx.target = Some(dummy);

            let hit = fx.resolver().damage_target_dummy(9999.0, &meta()).unwrap();
            assert!(!hit.killed);
            assert!(fx.arena.get(dummy).unwrap().is_alive());
            assert!(fx.feedback.events.is_empty());
        }

        #[test]
        fn boss_kill_emits_once() {
            let mut fx = Fixture::new();
            let player = fx.spawn(CombatantKind::Player, 0.0, 100.0);
            let boss = fx.spawn(CombatantKind::Boss, 0.5, 30.0);

            let meta = meta().by(player);
            let hit = fx.resolver().strike(Vec3::ZERO, 50.0, &meta, None).unwrap();
            assert!(hit.killed);
            assert_eq!(fx.health(boss), 0.0);
            assert!(!fx.resolver().resolve_strike(Vec3::ZERO, 50.0, &meta, None));

            let events = fx.feedback.events.take_events();
            assert_eq!(
                events,
                vec![GameEvent::BossKilled {
                    boss,
                    killer: Some(player)
                }]
            );
        }

        #[test]
        fn minion_kill_reports_remaining() {
            let mut fx = Fixture::new();
            let m1 = fx.spawn(CombatantKind::Minion, 0.0, 10.0);
            fx.spawn(CombatantKind::Minion, 50.0, 10.0);

            fx.resolver().damage_minion_by_id(m1, 10.0, &meta()).unwrap();
            let events = fx.feedback.events.take_events();
            assert_eq!(
                events,
                vec![GameEvent::MinionKilled {
                    killer: None,
                    remaining: 1
                }]
            );
        }

        #[test]
        fn damage_minion_by_id_rejects_other_kinds() {
            let mut fx = Fixture::new();
            let boss = fx.spawn(CombatantKind::Boss, 0.0, 100.0);
            assert!(fx.resolver().damage_minion_by_id(boss, 10.0, &meta()).is_none());
            assert_eq!(fx.health(boss), 100.0);
        }

        #[test]
        fn duelist_defeat_via_current_target() {
            let mut fx = Fixture::new();
            let duelist = fx.spawn(CombatantKind::Duelist, 5.0, 20.0);
            fx.target = Some(duelist);

            let hit = fx.resolver().damage_current_target(25.0, &meta()).unwrap();
            assert!(hit.killed);
            assert_eq!(
                fx.feedback.events.take_events(),
                vec![GameEvent::DuelWon { opponent: duelist }]
            );
        }

        #[test]
        fn no_current_target_is_a_no_op() {
            let mut fx = Fixture::new();
            assert!(fx.resolver().damage_current_target(25.0, &meta()).is_none());
        }

        #[test]
        fn hit_spawns_raised_indicator() {
            let mut fx = Fixture::new();
            fx.spawn(CombatantKind::Boss, 1.0, 100.0);
            fx.resolver().resolve_strike(Vec3::ZERO, 12.0, &meta(), None);

            let indicator = &fx.feedback.indicators[0];
            assert_eq!(indicator.amount, 12.0);
            assert_eq!(indicator.kind, IndicatorKind::Damage);
            assert!((indicator.position.y - 2.0).abs() < 1e-6);
        }
    }

    mod player_side {
        use super::*;

        #[test]
        fn player_checked_before_allies() {
            let mut fx = Fixture::new();
            let ally = fx.spawn(CombatantKind::Ally, 0.5, 100.0);
            let player = fx.spawn(CombatantKind::Player, 0.5, 100.0);

            assert!(fx
                .resolver()
                .resolve_strike_against_player_side(Vec3::ZERO, 30.0, &meta(), None));
            assert_eq!(fx.health(player), 70.0);
            assert_eq!(fx.health(ally), 100.0);
        }

        #[test]
        fn enemies_are_ignored() {
            let mut fx = Fixture::new();
            let boss = fx.spawn(CombatantKind::Boss, 0.0, 100.0);
            assert!(!fx
                .resolver()
                .resolve_strike_against_player_side(Vec3::ZERO, 30.0, &meta(), None));
            assert_eq!(fx.health(boss), 100.0);
        }

        #[test]
        fn ally_defeat_event() {
            let mut fx = Fixture::new();
            let ally = fx.spawn(CombatantKind::Ally, 0.5, 20.0);
            fx.resolver()
                .resolve_strike_against_player_side(Vec3::ZERO, 30.0, &meta(), None);
            assert_eq!(
                fx.feedback.events.take_events(),
                vec![GameEvent::AllyDefeated { ally }]
            );
        }
    }

    mod melee {
        use super::*;

        #[test]
        fn hits_build_streak_and_red_mana() {
            let mut fx = Fixture::new();
            let player = fx.spawn(CombatantKind::Player, 0.0, 100.0);
            fx.arena.get_mut(player).unwrap().ledger = ResourceLedger::new(100.0).with_pool(ResourceColor::Red, 0.0, 100.0);
            fx.spawn(CombatantKind::Boss, 1.0, 10_000.0);

            let meta = meta().by(player).melee(true);
            for _ in 0..5 {
                assert!(fx.resolver().resolve_strike(Vec3::ZERO, 1.0, &meta, None));
            }

            let combatant = fx.arena.get(player).unwrap();
            assert_eq!(combatant.ledger.amount(ResourceColor::Red), 25.0);
            assert_eq!(combatant.as_controlled().unwrap().melee_streak, 5);
            assert_eq!(fx.feedback.events.count_named("melee_hit"), 5);
            assert_eq!(fx.feedback.events.count_named("melee_streak"), 1);
        }

        #[test]
        fn miss_resets_streak() {
            let mut fx = Fixture::new();
            let player = fx.spawn(CombatantKind::Player, 0.0, 100.0);
            fx.spawn(CombatantKind::Boss, 1.0, 10_000.0);
            let meta = meta().by(player).melee(true);

            fx.resolver().resolve_strike(Vec3::ZERO, 1.0, &meta, None);
            fx.resolver().resolve_strike(Vec3::new(50.0, 0.0, 0.0), 1.0, &meta, None);
            assert_eq!(fx.arena.control(player).unwrap().melee_streak, 0);
        }
    }

    mod healing {
        use super::*;

        #[test]
        fn restore_clamps_and_indicates_only_actual_heal() {
            let mut fx = Fixture::new();
            let player = fx.spawn(CombatantKind::Player, 0.0, 100.0);
            fx.arena.get_mut(player).unwrap().ledger.set_health(90.0);

            assert_eq!(fx.resolver().restore_health(player, 30.0, "Heal"), 10.0);
            assert_eq!(fx.resolver().restore_health(player, 30.0, "Heal"), 0.0);
            assert_eq!(fx.feedback.indicators.len(), 1);
            assert_eq!(fx.feedback.indicators[0].kind, IndicatorKind::Heal);
        }
    }
}
