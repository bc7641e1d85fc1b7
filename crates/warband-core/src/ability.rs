//! Ability definitions, the catalog, fallback cost tables, and overrides.
//!
//! # Architecture
//!
//! Definitions are loaded once into an [`AbilityCatalog`] and never mutated.
//! Per-session tweaks go through an [`AbilityOverride`] decorator: the
//! simulation always asks the decorator for the effective definition, and
//! the default decorator is the identity.
//!
//! Costs resolve in two steps. Explicit `cost`/`secondary_cost` fields on the
//! definition win; otherwise [`fallback_cost`] and [`fallback_secondary_cost`]
//! supply the built-in name-keyed table. Names absent from the table cost
//! nothing.
//!
//! # Example
//!
//! ```
//! use warband_core::ability::{AbilityCatalog, AbilityOverride, AbilityPatch, PatchSet};
//!
//! let catalog = AbilityCatalog::builtin();
//! let raw = catalog.get("Fireball").unwrap();
//!
//! let mut patches = PatchSet::new();
//! patches.insert("Fireball", AbilityPatch { damage: Some(99.0), ..AbilityPatch::default() });
//!
//! assert_eq!(patches.effective(raw).damage, 99.0);
//! assert_eq!(patches.effective(raw).cooldown, raw.cooldown);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resource::ResourceColor;

/// An amount of one color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceCost {
    /// Amount before stance multipliers.
    pub amount: f32,
    /// Color paid.
    pub color: ResourceColor,
}

impl ResourceCost {
    /// A cost of nothing.
    pub const FREE: Self = Self {
        amount: 0.0,
        color: ResourceColor::None,
    };

    /// Creates a cost.
    #[must_use]
    pub const fn new(amount: f32, color: ResourceColor) -> Self {
        Self { amount, color }
    }

    /// True when nothing needs to be paid or gated.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.amount <= 0.0 || self.color == ResourceColor::None
    }
}

/// Damage-over-time rider carried by a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DotSpec {
    /// Number of ticks after impact.
    pub ticks: u32,
    /// Seconds over which the ticks are spread.
    pub duration: f32,
    /// Damage per tick.
    pub damage_per_tick: f32,
}

/// Impact visual metadata. Opaque to this crate; passed through to indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactVisual {
    /// RGB color.
    pub color: [f32; 3],
    /// Size scale.
    pub size: f32,
}

impl Default for ImpactVisual {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            size: 1.0,
        }
    }
}

/// Immutable description of an ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityDefinition {
    /// Unique name, also the executor-table key.
    pub name: String,
    /// Damage dealt (total, for channels).
    pub damage: f32,
    /// Health restored (total, for channels).
    pub heal: f32,
    /// Seconds of casting before the effect fires.
    pub cast_time: f32,
    /// Seconds of windup before the strike lands.
    pub windup_time: f32,
    /// Channel duration in seconds.
    pub channel_duration: f32,
    /// Slot cooldown in seconds.
    pub cooldown: f32,
    /// Maximum range to the current target (zero means unlimited).
    pub range: f32,
    /// Explicit primary cost. `None` defers to the fallback table.
    pub cost: Option<ResourceCost>,
    /// Explicit secondary cost. `None` defers to the fallback table.
    pub secondary_cost: Option<ResourceCost>,
    /// Targets the caster; skips the range check.
    pub self_cast: bool,
    /// Movement speed factor while winding up.
    pub windup_movement_factor: f32,
    /// Strikes count toward the melee streak and generate red mana.
    pub melee: bool,
    /// Damage-over-time applied by the projectile on impact.
    pub dot: Option<DotSpec>,
    /// Visual metadata for impacts.
    pub impact: ImpactVisual,
}

impl AbilityDefinition {
    /// Creates an instant, free, zero-effect ability named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: damage.
    #[must_use]
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    /// Builder: heal.
    #[must_use]
    pub fn with_heal(mut self, heal: f32) -> Self {
        self.heal = heal;
        self
    }

    /// Builder: cast time.
    #[must_use]
    pub fn with_cast_time(mut self, seconds: f32) -> Self {
        self.cast_time = seconds;
        self
    }

    /// Builder: windup time and movement factor.
    #[must_use]
    pub fn with_windup(mut self, seconds: f32, movement_factor: f32) -> Self {
        self.windup_time = seconds;
        self.windup_movement_factor = movement_factor;
        self
    }

    /// Builder: channel duration.
    #[must_use]
    pub fn with_channel(mut self, seconds: f32) -> Self {
        self.channel_duration = seconds;
        self
    }

    /// Builder: cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown = seconds;
        self
    }

    /// Builder: range.
    #[must_use]
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    /// Builder: explicit primary cost.
    #[must_use]
    pub fn with_cost(mut self, amount: f32, color: ResourceColor) -> Self {
        self.cost = Some(ResourceCost::new(amount, color));
        self
    }

    /// Builder: explicit secondary cost.
    #[must_use]
    pub fn with_secondary_cost(mut self, amount: f32, color: ResourceColor) -> Self {
        self.secondary_cost = Some(ResourceCost::new(amount, color));
        self
    }

    /// Builder: marks the ability self-targeted.
    #[must_use]
    pub fn self_cast(mut self) -> Self {
        self.self_cast = true;
        self
    }

    /// Builder: marks the ability as a melee strike.
    #[must_use]
    pub fn melee(mut self) -> Self {
        self.melee = true;
        self
    }

    /// Builder: damage-over-time rider.
    #[must_use]
    pub fn with_dot(mut self, ticks: u32, duration: f32, damage_per_tick: f32) -> Self {
        self.dot = Some(DotSpec {
            ticks,
            duration,
            damage_per_tick,
        });
        self
    }

    /// Primary cost: explicit field, else the fallback table.
    #[must_use]
    pub fn primary_cost(&self) -> ResourceCost {
        self.cost.unwrap_or_else(|| fallback_cost(&self.name))
    }

    /// Secondary cost: explicit field, else the fallback table.
    #[must_use]
    pub fn secondary(&self) -> Option<ResourceCost> {
        self.secondary_cost.or_else(|| fallback_secondary_cost(&self.name))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "name",
                reason: "ability name must not be empty".to_string(),
            });
        }
        let timings = [
            ("cast_time", self.cast_time),
            ("windup_time", self.windup_time),
            ("channel_duration", self.channel_duration),
            ("cooldown", self.cooldown),
            ("range", self.range),
        ];
        for (field, value) in timings {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} has {field} = {value}", self.name),
                });
            }
        }
        Ok(())
    }
}

impl Default for AbilityDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            damage: 0.0,
            heal: 0.0,
            cast_time: 0.0,
            windup_time: 0.0,
            channel_duration: 0.0,
            cooldown: 0.0,
            range: 0.0,
            cost: None,
            secondary_cost: None,
            self_cast: false,
            windup_movement_factor: 1.0,
            melee: false,
            dot: None,
            impact: ImpactVisual::default(),
        }
    }
}

/// Built-in primary cost by ability name.
///
/// Melee abilities in the catch-all arm are free.
#[must_use]
pub fn fallback_cost(name: &str) -> ResourceCost {
    use ResourceColor::{Black, Blue, Green, Red, White};
    match name {
        "Fireball" => ResourceCost::new(15.0, Blue),
        "Greater Fireball" => ResourceCost::new(20.0, Blue),
        "Frost Lance" => ResourceCost::new(15.0, Blue),
        "Whirlwind" => ResourceCost::new(20.0, Red),
        "Crushing Blow" => ResourceCost::new(15.0, Red),
        "Leap Slam" => ResourceCost::new(10.0, Red),
        "Chaos Bolt" => ResourceCost::new(10.0, Red),
        "Greater Heal" => ResourceCost::new(30.0, White),
        "Soothing Winds" => ResourceCost::new(15.0, Green),
        "Venom Bolt" => ResourceCost::new(10.0, Green),
        "Drain Life" => ResourceCost::new(10.0, Black),
        "Sword" | "Heavy Strike" | "Dash Attack" | "Clarity" => ResourceCost::FREE,
        _ => ResourceCost::FREE,
    }
}

/// Built-in secondary cost for dual-currency abilities.
#[must_use]
pub fn fallback_secondary_cost(name: &str) -> Option<ResourceCost> {
    match name {
        "Chaos Bolt" => Some(ResourceCost::new(10.0, ResourceColor::Black)),
        _ => None,
    }
}

/// Read-only collection of ability definitions keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityCatalog {
    abilities: BTreeMap<String, AbilityDefinition>,
}

impl AbilityCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a definition.
    pub fn insert(&mut self, definition: AbilityDefinition) {
        self.abilities.insert(definition.name.clone(), definition);
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AbilityDefinition> {
        self.abilities.get(name)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Definition names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.abilities.keys().map(String::as_str)
    }

    /// Parses a JSON array of definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON,
    /// [`ConfigError::DuplicateAbility`] for repeated names, and
    /// [`ConfigError::Invalid`] for empty names or negative timings.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let definitions: Vec<AbilityDefinition> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for definition in definitions {
            definition.validate()?;
            if catalog.abilities.contains_key(&definition.name) {
                return Err(ConfigError::DuplicateAbility(definition.name));
            }
            catalog.insert(definition);
        }
        Ok(catalog)
    }

    /// The default ability set backing the built-in executor tables.
    #[must_use]
    pub fn builtin() -> Self {
        use ResourceColor::{Blue, White};
        let definitions = [
            // Instant
            AbilityDefinition::new("Sword").with_damage(25.0).with_cooldown(1.5).with_range(2.0).melee(),
            AbilityDefinition::new("Fireball").with_damage(20.0).with_cooldown(3.0).with_range(30.0),
            AbilityDefinition::new("Heal")
                .with_heal(30.0)
                .with_cooldown(8.0)
                .with_cost(20.0, White)
                .self_cast(),
            AbilityDefinition::new("Dash Attack")
                .with_damage(30.0)
                .with_cooldown(6.0)
                .with_range(6.0)
                .melee(),
            AbilityDefinition::new("Whirlwind").with_damage(15.0).with_cooldown(8.0).with_range(4.0).melee(),
            AbilityDefinition::new("Chaos Bolt").with_damage(35.0).with_cooldown(5.0).with_range(25.0),
            AbilityDefinition::new("Clarity").with_cooldown(30.0).self_cast(),
            // Channels
            AbilityDefinition::new("Drain Life")
                .with_damage(30.0)
                .with_channel(3.0)
                .with_cooldown(10.0)
                .with_range(20.0),
            AbilityDefinition::new("Soothing Winds")
                .with_heal(24.0)
                .with_channel(4.0)
                .with_cooldown(12.0)
                .self_cast(),
            // Cast time
            AbilityDefinition::new("Greater Fireball")
                .with_damage(60.0)
                .with_cast_time(2.0)
                .with_cooldown(5.0)
                .with_range(30.0),
            AbilityDefinition::new("Greater Heal")
                .with_heal(60.0)
                .with_cast_time(2.5)
                .with_cooldown(10.0)
                .self_cast(),
            AbilityDefinition::new("Frost Lance")
                .with_damage(40.0)
                .with_cast_time(1.5)
                .with_cooldown(4.0)
                .with_range(30.0)
                .with_cost(15.0, Blue),
            AbilityDefinition::new("Venom Bolt")
                .with_damage(10.0)
                .with_cast_time(1.0)
                .with_cooldown(6.0)
                .with_range(25.0)
                .with_dot(3, 3.0, 5.0),
            // Windup
            AbilityDefinition::new("Heavy Strike")
                .with_damage(45.0)
                .with_windup(0.75, 0.5)
                .with_cooldown(4.0)
                .with_range(2.5)
                .melee(),
            AbilityDefinition::new("Crushing Blow")
                .with_damage(70.0)
                .with_windup(1.25, 0.0)
                .with_cooldown(10.0)
                .with_range(2.5)
                .melee(),
            AbilityDefinition::new("Leap Slam")
                .with_damage(40.0)
                .with_windup(0.5, 0.25)
                .with_cooldown(8.0)
                .with_range(8.0)
                .melee(),
        ];
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }
}

/// Decorator producing the effective definition for a raw one.
pub trait AbilityOverride {
    /// Returns the definition the simulation should actually use.
    fn effective(&self, raw: &AbilityDefinition) -> AbilityDefinition;
}

impl<F> AbilityOverride for F
where
    F: Fn(&AbilityDefinition) -> AbilityDefinition,
{
    fn effective(&self, raw: &AbilityDefinition) -> AbilityDefinition {
        self(raw)
    }
}

/// Field-level override for one ability. `None` keeps the raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityPatch {
    /// Replacement damage.
    pub damage: Option<f32>,
    /// Replacement heal.
    pub heal: Option<f32>,
    /// Replacement cast time.
    pub cast_time: Option<f32>,
    /// Replacement windup time.
    pub windup_time: Option<f32>,
    /// Replacement channel duration.
    pub channel_duration: Option<f32>,
    /// Replacement cooldown.
    pub cooldown: Option<f32>,
    /// Replacement range.
    pub range: Option<f32>,
    /// Replacement primary cost.
    pub cost: Option<ResourceCost>,
}

impl AbilityPatch {
    fn apply(&self, raw: &AbilityDefinition) -> AbilityDefinition {
        let mut out = raw.clone();
        if let Some(v) = self.damage {
            out.damage = v;
        }
        if let Some(v) = self.heal {
            out.heal = v;
        }
        if let Some(v) = self.cast_time {
            out.cast_time = v;
        }
        if let Some(v) = self.windup_time {
            out.windup_time = v;
        }
        if let Some(v) = self.channel_duration {
            out.channel_duration = v;
        }
        if let Some(v) = self.cooldown {
            out.cooldown = v;
        }
        if let Some(v) = self.range {
            out.range = v;
        }
        if let Some(v) = self.cost {
            out.cost = Some(v);
        }
        out
    }
}

/// Session override table keyed by ability name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchSet {
    patches: BTreeMap<String, AbilityPatch>,
}

impl PatchSet {
    /// Creates an empty patch set (behaves as the identity).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the patch for `name`.
    pub fn insert(&mut self, name: impl Into<String>, patch: AbilityPatch) {
        self.patches.insert(name.into(), patch);
    }

    /// Removes the patch for `name`.
    pub fn remove(&mut self, name: &str) -> Option<AbilityPatch> {
        self.patches.remove(name)
    }

    /// Parses a JSON object mapping names to patches.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let patches: BTreeMap<String, AbilityPatch> = serde_json::from_str(json)?;
        Ok(Self { patches })
    }
}

impl AbilityOverride for PatchSet {
    fn effective(&self, raw: &AbilityDefinition) -> AbilityDefinition {
        match self.patches.get(&raw.name) {
            Some(patch) => patch.apply(raw),
            None => raw.clone(),
        }
    }
}
