//! Damage resolution.
//!
//! This module provides:
//! - The fixed-order damage composition (`resolve_damage`)
//! - Immutable `DamageInfo` delivered to a target's damage-apply entry point
//! - Passive/equipment modifier folding
//! - Low-resource tier lookup
//! - Timed bonus stacks

use serde::{Deserialize, Serialize};
use wraith_common::{EntityId, Vec3};

// ============================================================================
// Attack Kinds
// ============================================================================

/// Kind of melee attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// Fast, cheap swing.
    Light,
    /// Slow, heavy swing.
    Strong,
    /// Counter swing unlocked by evading a hit in ghost mode.
    JustAvoid,
}

impl AttackKind {
    /// Animation trigger fired when this attack starts.
    #[must_use]
    pub const fn trigger_name(self) -> &'static str {
        match self {
            Self::Light => "LightAttack",
            Self::Strong => "StrongAttack",
            Self::JustAvoid => "JustAvoidAttack",
        }
    }
}

/// Tuning of one attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackProfile {
    /// Attack power before modifiers.
    pub base_power: f32,
    /// Estimated duration of one swing (seconds). Animation callbacks win.
    pub duration: f32,
    /// Stamina paid per swing.
    pub stamina_cost: f32,
    /// Swings in one combo chain.
    pub max_combo: u32,
}

impl Default for AttackProfile {
    fn default() -> Self {
        Self {
            base_power: 10.0,
            duration: 0.8,
            stamina_cost: 0.0,
            max_combo: 3,
        }
    }
}

impl AttackProfile {
    /// Profile with the given power and duration.
    #[must_use]
    pub fn new(base_power: f32, duration: f32) -> Self {
        Self {
            base_power,
            duration,
            ..Self::default()
        }
    }

    /// Set the stamina cost.
    #[must_use]
    pub fn with_stamina_cost(mut self, cost: f32) -> Self {
        self.stamina_cost = cost;
        self
    }

    /// Set the combo length.
    #[must_use]
    pub fn with_max_combo(mut self, max_combo: u32) -> Self {
        self.max_combo = max_combo.max(1);
        self
    }
}

// ============================================================================
// Composition
// ============================================================================

/// Every input of the damage composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageInputs {
    /// Attack power before modifiers.
    pub base_attack_power: f32,
    /// Equipment/passive multiplier.
    pub passive_multiplier: f32,
    /// Equipment/passive flat bonus, added after the multiplier.
    pub passive_flat_bonus: f32,
    /// Multiplier of the low-resource tier the attacker is in, if any.
    pub low_resource_tier: Option<f32>,
    /// Timed bonus stacks currently held.
    pub timed_bonus_stacks: u32,
    /// Bonus per stack (0.05 = +5%).
    pub per_stack_multiplier: f32,
    /// Stack cap.
    pub max_stacks: u32,
}

impl Default for DamageInputs {
    fn default() -> Self {
        Self {
            base_attack_power: 0.0,
            passive_multiplier: 1.0,
            passive_flat_bonus: 0.0,
            low_resource_tier: None,
            timed_bonus_stacks: 0,
            per_stack_multiplier: 0.0,
            max_stacks: 0,
        }
    }
}

impl DamageInputs {
    /// Inputs with only a base power.
    #[must_use]
    pub fn new(base_attack_power: f32) -> Self {
        Self {
            base_attack_power,
            ..Default::default()
        }
    }

    /// Set passive modifiers.
    #[must_use]
    pub fn with_passives(mut self, passives: PassiveModifiers) -> Self {
        self.passive_multiplier = passives.multiplier;
        self.passive_flat_bonus = passives.flat_bonus;
        self
    }

    /// Set the low-resource tier multiplier.
    #[must_use]
    pub fn with_tier(mut self, tier: Option<f32>) -> Self {
        self.low_resource_tier = tier;
        self
    }

    /// Set timed bonus stacks.
    #[must_use]
    pub fn with_stacks(mut self, stacks: u32, per_stack_multiplier: f32, max_stacks: u32) -> Self {
        self.timed_bonus_stacks = stacks;
        self.per_stack_multiplier = per_stack_multiplier;
        self.max_stacks = max_stacks;
        self
    }
}

/// Compose final damage.
///
/// Order is fixed: passive multiply, passive flat add, tier multiply, stack
/// multiply, floor at zero.
#[must_use]
pub fn resolve_damage(inputs: &DamageInputs) -> f32 {
    let mut damage = inputs.base_attack_power;

    damage *= inputs.passive_multiplier;
    damage += inputs.passive_flat_bonus;

    if let Some(tier) = inputs.low_resource_tier {
        damage *= tier;
    }

    if inputs.timed_bonus_stacks > 0 {
        let stacks = inputs.timed_bonus_stacks.min(inputs.max_stacks);
        damage *= 1.0 + inputs.per_stack_multiplier * stacks as f32;
    }

    damage.max(0.0)
}

// ============================================================================
// Damage Info
// ============================================================================

/// One successful hit. Built once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageInfo {
    amount: f32,
    hit_point: Vec3,
    hit_normal: Vec3,
    instigator: EntityId,
    target: EntityId,
}

impl DamageInfo {
    /// Create a damage record.
    #[must_use]
    pub const fn new(
        amount: f32,
        hit_point: Vec3,
        hit_normal: Vec3,
        instigator: EntityId,
        target: EntityId,
    ) -> Self {
        Self {
            amount,
            hit_point,
            hit_normal,
            instigator,
            target,
        }
    }

    /// Final damage.
    #[must_use]
    pub const fn amount(&self) -> f32 {
        self.amount
    }

    /// World-space contact point.
    #[must_use]
    pub const fn hit_point(&self) -> Vec3 {
        self.hit_point
    }

    /// Contact normal.
    #[must_use]
    pub const fn hit_normal(&self) -> Vec3 {
        self.hit_normal
    }

    /// Who dealt the hit.
    #[must_use]
    pub const fn instigator(&self) -> EntityId {
        self.instigator
    }

    /// Who receives the hit.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        self.target
    }
}

// ============================================================================
// Passive Modifiers
// ============================================================================

/// Equipment and passive skill modifiers, folded to one multiplier and one flat bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveModifiers {
    /// Product of all multipliers.
    pub multiplier: f32,
    /// Sum of all flat bonuses.
    pub flat_bonus: f32,
}

impl Default for PassiveModifiers {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            flat_bonus: 0.0,
        }
    }
}

impl PassiveModifiers {
    /// No modifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Multiply in another multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier *= multiplier;
        self
    }

    /// Add a flat bonus.
    #[must_use]
    pub fn with_flat(mut self, bonus: f32) -> Self {
        self.flat_bonus += bonus;
        self
    }

    /// Combine two modifier sets.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            multiplier: self.multiplier * other.multiplier,
            flat_bonus: self.flat_bonus + other.flat_bonus,
        }
    }

    /// Fold a list of modifier sets.
    #[must_use]
    pub fn fold<'a>(items: impl IntoIterator<Item = &'a Self>) -> Self {
        items
            .into_iter()
            .fold(Self::default(), |acc, item| acc.combine(item))
    }
}

// ============================================================================
// Low-Resource Tiers
// ============================================================================

/// One tier: at or below `threshold` (ratio of max), damage is multiplied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowResourceTier {
    /// Resource ratio at or below which the tier applies.
    pub threshold: f32,
    /// Damage multiplier.
    pub multiplier: f32,
}

/// Tier table, kept sorted by threshold ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LowResourceTier>", into = "Vec<LowResourceTier>")]
pub struct LowResourceTiers {
    tiers: Vec<LowResourceTier>,
}

impl From<Vec<LowResourceTier>> for LowResourceTiers {
    fn from(tiers: Vec<LowResourceTier>) -> Self {
        Self::new(tiers)
    }
}

impl From<LowResourceTiers> for Vec<LowResourceTier> {
    fn from(tiers: LowResourceTiers) -> Self {
        tiers.tiers
    }
}

impl LowResourceTiers {
    /// Build a tier table.
    #[must_use]
    pub fn new(mut tiers: Vec<LowResourceTier>) -> Self {
        tiers.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        Self { tiers }
    }

    /// Multiplier for a resource ratio: the tightest tier that applies.
    #[must_use]
    pub fn multiplier_for(&self, ratio: f32) -> Option<f32> {
        self.tiers
            .iter()
            .find(|tier| ratio <= tier.threshold)
            .map(|tier| tier.multiplier)
    }

    /// All tiers.
    #[must_use]
    pub fn tiers(&self) -> &[LowResourceTier] {
        &self.tiers
    }
}

// ============================================================================
// Timed Bonus Stacks
// ============================================================================

/// Stacks earned by landing hits; all of them expire together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusStacks {
    stacks: u32,
    max_stacks: u32,
    remaining: f32,
    duration: f32,
}

impl BonusStacks {
    /// Create an empty tracker.
    #[must_use]
    pub fn new(max_stacks: u32, duration: f32) -> Self {
        Self {
            stacks: 0,
            max_stacks,
            remaining: 0.0,
            duration: duration.max(0.0),
        }
    }

    /// Add a stack (capped) and restart the countdown.
    pub fn add_stack(&mut self) {
        if self.max_stacks == 0 {
            return;
        }
        self.stacks = (self.stacks + 1).min(self.max_stacks);
        self.remaining = self.duration;
    }

    /// Count down; every stack drops when the timer runs out.
    pub fn tick(&mut self, dt: f32) {
        if self.stacks == 0 {
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.clear();
        }
    }

    /// Drop every stack.
    pub fn clear(&mut self) {
        self.stacks = 0;
        self.remaining = 0.0;
    }

    /// Current stacks.
    #[must_use]
    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    /// Stack cap.
    #[must_use]
    pub fn max_stacks(&self) -> u32 {
        self.max_stacks
    }

    /// Seconds until the stacks expire.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}
