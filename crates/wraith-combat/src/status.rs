//! Timed status effects that scale movement and animation speed.
//!
//! This module provides:
//! - Stack policies (refresh, replace, stack)
//! - Per-target effect instances with remaining time and stacks
//! - Speed and animation-speed products recomputed from scratch on every change
//!
//! Final values always scale the base captured at construction, never the
//! current value, so reapplying an effect cannot compound.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// How a reapplied effect merges with the live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackPolicy {
    /// Extend duration only.
    #[default]
    Refresh,
    /// Reset duration and stacks to 1.
    Replace,
    /// Add a stack (capped) and reset duration.
    Stack,
}

/// Static description of an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectDef {
    /// Unique effect ID.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Duration of one application (seconds).
    pub duration: f32,
    /// Movement speed multiplier per stack.
    pub speed_multiplier: f32,
    /// Animation speed multiplier per stack.
    pub anim_speed_multiplier: f32,
    /// Stack cap (at least 1).
    pub max_stacks: u32,
    /// Merge policy.
    pub policy: StackPolicy,
}

impl StatusEffectDef {
    /// Create a single-stack refresh effect.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, duration: f32) -> Self {
        Self {
            id,
            name: name.into(),
            duration,
            speed_multiplier: 1.0,
            anim_speed_multiplier: 1.0,
            max_stacks: 1,
            policy: StackPolicy::Refresh,
        }
    }

    /// Set speed multipliers.
    #[must_use]
    pub fn with_multipliers(mut self, speed: f32, anim_speed: f32) -> Self {
        self.speed_multiplier = speed;
        self.anim_speed_multiplier = anim_speed;
        self
    }

    /// Set stacking.
    #[must_use]
    pub fn with_stacking(mut self, policy: StackPolicy, max_stacks: u32) -> Self {
        self.policy = policy;
        self.max_stacks = max_stacks.max(1);
        self
    }
}

/// A live effect on one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectInstance {
    /// Definition this instance came from.
    pub def: StatusEffectDef,
    /// Seconds left.
    pub remaining: f32,
    /// Current stacks, in `[1, def.max_stacks]`.
    pub stacks: u32,
}

impl StatusEffectInstance {
    fn new(def: &StatusEffectDef) -> Self {
        Self {
            def: def.clone(),
            remaining: def.duration.max(0.0),
            stacks: 1,
        }
    }

    fn reapply(&mut self, def: &StatusEffectDef) {
        match def.policy {
            StackPolicy::Refresh => {
                self.remaining += def.duration.max(0.0);
            },
            StackPolicy::Replace => {
                self.def = def.clone();
                self.remaining = def.duration.max(0.0);
                self.stacks = 1;
            },
            StackPolicy::Stack => {
                self.stacks = (self.stacks + 1).min(def.max_stacks.max(1));
                self.remaining = def.duration.max(0.0);
            },
        }
    }
}

/// Every effect on one target, plus the cached products.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffects {
    base_speed: f32,
    base_anim_speed: f32,
    instances: Vec<StatusEffectInstance>,
    speed_product: f32,
    anim_product: f32,
}

impl StatusEffects {
    /// Capture base values once.
    #[must_use]
    pub fn new(base_speed: f32, base_anim_speed: f32) -> Self {
        Self {
            base_speed,
            base_anim_speed,
            instances: Vec::new(),
            speed_product: 1.0,
            anim_product: 1.0,
        }
    }

    /// Apply an effect according to its policy.
    pub fn apply(&mut self, def: &StatusEffectDef) {
        if let Some(existing) = self.instances.iter_mut().find(|i| i.def.id == def.id) {
            existing.reapply(def);
        } else {
            self.instances.push(StatusEffectInstance::new(def));
        }
        trace!(effect = def.id, "status applied");
        self.recompute();
    }

    /// Remove an effect. Returns true if it was present.
    pub fn remove(&mut self, id: u32) -> bool {
        let len = self.instances.len();
        self.instances.retain(|i| i.def.id != id);
        if self.instances.len() == len {
            false
        } else {
            self.recompute();
            true
        }
    }

    /// Count down; expired effects are dropped.
    pub fn tick(&mut self, dt: f32) {
        for instance in &mut self.instances {
            instance.remaining -= dt;
        }
        let len = self.instances.len();
        self.instances.retain(|i| i.remaining > 0.0);
        if self.instances.len() != len {
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        let mut speed = 1.0_f32;
        let mut anim = 1.0_f32;
        for instance in &self.instances {
            let stacks = instance.stacks as i32;
            speed *= instance.def.speed_multiplier.powi(stacks);
            anim *= instance.def.anim_speed_multiplier.powi(stacks);
        }
        self.speed_product = speed;
        self.anim_product = anim;
    }

    /// Effective movement speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.base_speed * self.speed_product
    }

    /// Effective animation speed.
    #[must_use]
    pub fn anim_speed(&self) -> f32 {
        self.base_anim_speed * self.anim_product
    }

    /// Movement multiplier alone.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_product
    }

    /// Stacks of an effect (0 if absent).
    #[must_use]
    pub fn stacks(&self, id: u32) -> u32 {
        self.instances
            .iter()
            .find(|i| i.def.id == id)
            .map_or(0, |i| i.stacks)
    }

    /// Remaining time of an effect.
    #[must_use]
    pub fn remaining(&self, id: u32) -> Option<f32> {
        self.instances
            .iter()
            .find(|i| i.def.id == id)
            .map(|i| i.remaining)
    }

    /// Live instances.
    pub fn instances(&self) -> impl Iterator<Item = &StatusEffectInstance> {
        self.instances.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn slow() -> StatusEffectDef {
        StatusEffectDef::new(1, "Chilled", 2.0)
            .with_multipliers(0.5, 0.8)
            .with_stacking(StackPolicy::Stack, 3)
    }

    #[test]
    fn test_stack_policy_multiplies_per_stack() {
        let mut effects = StatusEffects::new(10.0, 1.0);
        effects.apply(&slow());
        effects.apply(&slow());
        assert_eq!(effects.stacks(1), 2);
        assert!(approx(effects.speed(), 2.5));
        assert!(approx(effects.anim_speed(), 0.64));

        for _ in 0..5 {
            effects.apply(&slow());
        }
        assert_eq!(effects.stacks(1), 3);
        assert!(approx(effects.speed(), 1.25));
    }

    #[test]
    fn test_refresh_extends_duration_only() {
        let def = StatusEffectDef::new(2, "Haste", 1.0).with_multipliers(1.5, 1.0);
        let mut effects = StatusEffects::new(4.0, 1.0);
        effects.apply(&def);
        effects.tick(0.5);
        effects.apply(&def);
        assert_eq!(effects.stacks(2), 1);
        assert!(approx(effects.remaining(2).unwrap_or_default(), 1.5));
        assert!(approx(effects.speed(), 6.0));
    }

    #[test]
    fn test_replace_resets_stacks() {
        let stacking = slow();
        let mut replacing = slow();
        replacing.policy = StackPolicy::Replace;

        let mut effects = StatusEffects::new(1.0, 1.0);
        effects.apply(&stacking);
        effects.apply(&stacking);
        effects.apply(&replacing);
        assert_eq!(effects.stacks(1), 1);
        assert!(approx(effects.remaining(1).unwrap_or_default(), 2.0));
    }

    #[test]
    fn test_expiry_restores_base_without_drift() {
        let mut effects = StatusEffects::new(7.3, 1.1);
        for _ in 0..100 {
            effects.apply(&slow());
            effects.tick(2.5);
        }
        assert_eq!(effects.instances().count(), 0);
        assert_eq!(effects.speed(), 7.3);
        assert_eq!(effects.anim_speed(), 1.1);
    }

    #[test]
    fn test_remove() {
        let mut effects = StatusEffects::new(1.0, 1.0);
        effects.apply(&slow());
        assert!(effects.remove(1));
        assert!(!effects.remove(1));
        assert_eq!(effects.speed_multiplier(), 1.0);
    }
}
