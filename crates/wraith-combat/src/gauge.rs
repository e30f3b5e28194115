//! Resource gauges and health.
//!
//! This module provides:
//! - `ResourceGauge`: bounded pool with passive regen and all-or-nothing consume
//! - `SharedGauge`: handle for gauges shared between an actor and its abilities
//! - `Health`: gauge variant that raises a one-shot death signal
//!
//! Insufficient funds is a normal `false` return, never an error.

use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use wraith_common::EntityId;

use crate::damage::DamageInfo;
use crate::observable::{Observable, Signal};

/// Gauge construction errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GaugeError {
    /// Max must be a positive, finite number.
    #[error("gauge max must be positive and finite, got {0}")]
    NonPositiveMax(f32),
    /// Regen must be zero or positive.
    #[error("gauge regen must be non-negative and finite, got {0}")]
    NegativeRegen(f32),
}

// ============================================================================
// Resource Gauge
// ============================================================================

/// A bounded numeric pool. `value` never leaves `[0, max]`.
#[derive(Debug)]
pub struct ResourceGauge {
    value: Observable<f32>,
    max: f32,
    passive_regen_per_second: f32,
}

impl ResourceGauge {
    /// Create a full gauge.
    pub fn new(max: f32, passive_regen_per_second: f32) -> Result<Self, GaugeError> {
        if !max.is_finite() || max <= 0.0 {
            return Err(GaugeError::NonPositiveMax(max));
        }
        if !passive_regen_per_second.is_finite() || passive_regen_per_second < 0.0 {
            return Err(GaugeError::NegativeRegen(passive_regen_per_second));
        }
        Ok(Self {
            value: Observable::new(max),
            max,
            passive_regen_per_second,
        })
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> f32 {
        *self.value.get()
    }

    /// Maximum value.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Passive regeneration rate.
    #[must_use]
    pub fn passive_regen_per_second(&self) -> f32 {
        self.passive_regen_per_second
    }

    /// Fill ratio in `[0, 1]`.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        self.value() / self.max
    }

    /// Check if the gauge is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value() <= 0.0
    }

    /// Check if the gauge is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.value() >= self.max
    }

    /// Check if `consume(amount)` would succeed.
    #[must_use]
    pub fn can_afford(&self, amount: f32) -> bool {
        self.value() >= amount.max(0.0)
    }

    /// Deduct `amount` iff the gauge holds at least that much.
    ///
    /// Negative amounts count as zero. On failure nothing changes.
    pub fn consume(&mut self, amount: f32) -> bool {
        let amount = amount.max(0.0);
        let current = self.value();
        if current < amount {
            return false;
        }
        self.value.set((current - amount).max(0.0));
        true
    }

    /// Add to the gauge, clamped to max. Non-positive amounts are ignored.
    pub fn add(&mut self, amount: f32) {
        if amount.is_nan() || amount <= 0.0 {
            return;
        }
        let next = (self.value() + amount).min(self.max);
        self.value.set(next);
    }

    /// Apply passive regeneration for `dt` seconds.
    ///
    /// The caller skips this on ticks where something drained the gauge.
    pub fn tick_passive_regen(&mut self, dt: f32) {
        if dt > 0.0 {
            self.add(self.passive_regen_per_second * dt);
        }
    }

    /// Saturating removal. Returns the amount actually removed.
    ///
    /// Only damage paths use this; ability costs go through `consume`.
    pub fn drain(&mut self, amount: f32) -> f32 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let current = self.value();
        let removed = amount.min(current);
        self.value.set(current - removed);
        removed
    }

    /// Restore to max.
    pub fn refill(&mut self) {
        self.value.set(self.max);
    }

    /// Value observable, for UI bindings.
    pub fn on_value_changed(&mut self) -> &mut Observable<f32> {
        &mut self.value
    }

    /// Drop every value subscriber.
    pub fn dispose(&mut self) {
        self.value.clear_subscribers();
    }
}

// ============================================================================
// Shared Gauge
// ============================================================================

/// A gauge owned by one actor and borrowed by the abilities bound to it.
///
/// Only the owning actor's tick touches it, so the lock is never contended.
#[derive(Clone)]
pub struct SharedGauge(Arc<Mutex<ResourceGauge>>);

impl SharedGauge {
    /// Wrap a gauge.
    #[must_use]
    pub fn new(gauge: ResourceGauge) -> Self {
        Self(Arc::new(Mutex::new(gauge)))
    }

    /// Build and wrap a full gauge.
    pub fn with_capacity(max: f32, passive_regen_per_second: f32) -> Result<Self, GaugeError> {
        ResourceGauge::new(max, passive_regen_per_second).map(Self::new)
    }

    /// Lock for direct access.
    pub fn lock(&self) -> MutexGuard<'_, ResourceGauge> {
        self.0.lock()
    }

    /// See [`ResourceGauge::consume`].
    pub fn consume(&self, amount: f32) -> bool {
        self.0.lock().consume(amount)
    }

    /// See [`ResourceGauge::add`].
    pub fn add(&self, amount: f32) {
        self.0.lock().add(amount);
    }

    /// See [`ResourceGauge::tick_passive_regen`].
    pub fn tick_passive_regen(&self, dt: f32) {
        self.0.lock().tick_passive_regen(dt);
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.0.lock().value()
    }

    /// Maximum value.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.0.lock().max()
    }

    /// Fill ratio.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        self.0.lock().ratio()
    }

    /// See [`ResourceGauge::can_afford`].
    #[must_use]
    pub fn can_afford(&self, amount: f32) -> bool {
        self.0.lock().can_afford(amount)
    }

    /// Check if both handles point at the same gauge.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedGauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gauge = self.0.lock();
        f.debug_struct("SharedGauge")
            .field("value", &gauge.value())
            .field("max", &gauge.max())
            .finish()
    }
}

// ============================================================================
// Health
// ============================================================================

/// Self-inflicted drains never take health below this.
pub const NON_LETHAL_FLOOR: f32 = 1.0;

/// Result of applying damage to a health pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Damage applied; the target survives.
    Applied {
        /// Health removed.
        amount: f32,
        /// Health left.
        remaining: f32,
    },
    /// This hit took health to zero.
    Killed {
        /// Health removed.
        amount: f32,
    },
    /// Nothing happened (already dead, or zero damage).
    Ignored,
}

/// Health pool with one-shot death detection.
#[derive(Debug)]
pub struct Health {
    owner: EntityId,
    gauge: ResourceGauge,
    dead: bool,
    on_death: Signal<EntityId>,
}

impl Health {
    /// Create full health for `owner`.
    pub fn new(owner: EntityId, max: f32, passive_regen_per_second: f32) -> Result<Self, GaugeError> {
        Ok(Self {
            owner,
            gauge: ResourceGauge::new(max, passive_regen_per_second)?,
            dead: false,
            on_death: Signal::new(),
        })
    }

    /// Owning entity.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Current health.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.gauge.value()
    }

    /// Max health.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.gauge.max()
    }

    /// Health ratio in `[0, 1]`.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        self.gauge.ratio()
    }

    /// Check if dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Damage-apply entry point.
    pub fn apply_damage(&mut self, info: &DamageInfo) -> DamageOutcome {
        if self.dead || info.amount() <= 0.0 {
            return DamageOutcome::Ignored;
        }
        let removed = self.gauge.drain(info.amount());
        if self.gauge.is_empty() {
            self.dead = true;
            info!(actor = %self.owner, instigator = %info.instigator(), "actor died");
            self.on_death.emit(&self.owner);
            DamageOutcome::Killed { amount: removed }
        } else {
            DamageOutcome::Applied {
                amount: removed,
                remaining: self.gauge.value(),
            }
        }
    }

    /// Restore health. Ignored once dead.
    pub fn heal(&mut self, amount: f32) {
        if !self.dead {
            self.gauge.add(amount);
        }
    }

    /// Self-inflicted loss. Never lethal; returns the amount removed.
    pub fn sacrifice(&mut self, amount: f32) -> f32 {
        if self.dead {
            return 0.0;
        }
        let headroom = (self.gauge.value() - NON_LETHAL_FLOOR).max(0.0);
        self.gauge.drain(amount.min(headroom))
    }

    /// Passive regeneration. Ignored once dead.
    pub fn tick_passive_regen(&mut self, dt: f32) {
        if !self.dead {
            self.gauge.tick_passive_regen(dt);
        }
    }

    /// Value observable, for UI bindings.
    pub fn on_value_changed(&mut self) -> &mut Observable<f32> {
        self.gauge.on_value_changed()
    }

    /// Death signal, emitted exactly once.
    pub fn on_death(&mut self) -> &mut Signal<EntityId> {
        &mut self.on_death
    }

    /// Drop every subscriber.
    pub fn dispose(&mut self) {
        self.gauge.dispose();
        self.on_death.clear_subscribers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wraith_common::Vec3;

    fn hit(target: EntityId, amount: f32) -> DamageInfo {
        DamageInfo::new(amount, Vec3::ZERO, Vec3::Y, EntityId::from_raw(999), target)
    }

    #[test]
    fn test_gauge_starts_full() {
        let gauge = ResourceGauge::new(100.0, 5.0).expect("valid gauge");
        assert_eq!(gauge.value(), 100.0);
        assert!(gauge.is_full());
    }

    #[test]
    fn test_gauge_rejects_bad_config() {
        assert_eq!(
            ResourceGauge::new(0.0, 1.0).err(),
            Some(GaugeError::NonPositiveMax(0.0))
        );
        assert_eq!(
            ResourceGauge::new(10.0, -1.0).err(),
            Some(GaugeError::NegativeRegen(-1.0))
        );
    }

    #[test]
    fn test_consume_all_or_nothing() {
        let mut gauge = ResourceGauge::new(50.0, 0.0).expect("valid gauge");

        assert!(gauge.consume(30.0));
        assert_eq!(gauge.value(), 20.0);

        assert!(!gauge.consume(30.0));
        assert_eq!(gauge.value(), 20.0);
    }

    #[test]
    fn test_negative_consume_counts_as_zero() {
        let mut gauge = ResourceGauge::new(10.0, 0.0).expect("valid gauge");
        assert!(gauge.consume(-5.0));
        assert_eq!(gauge.value(), 10.0);
    }

    #[test]
    fn test_add_clamps_and_ignores_non_positive() {
        let mut gauge = ResourceGauge::new(10.0, 0.0).expect("valid gauge");
        gauge.consume(8.0);
        gauge.add(-3.0);
        assert_eq!(gauge.value(), 2.0);
        gauge.add(100.0);
        assert_eq!(gauge.value(), 10.0);
    }

    #[test]
    fn test_passive_regen() {
        let mut gauge = ResourceGauge::new(100.0, 10.0).expect("valid gauge");
        gauge.consume(50.0);
        gauge.tick_passive_regen(1.0);
        assert_eq!(gauge.value(), 60.0);
        gauge.tick_passive_regen(-1.0);
        assert_eq!(gauge.value(), 60.0);
    }

    #[test]
    fn test_shared_gauge_identity() {
        let a = SharedGauge::with_capacity(10.0, 0.0).expect("valid gauge");
        let b = a.clone();
        let c = SharedGauge::with_capacity(10.0, 0.0).expect("valid gauge");
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));

        assert!(b.consume(4.0));
        assert_eq!(a.value(), 6.0);
    }

    #[test]
    fn test_health_death_fires_once() {
        let owner = EntityId::from_raw(1);
        let mut health = Health::new(owner, 30.0, 0.0).expect("valid health");
        let deaths = Arc::new(Mutex::new(0));
        let d = Arc::clone(&deaths);
        health.on_death().subscribe(move |_| *d.lock() += 1);

        assert_eq!(
            health.apply_damage(&hit(owner, 10.0)),
            DamageOutcome::Applied {
                amount: 10.0,
                remaining: 20.0
            }
        );
        assert_eq!(
            health.apply_damage(&hit(owner, 50.0)),
            DamageOutcome::Killed { amount: 20.0 }
        );
        assert_eq!(health.apply_damage(&hit(owner, 5.0)), DamageOutcome::Ignored);
        assert!(health.is_dead());
        assert_eq!(*deaths.lock(), 1);
    }

    #[test]
    fn test_sacrifice_is_not_lethal() {
        let mut health = Health::new(EntityId::from_raw(1), 10.0, 0.0).expect("valid health");
        let removed = health.sacrifice(100.0);
        assert_eq!(removed, 9.0);
        assert_eq!(health.value(), NON_LETHAL_FLOOR);
        assert!(!health.is_dead());
    }

    #[test]
    fn test_heal_ignored_when_dead() {
        let owner = EntityId::from_raw(1);
        let mut health = Health::new(owner, 10.0, 1.0).expect("valid health");
        health.apply_damage(&hit(owner, 10.0));
        health.heal(5.0);
        health.tick_passive_regen(1.0);
        assert_eq!(health.value(), 0.0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Consume(f32),
        Add(f32),
        Regen(f32),
        Drain(f32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-50.0_f32..150.0).prop_map(Op::Consume),
            (-50.0_f32..150.0).prop_map(Op::Add),
            (0.0_f32..2.0).prop_map(Op::Regen),
            (-50.0_f32..150.0).prop_map(Op::Drain),
        ]
    }

    proptest! {
        #[test]
        fn prop_value_stays_in_bounds(ops in proptest::collection::vec(op(), 0..64)) {
            let mut gauge = ResourceGauge::new(100.0, 7.5).expect("valid gauge");
            for op in ops {
                match op {
                    Op::Consume(a) => { gauge.consume(a); },
                    Op::Add(a) => gauge.add(a),
                    Op::Regen(dt) => gauge.tick_passive_regen(dt),
                    Op::Drain(a) => { gauge.drain(a); },
                }
                prop_assert!(gauge.value() >= 0.0);
                prop_assert!(gauge.value() <= gauge.max());
            }
        }

        #[test]
        fn prop_consume_never_partial(start in 0.0_f32..100.0, amount in 0.0_f32..150.0) {
            let mut gauge = ResourceGauge::new(100.0, 0.0).expect("valid gauge");
            gauge.consume(100.0 - start);
            let before = gauge.value();
            if gauge.consume(amount) {
                prop_assert!((before - gauge.value() - amount).abs() < 1e-3);
            } else {
                prop_assert_eq!(before, gauge.value());
            }
        }
    }
}
