//! Gauge-gated abilities.
//!
//! This module provides:
//! - `Ability`: `Inactive -> Active -> Inactive` with activation and sustain costs
//! - Per-kind consumed-quantity contract (gauge cost or elapsed time)
//! - `AbilitySet`: every ability of one actor, ticked together
//!
//! A failed `try_begin` and starvation are expected outcomes, not errors.
//! The only error is wiring: building an ability without a gauge.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::gauge::SharedGauge;
use crate::observable::{Observable, Signal};

/// Ability construction errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AbilityError {
    /// No gauge was bound.
    #[error("{0:?} ability built without a gauge")]
    MissingGauge(AbilityKind),
    /// A cost was negative or not finite.
    #[error("{kind:?} ability has invalid {field}: {value}")]
    InvalidCost {
        /// Ability kind
        kind: AbilityKind,
        /// Offending field
        field: &'static str,
        /// Offending value
        value: f32,
    },
}

// ============================================================================
// Kinds
// ============================================================================

/// Every ability an actor can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Dash stamina drain.
    Sprint,
    /// Evasion: invulnerable, attacks disabled.
    Ghost,
    /// Channeled health recovery.
    Heal,
    /// Trades health for power; survives state changes.
    SelfSacrifice,
}

impl AbilityKind {
    /// All kinds.
    pub const ALL: [Self; 4] = [Self::Sprint, Self::Ghost, Self::Heal, Self::SelfSacrifice];

    /// Whether this kind reports elapsed time instead of gauge cost.
    #[must_use]
    pub const fn reports_elapsed(self) -> bool {
        matches!(self, Self::Heal | Self::SelfSacrifice)
    }
}

/// What an active ability reports each tick it is sustained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConsumedQuantity {
    /// Raw gauge cost paid this tick.
    GaugeCost(f32),
    /// Seconds sustained this tick; the receiver converts it.
    Elapsed(f32),
}

impl ConsumedQuantity {
    /// The raw number, whichever variant.
    #[must_use]
    pub const fn value(self) -> f32 {
        match self {
            Self::GaugeCost(v) | Self::Elapsed(v) => v,
        }
    }
}

/// Result of ticking one ability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbilityTick {
    /// Not running.
    Inactive,
    /// Cost paid; still running.
    Sustained(ConsumedQuantity),
    /// Cost could not be paid; the ability just ended.
    Starved,
}

// ============================================================================
// Ability
// ============================================================================

/// Builder for [`Ability`].
#[derive(Debug, Clone)]
pub struct AbilityBuilder {
    kind: AbilityKind,
    gauge: Option<SharedGauge>,
    activation_cost: f32,
    per_second_cost: f32,
    min_health_ratio: Option<f32>,
}

impl AbilityBuilder {
    /// Bind the gauge this ability draws from.
    #[must_use]
    pub fn gauge(mut self, gauge: SharedGauge) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Set the one-off activation cost.
    #[must_use]
    pub fn activation_cost(mut self, cost: f32) -> Self {
        self.activation_cost = cost;
        self
    }

    /// Set the sustain cost per second.
    #[must_use]
    pub fn per_second_cost(mut self, cost: f32) -> Self {
        self.per_second_cost = cost;
        self
    }

    /// Require health ratio strictly above `ratio` to begin.
    #[must_use]
    pub fn min_health_ratio(mut self, ratio: f32) -> Self {
        self.min_health_ratio = Some(ratio);
        self
    }

    /// Build the ability, failing fast on missing wiring.
    pub fn build(self) -> Result<Ability, AbilityError> {
        let gauge = self.gauge.ok_or(AbilityError::MissingGauge(self.kind))?;
        for (field, value) in [
            ("activation_cost", self.activation_cost),
            ("per_second_cost", self.per_second_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AbilityError::InvalidCost {
                    kind: self.kind,
                    field,
                    value,
                });
            }
        }
        Ok(Ability {
            kind: self.kind,
            gauge,
            activation_cost: self.activation_cost,
            per_second_cost: self.per_second_cost,
            min_health_ratio: self.min_health_ratio,
            active: Observable::new(false),
            consumed: Signal::new(),
            active_time: 0.0,
        })
    }
}

/// A gauge-gated temporary behavior mode.
#[derive(Debug)]
pub struct Ability {
    kind: AbilityKind,
    gauge: SharedGauge,
    activation_cost: f32,
    per_second_cost: f32,
    min_health_ratio: Option<f32>,
    active: Observable<bool>,
    consumed: Signal<ConsumedQuantity>,
    active_time: f32,
}

impl Ability {
    /// Start building an ability of `kind`.
    #[must_use]
    pub fn builder(kind: AbilityKind) -> AbilityBuilder {
        AbilityBuilder {
            kind,
            gauge: None,
            activation_cost: 0.0,
            per_second_cost: 0.0,
            min_health_ratio: None,
        }
    }

    /// Ability kind.
    #[must_use]
    pub fn kind(&self) -> AbilityKind {
        self.kind
    }

    /// Bound gauge.
    #[must_use]
    pub fn gauge(&self) -> &SharedGauge {
        &self.gauge
    }

    /// Activation cost.
    #[must_use]
    pub fn activation_cost(&self) -> f32 {
        self.activation_cost
    }

    /// Sustain cost per second.
    #[must_use]
    pub fn per_second_cost(&self) -> f32 {
        self.per_second_cost
    }

    /// Check if running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self.active.get()
    }

    /// Seconds since the current activation began (0 when inactive).
    #[must_use]
    pub fn active_time(&self) -> f32 {
        self.active_time
    }

    /// Domain precondition, independent of cost.
    #[must_use]
    pub fn can_begin(&self, health_ratio: f32) -> bool {
        self.min_health_ratio
            .map_or(true, |floor| health_ratio > floor)
    }

    /// Try to activate: precondition, then activation cost.
    ///
    /// Returns true if the ability is active afterwards. An already-active
    /// ability stays active and pays nothing.
    pub fn try_begin(&mut self, health_ratio: f32) -> bool {
        if self.is_active() {
            return true;
        }
        if !self.can_begin(health_ratio) {
            debug!(kind = ?self.kind, health_ratio, "ability precondition failed");
            return false;
        }
        if !self.gauge.consume(self.activation_cost) {
            debug!(kind = ?self.kind, cost = self.activation_cost, "ability unaffordable");
            return false;
        }
        self.active_time = 0.0;
        self.active.set(true);
        debug!(kind = ?self.kind, "ability started");
        true
    }

    /// Pay the sustain cost for `dt` seconds.
    ///
    /// One failed payment ends the ability within the same tick.
    pub fn tick(&mut self, dt: f32) -> AbilityTick {
        if !self.is_active() {
            return AbilityTick::Inactive;
        }
        let cost = self.per_second_cost * dt.max(0.0);
        if !self.gauge.consume(cost) {
            self.active_time = 0.0;
            self.active.set(false);
            debug!(kind = ?self.kind, "ability starved");
            return AbilityTick::Starved;
        }
        self.active_time += dt.max(0.0);
        let quantity = if self.kind.reports_elapsed() {
            ConsumedQuantity::Elapsed(dt.max(0.0))
        } else {
            ConsumedQuantity::GaugeCost(cost)
        };
        self.consumed.emit(&quantity);
        AbilityTick::Sustained(quantity)
    }

    /// Force inactive. Returns true if it was running.
    pub fn end(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.active_time = 0.0;
        self.active.set(false);
        debug!(kind = ?self.kind, "ability ended");
        true
    }

    /// Active-flag observable.
    pub fn on_active_changed(&mut self) -> &mut Observable<bool> {
        &mut self.active
    }

    /// Consumed-quantity stream.
    pub fn on_consumed(&mut self) -> &mut Signal<ConsumedQuantity> {
        &mut self.consumed
    }

    /// End the ability and drop every subscriber.
    pub fn dispose(&mut self) {
        self.end();
        self.active.clear_subscribers();
        self.consumed.clear_subscribers();
    }
}

// ============================================================================
// Ability Set
// ============================================================================

/// Outcome of ticking every ability of an actor.
#[derive(Debug, Default)]
pub struct AbilitySetTick {
    /// Per-ability results, only for abilities that were active.
    pub reports: Vec<(AbilityKind, AbilityTick)>,
    /// Gauges something tried to drain this tick (skip their passive regen).
    pub drained: Vec<SharedGauge>,
}

impl AbilitySetTick {
    /// Whether `gauge` was drained this tick.
    #[must_use]
    pub fn drained(&self, gauge: &SharedGauge) -> bool {
        self.drained.iter().any(|g| g.ptr_eq(gauge))
    }

    /// Result for one kind, if it was active.
    #[must_use]
    pub fn report(&self, kind: AbilityKind) -> Option<AbilityTick> {
        self.reports
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, tick)| *tick)
    }
}

/// Every ability of one actor.
#[derive(Debug, Default)]
pub struct AbilitySet {
    abilities: Vec<Ability>,
}

impl AbilitySet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ability, replacing any of the same kind.
    pub fn insert(&mut self, ability: Ability) {
        self.abilities.retain(|a| a.kind != ability.kind);
        self.abilities.push(ability);
    }

    /// Add an ability (builder pattern).
    #[must_use]
    pub fn with(mut self, ability: Ability) -> Self {
        self.insert(ability);
        self
    }

    /// Look up an ability.
    #[must_use]
    pub fn get(&self, kind: AbilityKind) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.kind == kind)
    }

    /// Look up an ability mutably.
    pub fn get_mut(&mut self, kind: AbilityKind) -> Option<&mut Ability> {
        self.abilities.iter_mut().find(|a| a.kind == kind)
    }

    /// Check if an ability is running. Missing abilities are never active.
    #[must_use]
    pub fn is_active(&self, kind: AbilityKind) -> bool {
        self.get(kind).is_some_and(Ability::is_active)
    }

    /// End one ability. Returns true if it was running.
    pub fn end(&mut self, kind: AbilityKind) -> bool {
        self.get_mut(kind).is_some_and(Ability::end)
    }

    /// End every ability.
    pub fn end_all(&mut self) {
        for ability in &mut self.abilities {
            ability.end();
        }
    }

    /// Tick every active ability once.
    pub fn tick_all(&mut self, dt: f32) -> AbilitySetTick {
        let mut out = AbilitySetTick::default();
        for ability in &mut self.abilities {
            if !ability.is_active() {
                continue;
            }
            if !out.drained(&ability.gauge) {
                out.drained.push(ability.gauge.clone());
            }
            out.reports.push((ability.kind, ability.tick(dt)));
        }
        out
    }

    /// Dispose every ability.
    pub fn dispose(&mut self) {
        for ability in &mut self.abilities {
            ability.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn gauge(max: f32) -> SharedGauge {
        SharedGauge::with_capacity(max, 0.0).expect("valid gauge")
    }

    #[test]
    fn test_build_requires_gauge() {
        let err = Ability::builder(AbilityKind::Ghost).build().err();
        assert_eq!(err, Some(AbilityError::MissingGauge(AbilityKind::Ghost)));
    }

    #[test]
    fn test_build_rejects_negative_cost() {
        let err = Ability::builder(AbilityKind::Heal)
            .gauge(gauge(10.0))
            .per_second_cost(-1.0)
            .build()
            .err();
        assert!(matches!(err, Some(AbilityError::InvalidCost { .. })));
    }

    #[test]
    fn test_try_begin_pays_activation() {
        let g = gauge(100.0);
        let mut ghost = Ability::builder(AbilityKind::Ghost)
            .gauge(g.clone())
            .activation_cost(30.0)
            .build()
            .expect("valid ability");

        assert!(ghost.try_begin(1.0));
        assert_eq!(g.value(), 70.0);
        // Already active: no second charge
        assert!(ghost.try_begin(1.0));
        assert_eq!(g.value(), 70.0);
    }

    #[test]
    fn test_try_begin_fails_without_funds() {
        let g = gauge(10.0);
        let mut ghost = Ability::builder(AbilityKind::Ghost)
            .gauge(g.clone())
            .activation_cost(30.0)
            .build()
            .expect("valid ability");

        assert!(!ghost.try_begin(1.0));
        assert!(!ghost.is_active());
        assert_eq!(g.value(), 10.0);
    }

    #[test]
    fn test_health_floor_precondition() {
        let mut sacrifice = Ability::builder(AbilityKind::SelfSacrifice)
            .gauge(gauge(10.0))
            .min_health_ratio(0.3)
            .build()
            .expect("valid ability");

        assert!(!sacrifice.can_begin(0.3));
        assert!(!sacrifice.try_begin(0.2));
        assert!(sacrifice.try_begin(0.31));
    }

    #[test]
    fn test_starvation_ends_within_tick() {
        let mut ghost = Ability::builder(AbilityKind::Ghost)
            .gauge(gauge(10.0))
            .per_second_cost(10.0)
            .build()
            .expect("valid ability");
        assert!(ghost.try_begin(1.0));

        assert_eq!(
            ghost.tick(0.5),
            AbilityTick::Sustained(ConsumedQuantity::GaugeCost(5.0))
        );
        assert_eq!(
            ghost.tick(0.5),
            AbilityTick::Sustained(ConsumedQuantity::GaugeCost(5.0))
        );
        assert_eq!(ghost.tick(0.5), AbilityTick::Starved);
        assert!(!ghost.is_active());
        assert_eq!(ghost.tick(0.5), AbilityTick::Inactive);
    }

    #[test]
    fn test_elapsed_kinds_report_time() {
        let mut heal = Ability::builder(AbilityKind::Heal)
            .gauge(gauge(100.0))
            .per_second_cost(20.0)
            .build()
            .expect("valid ability");
        heal.try_begin(1.0);
        assert_eq!(
            heal.tick(0.25),
            AbilityTick::Sustained(ConsumedQuantity::Elapsed(0.25))
        );
        assert!((heal.active_time() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_signals_and_dispose() {
        let flags = Arc::new(Mutex::new(Vec::new()));
        let total = Arc::new(Mutex::new(0.0_f32));
        let mut ghost = Ability::builder(AbilityKind::Ghost)
            .gauge(gauge(10.0))
            .per_second_cost(4.0)
            .build()
            .expect("valid ability");
        let f = Arc::clone(&flags);
        ghost.on_active_changed().subscribe(move |v| f.lock().push(*v));
        let t = Arc::clone(&total);
        ghost.on_consumed().subscribe(move |q| *t.lock() += q.value());

        ghost.try_begin(1.0);
        ghost.tick(1.0);
        ghost.tick(1.0);
        ghost.end();
        assert_eq!(*flags.lock(), vec![true, false]);
        assert!((*total.lock() - 8.0).abs() < 1e-6);

        ghost.dispose();
        assert_eq!(ghost.on_active_changed().subscriber_count(), 0);
        assert_eq!(ghost.on_consumed().subscriber_count(), 0);
    }

    #[test]
    fn test_set_reports_drained_gauges() {
        let stamina = gauge(100.0);
        let focus = gauge(100.0);
        let mut set = AbilitySet::new()
            .with(
                Ability::builder(AbilityKind::Sprint)
                    .gauge(stamina.clone())
                    .per_second_cost(10.0)
                    .build()
                    .expect("valid ability"),
            )
            .with(
                Ability::builder(AbilityKind::Ghost)
                    .gauge(focus.clone())
                    .per_second_cost(10.0)
                    .build()
                    .expect("valid ability"),
            );

        set.get_mut(AbilityKind::Sprint)
            .expect("sprint present")
            .try_begin(1.0);
        let tick = set.tick_all(0.1);

        assert!(tick.drained(&stamina));
        assert!(!tick.drained(&focus));
        assert!(matches!(
            tick.report(AbilityKind::Sprint),
            Some(AbilityTick::Sustained(_))
        ));
        assert_eq!(tick.report(AbilityKind::Ghost), None);
    }
}
