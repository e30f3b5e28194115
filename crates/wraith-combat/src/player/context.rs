//! Shared player context.
//!
//! Every state reads it; only the current state writes it. Collaborators
//! that may be missing (animator, body, event bus) are `Option`s and every
//! call through them is guarded.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use wraith_common::{EntityId, WraithError};

use crate::ability::{Ability, AbilityBuilder, AbilityKind, AbilitySet};
use crate::collaborators::{params, AnimationSink, Mover, PhysicsBody, SpatialFrame};
use crate::config::{AbilityCost, CombatConfig};
use crate::damage::{AttackKind, AttackProfile, BonusStacks, DamageInputs};
use crate::error::CombatResult;
use crate::events::{CombatEvent, EndReason, EventBus};
use crate::gauge::{Health, SharedGauge};
use crate::hit_relay::HitRelay;
use crate::status::StatusEffects;

// ============================================================================
// Attacker
// ============================================================================

/// Weapon hit window plus the combo state of the running attack.
#[derive(Debug, Clone)]
pub struct Attacker {
    pub(crate) relay: HitRelay,
    pub(crate) kind: Option<AttackKind>,
    pub(crate) elapsed: f32,
    pub(crate) combo_step: u32,
    pub(crate) window_open: bool,
    pub(crate) queued: bool,
}

impl Attacker {
    /// Idle attacker for `owner`.
    #[must_use]
    pub fn new(owner: EntityId) -> Self {
        Self {
            relay: HitRelay::new(owner),
            kind: None,
            elapsed: 0.0,
            combo_step: 0,
            window_open: false,
            queued: false,
        }
    }

    /// Weapon hit relay.
    #[must_use]
    pub fn relay(&self) -> &HitRelay {
        &self.relay
    }

    /// Running attack.
    #[must_use]
    pub fn kind(&self) -> Option<AttackKind> {
        self.kind
    }

    /// Seconds since the current swing started.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Swing number in the current chain (1-based, 0 when idle).
    #[must_use]
    pub fn combo_step(&self) -> u32 {
        self.combo_step
    }

    /// Check if the combo window is open.
    #[must_use]
    pub fn is_window_open(&self) -> bool {
        self.window_open
    }

    /// Check if a follow-up request is waiting for the window.
    #[must_use]
    pub fn has_queued(&self) -> bool {
        self.queued
    }

    pub(crate) fn begin(&mut self, kind: AttackKind) {
        self.kind = Some(kind);
        self.elapsed = 0.0;
        self.combo_step = 1;
        self.window_open = false;
        self.queued = false;
    }

    pub(crate) fn end(&mut self) {
        self.relay.close_window();
        self.kind = None;
        self.elapsed = 0.0;
        self.combo_step = 0;
        self.window_open = false;
        self.queued = false;
    }
}

// ============================================================================
// Context
// ============================================================================

fn ability(kind: AbilityKind, gauge: &SharedGauge, cost: AbilityCost) -> AbilityBuilder {
    Ability::builder(kind)
        .gauge(gauge.clone())
        .activation_cost(cost.activation)
        .per_second_cost(cost.per_second)
}

/// Everything the player states share.
pub struct PlayerContext {
    pub(crate) actor: EntityId,
    pub(crate) config: Arc<CombatConfig>,
    pub(crate) health: Health,
    pub(crate) stamina: SharedGauge,
    pub(crate) focus: SharedGauge,
    pub(crate) abilities: AbilitySet,
    pub(crate) mover: Mover,
    pub(crate) attacker: Attacker,
    pub(crate) animator: Option<Box<dyn AnimationSink>>,
    pub(crate) body: Option<Box<dyn PhysicsBody>>,
    pub(crate) frame: SpatialFrame,
    pub(crate) locked_on: bool,
    pub(crate) ghost: bool,
    pub(crate) just_avoid_remaining: f32,
    pub(crate) bonus: BonusStacks,
    pub(crate) status: StatusEffects,
    pub(crate) events: Option<EventBus>,
}

impl fmt::Debug for PlayerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerContext")
            .field("actor", &self.actor)
            .field("health", &self.health.value())
            .field("stamina", &self.stamina.value())
            .field("focus", &self.focus.value())
            .field("ghost", &self.ghost)
            .field("locked_on", &self.locked_on)
            .field("has_animator", &self.animator.is_some())
            .field("has_body", &self.body.is_some())
            .finish_non_exhaustive()
    }
}

impl PlayerContext {
    /// Wire gauges and abilities from config.
    ///
    /// Fails fast on invalid gauge or ability parameters.
    pub fn new(actor: EntityId, config: Arc<CombatConfig>) -> CombatResult<Self> {
        if !actor.is_valid() {
            return Err(WraithError::invalid("actor", "player needs a non-null entity id").into());
        }
        let p = &config.player;
        let health = Health::new(actor, p.health.max, p.health.regen_per_second)?;
        let stamina = SharedGauge::with_capacity(p.stamina.max, p.stamina.regen_per_second)?;
        let focus = SharedGauge::with_capacity(p.focus.max, p.focus.regen_per_second)?;

        let abilities = AbilitySet::new()
            .with(ability(AbilityKind::Sprint, &stamina, p.sprint).build()?)
            .with(ability(AbilityKind::Ghost, &focus, p.ghost).build()?)
            .with(ability(AbilityKind::Heal, &focus, p.heal).build()?)
            .with(
                ability(AbilityKind::SelfSacrifice, &focus, p.self_sacrifice)
                    .min_health_ratio(p.self_sacrifice_min_health_ratio)
                    .build()?,
            );

        let damage = &config.damage;
        Ok(Self {
            actor,
            health,
            stamina,
            focus,
            abilities,
            mover: Mover::new(p.mover),
            attacker: Attacker::new(actor),
            animator: None,
            body: None,
            frame: SpatialFrame::default(),
            locked_on: false,
            ghost: false,
            just_avoid_remaining: 0.0,
            bonus: BonusStacks::new(damage.bonus_max_stacks, damage.bonus_duration),
            status: StatusEffects::new(p.mover.walk_speed, p.anim_speed),
            events: None,
            config,
        })
    }

    /// Attach an animation sink.
    #[must_use]
    pub fn with_animator(mut self, animator: Box<dyn AnimationSink>) -> Self {
        self.animator = Some(animator);
        self
    }

    /// Attach a physics body.
    #[must_use]
    pub fn with_body(mut self, body: Box<dyn PhysicsBody>) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach an event bus.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    // === Read access ===

    /// Player entity.
    #[must_use]
    pub fn actor(&self) -> EntityId {
        self.actor
    }

    /// Shared config.
    #[must_use]
    pub fn config(&self) -> &Arc<CombatConfig> {
        &self.config
    }

    /// Health pool.
    #[must_use]
    pub fn health(&self) -> &Health {
        &self.health
    }

    /// Health pool, for subscriptions.
    pub fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    /// Stamina gauge.
    #[must_use]
    pub fn stamina(&self) -> &SharedGauge {
        &self.stamina
    }

    /// Focus gauge.
    #[must_use]
    pub fn focus(&self) -> &SharedGauge {
        &self.focus
    }

    /// Abilities.
    #[must_use]
    pub fn abilities(&self) -> &AbilitySet {
        &self.abilities
    }

    /// Abilities, for subscriptions.
    pub fn abilities_mut(&mut self) -> &mut AbilitySet {
        &mut self.abilities
    }

    /// Mover.
    #[must_use]
    pub fn mover(&self) -> &Mover {
        &self.mover
    }

    /// Attacker.
    #[must_use]
    pub fn attacker(&self) -> &Attacker {
        &self.attacker
    }

    /// Status effects.
    #[must_use]
    pub fn status(&self) -> &StatusEffects {
        &self.status
    }

    /// Status effects, for applying new ones.
    pub fn status_mut(&mut self) -> &mut StatusEffects {
        &mut self.status
    }

    /// Timed bonus stacks.
    #[must_use]
    pub fn bonus(&self) -> &BonusStacks {
        &self.bonus
    }

    /// Check if in ghost mode (invulnerable, attacks disabled).
    #[must_use]
    pub fn is_ghost(&self) -> bool {
        self.ghost
    }

    /// Check if locked on.
    #[must_use]
    pub fn is_locked_on(&self) -> bool {
        self.locked_on
    }

    /// Check if a just-avoid counter is available.
    #[must_use]
    pub fn just_avoid_armed(&self) -> bool {
        self.just_avoid_remaining > 0.0
    }

    /// Latest spatial frame.
    #[must_use]
    pub fn frame(&self) -> &SpatialFrame {
        &self.frame
    }

    /// Attached body.
    pub fn body_mut(&mut self) -> Option<&mut (dyn PhysicsBody + 'static)> {
        self.body.as_deref_mut()
    }

    // === Attack helpers ===

    /// Profile of an attack kind.
    #[must_use]
    pub fn attack_profile(&self, kind: AttackKind) -> AttackProfile {
        *self.config.player.attacks.get(kind)
    }

    /// Damage inputs for the running attack.
    ///
    /// The low-health tier is read from the current health ratio, so
    /// self-sacrifice drains feed straight into it.
    #[must_use]
    pub fn damage_inputs(&self) -> DamageInputs {
        let kind = self.attacker.kind.unwrap_or(AttackKind::Light);
        let damage = &self.config.damage;
        DamageInputs::new(self.attack_profile(kind).base_power)
            .with_passives(damage.folded_passives())
            .with_tier(damage.low_health_tiers.multiplier_for(self.health.ratio()))
            .with_stacks(self.bonus.stacks(), damage.bonus_per_stack, damage.bonus_max_stacks)
    }

    pub(crate) fn arm_just_avoid(&mut self) {
        self.just_avoid_remaining = self.config.player.just_avoid_window;
    }

    pub(crate) fn take_just_avoid(&mut self) -> bool {
        let armed = self.just_avoid_armed();
        self.just_avoid_remaining = 0.0;
        armed
    }

    // === Abilities ===

    /// Begin an ability, publishing `AbilityStarted` if it was not running.
    pub(crate) fn begin_ability(&mut self, kind: AbilityKind) -> bool {
        let ratio = self.health.ratio();
        let Some(ability) = self.abilities.get_mut(kind) else {
            debug!(actor = %self.actor, ?kind, "ability not wired");
            return false;
        };
        let was_active = ability.is_active();
        if !ability.try_begin(ratio) {
            return false;
        }
        if !was_active {
            self.publish(CombatEvent::AbilityStarted {
                actor: self.actor,
                kind,
            });
        }
        true
    }

    /// End an ability, publishing `AbilityEnded` if it was running.
    pub(crate) fn end_ability(&mut self, kind: AbilityKind, reason: EndReason) {
        if self.abilities.end(kind) {
            self.publish(CombatEvent::AbilityEnded {
                actor: self.actor,
                kind,
                reason,
            });
        }
    }

    /// Check if an ability's activation is affordable right now.
    #[must_use]
    pub fn can_afford(&self, kind: AbilityKind) -> bool {
        self.abilities
            .get(kind)
            .is_some_and(|a| a.gauge().can_afford(a.activation_cost()))
    }

    // === Collaborators ===

    pub(crate) fn publish(&self, event: CombatEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    pub(crate) fn trigger(&mut self, name: &str) {
        if let Some(animator) = self.animator.as_mut() {
            animator.play_trigger(name);
        }
    }

    pub(crate) fn set_bool(&mut self, name: &str, value: bool) {
        if let Some(animator) = self.animator.as_mut() {
            animator.set_bool(name, value);
        }
    }

    pub(crate) fn set_int(&mut self, name: &str, value: i32) {
        if let Some(animator) = self.animator.as_mut() {
            animator.set_int(name, value);
        }
    }

    pub(crate) fn set_float(&mut self, name: &str, value: f32) {
        if let Some(animator) = self.animator.as_mut() {
            animator.set_float(name, value);
        }
    }

    pub(crate) fn toggle_lock_on(&mut self) {
        self.locked_on = !self.locked_on && self.frame.target_position.is_some();
        let locked = self.locked_on;
        self.set_bool(params::LOCKED_ON, locked);
    }

    /// Frame the mover should steer by: the target only counts while locked on.
    pub(crate) fn mover_frame(&self) -> SpatialFrame {
        SpatialFrame {
            target_position: self.frame.target_position.filter(|_| self.locked_on),
            ..self.frame
        }
    }
}
