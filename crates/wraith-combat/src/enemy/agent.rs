//! Enemy agent: tick, pick an action, execute, wait for completion.
//!
//! Chase re-decides on a fixed interval, or as soon as the target is within
//! near range. Observe and Wait re-decide on a countdown. Every action begun,
//! Chase included, becomes the previous action for anti-repetition.
//! Busy states (Attack, Backstep, Stagger) end only when the animation layer
//! reports the action finished; no timer ever clears them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use wraith_common::{EntityId, Vec2, Vec3, WraithError};

use super::decision::{decide, EnemyAction};
use crate::collaborators::{
    params, AnimationCallback, AnimationSink, ForceMode, MoveMode, Mover, PhysicsBody, SpatialFrame,
};
use crate::config::CombatConfig;
use crate::damage::{AttackKind, DamageInfo, DamageInputs};
use crate::error::CombatResult;
use crate::events::{CombatEvent, EventBus};
use crate::gauge::{DamageOutcome, Health};
use crate::hit_relay::{ActorHierarchy, Contact, DamageSink, HitOutcome, HitRelay};
use crate::player::hit_landed;
use crate::status::StatusEffects;

/// Enemy behavior mode. Exactly one is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// No target.
    Idle,
    /// Moving toward the target.
    Chase,
    /// Running an attack clip.
    Attack,
    /// Holding distance, facing the target.
    Observe,
    /// Hopping away.
    Backstep,
    /// Standing still.
    Wait,
    /// Hit reaction.
    Stagger,
    /// Terminal.
    Dead,
}

impl EnemyState {
    /// Whether only an action-finished signal can end this state.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Attack | Self::Backstep | Self::Stagger)
    }
}

/// Enemy actor.
pub struct EnemyAgent {
    id: EntityId,
    config: Arc<CombatConfig>,
    health: Health,
    state: EnemyState,
    last_action: Option<EnemyAction>,
    attack: Option<EnemyAction>,
    timer: f32,
    distance: Option<f32>,
    frame: SpatialFrame,
    mover: Mover,
    relay: HitRelay,
    status: StatusEffects,
    pending_impulse: Option<Vec3>,
    rng: fastrand::Rng,
    animator: Option<Box<dyn AnimationSink>>,
    body: Option<Box<dyn PhysicsBody>>,
    events: Option<EventBus>,
}

impl fmt::Debug for EnemyAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnemyAgent")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("health", &self.health.value())
            .field("last_action", &self.last_action)
            .field("distance", &self.distance)
            .finish_non_exhaustive()
    }
}

impl EnemyAgent {
    /// Create an idle enemy with a seeded decision RNG.
    pub fn new(id: EntityId, config: Arc<CombatConfig>, seed: u64) -> CombatResult<Self> {
        if !id.is_valid() {
            return Err(WraithError::invalid("id", "enemy needs a non-null entity id").into());
        }
        let e = &config.enemy;
        let health = Health::new(id, e.health.max, e.health.regen_per_second)?;
        Ok(Self {
            id,
            health,
            state: EnemyState::Idle,
            last_action: None,
            attack: None,
            timer: 0.0,
            distance: None,
            frame: SpatialFrame::default(),
            mover: Mover::new(e.mover),
            relay: HitRelay::new(id),
            status: StatusEffects::new(e.mover.walk_speed, 1.0),
            pending_impulse: None,
            rng: fastrand::Rng::with_seed(seed),
            animator: None,
            body: None,
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

    /// Enemy entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EnemyState {
        self.state
    }

    /// Previous action, used to suppress immediate repeats.
    #[must_use]
    pub fn last_action(&self) -> Option<EnemyAction> {
        self.last_action
    }

    /// Running attack, if any.
    #[must_use]
    pub fn attack(&self) -> Option<EnemyAction> {
        self.attack
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

    /// Check if dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == EnemyState::Dead
    }

    /// Weapon hit relay.
    #[must_use]
    pub fn relay(&self) -> &HitRelay {
        &self.relay
    }

    /// Mover.
    #[must_use]
    pub fn mover(&self) -> &Mover {
        &self.mover
    }

    /// Status effects, for applying new ones.
    pub fn status_mut(&mut self) -> &mut StatusEffects {
        &mut self.status
    }

    /// Attached body.
    pub fn body_mut(&mut self) -> Option<&mut (dyn PhysicsBody + 'static)> {
        self.body.as_deref_mut()
    }

    fn publish(&self, event: CombatEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    fn trigger(&mut self, name: &str) {
        if let Some(animator) = self.animator.as_mut() {
            animator.play_trigger(name);
        }
    }

    // ========================================================================
    // Decisions
    // ========================================================================

    fn decide_next(&mut self) {
        let Some(distance) = self.distance else {
            self.enter_idle();
            return;
        };
        let action = decide(
            distance,
            self.last_action,
            Some(&self.config.enemy.decision),
            &mut self.rng,
        );
        debug!(actor = %self.id, ?action, distance, last = ?self.last_action, "enemy decided");
        self.publish(CombatEvent::EnemyDecided {
            actor: self.id,
            action,
            distance,
        });
        self.begin(action);
    }

    fn enter_idle(&mut self) {
        self.state = EnemyState::Idle;
        self.mover.set_mode(MoveMode::Hold);
        self.mover.halt();
    }

    fn begin(&mut self, action: EnemyAction) {
        self.timer = 0.0;
        match action {
            EnemyAction::Chase => {
                self.state = EnemyState::Chase;
                self.mover.set_mode(MoveMode::Walk);
            },
            EnemyAction::LightAttack | EnemyAction::HeavyAttack => {
                self.state = EnemyState::Attack;
                self.attack = Some(action);
                self.mover.set_mode(MoveMode::Hold);
                let trigger = match action {
                    EnemyAction::LightAttack => AttackKind::Light.trigger_name(),
                    _ => params::HEAVY_ATTACK,
                };
                self.trigger(trigger);
            },
            EnemyAction::Observe => {
                self.state = EnemyState::Observe;
                self.timer = self.config.enemy.decision.observe_seconds;
                self.mover.set_mode(MoveMode::Hold);
            },
            EnemyAction::Wait => {
                self.state = EnemyState::Wait;
                self.timer = self.config.enemy.decision.wait_seconds;
                self.mover.set_mode(MoveMode::Hold);
            },
            EnemyAction::Backstep => {
                self.state = EnemyState::Backstep;
                self.mover.set_mode(MoveMode::Hold);
                let away = self
                    .frame
                    .direction_to_target()
                    .filter(|d| *d != Vec3::ZERO)
                    .unwrap_or(self.mover.facing());
                self.pending_impulse = Some(-away * self.config.enemy.backstep_speed);
                self.trigger(params::BACKSTEP);
            },
        }
        self.last_action = Some(action);
    }

    fn leave_busy(&mut self) {
        self.relay.close_window();
        self.attack = None;
        self.pending_impulse = None;
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Variable-step update.
    pub fn update(&mut self, dt: f32, frame: &SpatialFrame) {
        if self.is_dead() {
            return;
        }
        self.frame = *frame;
        self.distance = frame.distance_to_target();
        self.status.tick(dt);
        self.mover.set_speed_multiplier(self.status.speed_multiplier());
        self.health.tick_passive_regen(dt);

        match self.state {
            EnemyState::Idle => {
                if self.distance.is_some() {
                    self.begin(EnemyAction::Chase);
                }
            },
            EnemyState::Chase => match self.distance {
                None => self.enter_idle(),
                Some(distance) => {
                    self.timer += dt;
                    let decision = &self.config.enemy.decision;
                    if self.timer >= decision.reconsider_interval || distance <= decision.near_distance {
                        self.decide_next();
                    }
                },
            },
            EnemyState::Observe | EnemyState::Wait => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.decide_next();
                }
            },
            EnemyState::Attack | EnemyState::Backstep | EnemyState::Stagger | EnemyState::Dead => {},
        }

        let axis = if self.state == EnemyState::Chase {
            frame
                .direction_to_target()
                .map_or(Vec2::ZERO, |d| Vec2::new(d.x, d.z))
        } else {
            Vec2::ZERO
        };
        self.mover.set_axis(axis);
        let steering = SpatialFrame {
            camera_forward: Vec3::Z,
            ..*frame
        };
        self.mover.update(dt, &steering);
    }

    /// Fixed-step update: a pending backstep impulse, else mover forces.
    pub fn fixed_update(&mut self) {
        let Some(body) = self.body.as_deref_mut() else {
            return;
        };
        if let Some(impulse) = self.pending_impulse.take() {
            body.add_force(impulse, ForceMode::VelocityChange);
        } else if self.state != EnemyState::Dead {
            self.mover.fixed_update(body);
        }
    }

    /// The running action's clip finished. Clears busy states and re-decides.
    pub fn on_action_finished(&mut self) {
        if !self.state.is_busy() {
            trace!(actor = %self.id, state = ?self.state, "action finished ignored: not busy");
            return;
        }
        self.leave_busy();
        self.decide_next();
    }

    /// Animation callback.
    pub fn on_animation(&mut self, callback: AnimationCallback) {
        match callback {
            AnimationCallback::AttackFinished => self.on_action_finished(),
            AnimationCallback::WeaponHitboxEnabled if self.state == EnemyState::Attack => {
                self.relay.open_window();
            },
            AnimationCallback::WeaponHitboxDisabled => self.relay.close_window(),
            _ => {},
        }
    }

    /// Feed a raw weapon collision through the relay.
    pub fn report_contact(
        &mut self,
        contact: &Contact,
        hierarchy: &dyn ActorHierarchy,
        sink: &mut dyn DamageSink,
    ) -> HitOutcome {
        let power = self
            .attack
            .and_then(|a| self.config.enemy.attacks.get(a))
            .map_or(0.0, |p| p.base_power);
        self.relay
            .report(contact, hierarchy, &DamageInputs::new(power), sink)
    }

    /// Damage-apply entry point.
    ///
    /// Hits stagger the enemy unless it is mid-attack with super armor.
    pub fn apply_damage(&mut self, info: &DamageInfo) -> DamageOutcome {
        let outcome = self.health.apply_damage(info);
        match outcome {
            DamageOutcome::Applied { amount, .. } => {
                self.publish(hit_landed(info, amount));
                let armored =
                    self.state == EnemyState::Attack && self.config.enemy.super_armor_attacks;
                if !armored {
                    self.leave_busy();
                    self.state = EnemyState::Stagger;
                    self.mover.set_mode(MoveMode::Hold);
                    self.trigger(params::HIT);
                }
            },
            DamageOutcome::Killed { amount } => {
                self.publish(hit_landed(info, amount));
                self.publish(CombatEvent::Died {
                    actor: self.id,
                    instigator: info.instigator(),
                });
                self.leave_busy();
                self.state = EnemyState::Dead;
                self.mover.halt();
                self.trigger(params::DIE);
            },
            DamageOutcome::Ignored => {},
        }
        outcome
    }

    /// Cancellation terminal state: idle, no live hitbox, no pending impulse.
    pub fn cancel(&mut self) {
        if self.is_dead() {
            return;
        }
        self.leave_busy();
        self.enter_idle();
    }
}
