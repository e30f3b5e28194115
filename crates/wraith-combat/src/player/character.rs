//! The player actor: state machine plus health bookkeeping.

use std::sync::Arc;

use tracing::debug;
use wraith_common::EntityId;

use super::context::PlayerContext;
use super::machine::{PlayerStateMachine, PlayerTickReport};
use super::state::{PlayerInput, PlayerStateId};
use crate::ability::{AbilityKind, AbilityTick, ConsumedQuantity};
use crate::collaborators::{params, AnimationCallback, SpatialFrame};
use crate::config::CombatConfig;
use crate::damage::DamageInfo;
use crate::error::CombatResult;
use crate::events::CombatEvent;
use crate::gauge::{DamageOutcome, Health};
use crate::hit_relay::{ActorHierarchy, Contact, DamageSink, HitOutcome};

/// Player actor.
///
/// Converts the elapsed time reported by Heal and Self-Sacrifice into
/// health changes, resolves incoming hits (evaded in ghost mode), and goes
/// inert once dead.
#[derive(Debug)]
pub struct PlayerCharacter {
    machine: PlayerStateMachine,
}

impl PlayerCharacter {
    /// Player with default wiring (no animator, body, or event bus).
    pub fn new(actor: EntityId, config: Arc<CombatConfig>) -> CombatResult<Self> {
        Ok(Self::from_context(PlayerContext::new(actor, config)?))
    }

    /// Player from a fully wired context.
    #[must_use]
    pub fn from_context(ctx: PlayerContext) -> Self {
        Self {
            machine: PlayerStateMachine::new(ctx),
        }
    }

    /// Player entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.machine.context().actor()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PlayerStateId {
        self.machine.current()
    }

    /// State machine.
    #[must_use]
    pub fn machine(&self) -> &PlayerStateMachine {
        &self.machine
    }

    /// State machine, mutable.
    pub fn machine_mut(&mut self) -> &mut PlayerStateMachine {
        &mut self.machine
    }

    /// Health pool.
    #[must_use]
    pub fn health(&self) -> &Health {
        self.machine.context().health()
    }

    /// Check if dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health().is_dead()
    }

    /// Route an input. Ignored once dead.
    pub fn handle_input(&mut self, input: PlayerInput) {
        if !self.is_dead() {
            self.machine.handle_input(input);
        }
    }

    /// Route an animation callback. Ignored once dead.
    pub fn on_animation(&mut self, callback: AnimationCallback) {
        if !self.is_dead() {
            self.machine.on_animation(callback);
        }
    }

    /// Variable-step update, then the health conversion.
    pub fn update(&mut self, dt: f32, frame: &SpatialFrame) -> PlayerTickReport {
        if self.is_dead() {
            return PlayerTickReport::default();
        }
        let report = self.machine.update(dt, frame);

        let ctx = self.machine.context_mut();
        let heal_rate = ctx.config().player.heal_percent_per_second;
        let drain_rate = ctx.config().player.health_drain_per_second;
        let health = ctx.health_mut();
        let mut sacrificed = false;
        for (kind, tick) in &report.abilities.reports {
            let AbilityTick::Sustained(ConsumedQuantity::Elapsed(elapsed)) = *tick else {
                continue;
            };
            match kind {
                AbilityKind::Heal => health.heal(heal_rate * health.max() * elapsed),
                AbilityKind::SelfSacrifice => {
                    sacrificed = true;
                    health.sacrifice(drain_rate * elapsed);
                },
                AbilityKind::Sprint | AbilityKind::Ghost => {},
            }
        }
        if !sacrificed {
            health.tick_passive_regen(dt);
        }
        report
    }

    /// Fixed-step update. Ignored once dead.
    pub fn fixed_update(&mut self) {
        if !self.is_dead() {
            self.machine.fixed_update();
        }
    }

    /// Feed a weapon collision through the player's hit relay.
    pub fn report_contact(
        &mut self,
        contact: &Contact,
        hierarchy: &dyn ActorHierarchy,
        sink: &mut dyn DamageSink,
    ) -> HitOutcome {
        if self.is_dead() {
            return HitOutcome::NotLive;
        }
        self.machine.report_contact(contact, hierarchy, sink)
    }

    /// Damage-apply entry point.
    ///
    /// In ghost mode the hit is evaded and arms the just-avoid window.
    pub fn apply_damage(&mut self, info: &DamageInfo) -> DamageOutcome {
        let ctx = self.machine.context_mut();
        if ctx.is_ghost() && !ctx.health().is_dead() {
            ctx.arm_just_avoid();
            debug!(actor = %ctx.actor(), instigator = %info.instigator(), "hit evaded");
            ctx.publish(CombatEvent::HitEvaded {
                actor: ctx.actor(),
                instigator: info.instigator(),
            });
            return DamageOutcome::Ignored;
        }

        let outcome = ctx.health_mut().apply_damage(info);
        match outcome {
            DamageOutcome::Applied { amount, .. } => {
                ctx.publish(hit_landed(info, amount));
                ctx.trigger(params::HIT);
            },
            DamageOutcome::Killed { amount } => {
                ctx.publish(hit_landed(info, amount));
                ctx.publish(CombatEvent::Died {
                    actor: ctx.actor(),
                    instigator: info.instigator(),
                });
                ctx.trigger(params::DIE);
                self.machine.cancel();
            },
            DamageOutcome::Ignored => {},
        }
        outcome
    }

    /// Cancel everything and drop subscribers.
    pub fn dispose(&mut self) {
        self.machine.dispose();
    }
}

pub(crate) fn hit_landed(info: &DamageInfo, amount: f32) -> CombatEvent {
    CombatEvent::HitLanded {
        instigator: info.instigator(),
        target: info.target(),
        amount,
        hit_point: info.hit_point(),
    }
}
