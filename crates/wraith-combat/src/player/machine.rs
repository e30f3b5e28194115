//! Player state machine.
//!
//! The state table is built once. Per frame the owner calls [`update`]
//! (variable step) and then [`fixed_update`] (fixed step, any number of
//! times). Abilities and gauges tick in `update` only, so drain does not
//! depend on the physics substep rate.
//!
//! [`update`]: PlayerStateMachine::update
//! [`fixed_update`]: PlayerStateMachine::fixed_update

use tracing::debug;

use super::context::PlayerContext;
use super::state::{PlayerInput, PlayerState, PlayerStateId, Transition};
use super::states;
use crate::ability::{AbilityKind, AbilitySetTick, AbilityTick};
use crate::collaborators::{params, AnimationCallback, SpatialFrame};
use crate::events::{CombatEvent, EndReason};
use crate::hit_relay::{ActorHierarchy, Contact, DamageSink, HitOutcome};

/// Upper bound on redirects from `enter` within one transition.
const MAX_CHAINED_TRANSITIONS: usize = 4;

/// What happened during one variable-step update.
#[derive(Debug, Default)]
pub struct PlayerTickReport {
    /// Ability results and drained gauges.
    pub abilities: AbilitySetTick,
}

/// Drives exactly one current [`PlayerState`].
pub struct PlayerStateMachine {
    states: Vec<Box<dyn PlayerState>>,
    current: PlayerStateId,
    ctx: PlayerContext,
}

impl std::fmt::Debug for PlayerStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerStateMachine")
            .field("current", &self.current)
            .field("ctx", &self.ctx)
            .finish()
    }
}

impl PlayerStateMachine {
    /// Build the state table and enter Locomotion.
    #[must_use]
    pub fn new(ctx: PlayerContext) -> Self {
        let states = PlayerStateId::ALL.iter().map(|id| states::build(*id)).collect();
        let mut machine = Self {
            states,
            current: PlayerStateId::Locomotion,
            ctx,
        };
        let t = machine.dispatch(|state, ctx| state.enter(ctx));
        machine.apply(t);
        machine
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> PlayerStateId {
        self.current
    }

    /// Shared context.
    #[must_use]
    pub fn context(&self) -> &PlayerContext {
        &self.ctx
    }

    /// Shared context, mutable.
    pub fn context_mut(&mut self) -> &mut PlayerContext {
        &mut self.ctx
    }

    fn dispatch(
        &mut self,
        f: impl FnOnce(&mut dyn PlayerState, &mut PlayerContext) -> Transition,
    ) -> Transition {
        match self.states.get_mut(self.current.index()) {
            Some(state) => f(state.as_mut(), &mut self.ctx),
            None => Transition::Stay,
        }
    }

    fn apply(&mut self, mut transition: Transition) {
        for _ in 0..MAX_CHAINED_TRANSITIONS {
            let Transition::To(next) = transition else {
                return;
            };
            if next == self.current {
                return;
            }
            let from = self.current;
            self.dispatch(|state, ctx| {
                state.exit(ctx);
                Transition::Stay
            });
            self.current = next;
            debug!(actor = %self.ctx.actor, ?from, to = ?next, "player state changed");
            self.ctx.publish(CombatEvent::StateChanged {
                actor: self.ctx.actor,
                from,
                to: next,
            });
            transition = self.dispatch(|state, ctx| state.enter(ctx));
        }
    }

    /// Route an input to the current state.
    ///
    /// Movement and lock-on are handled for every state; movement is also
    /// forwarded so states can react to it.
    pub fn handle_input(&mut self, input: PlayerInput) {
        match input {
            PlayerInput::Move(axis) => self.ctx.mover.set_axis(axis),
            PlayerInput::ToggleLockOn => {
                self.ctx.toggle_lock_on();
                return;
            },
            _ => {},
        }
        let t = self.dispatch(|state, ctx| state.on_input(ctx, input));
        self.apply(t);
    }

    /// Route an animation callback to the current state.
    pub fn on_animation(&mut self, callback: AnimationCallback) {
        let t = self.dispatch(|state, ctx| state.on_animation(ctx, callback));
        self.apply(t);
    }

    /// Variable-step update.
    ///
    /// Order: abilities, passive regen of undrained gauges, timers, state
    /// update, mover.
    pub fn update(&mut self, dt: f32, frame: &SpatialFrame) -> PlayerTickReport {
        let ctx = &mut self.ctx;
        ctx.frame = *frame;
        if ctx.locked_on && frame.target_position.is_none() {
            ctx.toggle_lock_on();
        }

        let abilities = ctx.abilities.tick_all(dt);
        for (kind, tick) in &abilities.reports {
            if *tick == AbilityTick::Starved {
                ctx.publish(CombatEvent::AbilityEnded {
                    actor: ctx.actor,
                    kind: *kind,
                    reason: EndReason::Starved,
                });
            }
        }
        for gauge in [&ctx.stamina, &ctx.focus] {
            if !abilities.drained(gauge) {
                gauge.tick_passive_regen(dt);
            }
        }

        ctx.bonus.tick(dt);
        ctx.status.tick(dt);
        ctx.just_avoid_remaining = (ctx.just_avoid_remaining - dt).max(0.0);
        ctx.mover.set_speed_multiplier(ctx.status.speed_multiplier());

        let t = self.dispatch(|state, ctx| state.update(ctx, dt));
        self.apply(t);

        let ctx = &mut self.ctx;
        let mover_frame = ctx.mover_frame();
        ctx.mover.update(dt, &mover_frame);
        let anim_speed = ctx.status.anim_speed();
        ctx.set_float(params::ANIM_SPEED, anim_speed);

        PlayerTickReport { abilities }
    }

    /// Fixed-step update: state hook, then forces.
    pub fn fixed_update(&mut self) {
        self.dispatch(|state, ctx| {
            state.fixed_update(ctx);
            Transition::Stay
        });
        let ctx = &mut self.ctx;
        if let Some(body) = ctx.body.as_deref_mut() {
            ctx.mover.fixed_update(body);
        }
    }

    /// Feed a raw weapon collision through the hit relay.
    ///
    /// Accepted hits grant a timed bonus stack.
    pub fn report_contact(
        &mut self,
        contact: &Contact,
        hierarchy: &dyn ActorHierarchy,
        sink: &mut dyn DamageSink,
    ) -> HitOutcome {
        let inputs = self.ctx.damage_inputs();
        let outcome = self.ctx.attacker.relay.report(contact, hierarchy, &inputs, sink);
        if outcome.is_accepted() {
            self.ctx.bonus.add_stack();
        }
        outcome
    }

    /// Force the cancellation terminal state: Locomotion, every ability
    /// ended, no live hitbox, no movement.
    pub fn cancel(&mut self) {
        self.apply(Transition::To(PlayerStateId::Locomotion));
        for kind in AbilityKind::ALL {
            self.ctx.end_ability(kind, EndReason::Cancelled);
        }
        self.ctx.attacker.end();
        self.ctx.mover.halt();
    }

    /// Cancel and drop every subscriber.
    pub fn dispose(&mut self) {
        self.cancel();
        self.ctx.abilities.dispose();
        self.ctx.health.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use wraith_common::{EntityId, Vec2, Vec3};

    use super::*;
    use crate::config::CombatConfig;
    use crate::damage::AttackKind;
    use crate::events::EventBus;
    use crate::status::StatusEffectDef;
    use crate::testing::{AnimCall, RecordingAnimator};

    type Log = Arc<Mutex<Vec<AnimCall>>>;

    fn context() -> PlayerContext {
        PlayerContext::new(EntityId::from_raw(1), Arc::new(CombatConfig::default()))
            .expect("valid player")
    }

    fn animated() -> (PlayerStateMachine, Log) {
        let (animator, log) = RecordingAnimator::new();
        let machine = PlayerStateMachine::new(context().with_animator(Box::new(animator)));
        (machine, log)
    }

    fn count_trigger(log: &Log, name: &str) -> usize {
        RecordingAnimator::triggers(log).iter().filter(|t| *t == name).count()
    }

    #[test]
    fn test_starts_in_locomotion() {
        let machine = PlayerStateMachine::new(context());
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
    }

    #[test]
    fn test_queued_press_consumed_when_window_opens() {
        let (mut machine, log) = animated();
        machine.handle_input(PlayerInput::LightAttack);
        assert_eq!(machine.current(), PlayerStateId::LightAttack);
        assert_eq!(machine.context().attacker().combo_step(), 1);

        machine.update(0.3, &SpatialFrame::default());
        machine.handle_input(PlayerInput::LightAttack);
        assert!(machine.context().attacker().has_queued());
        assert_eq!(machine.context().attacker().combo_step(), 1);

        machine.update(0.2, &SpatialFrame::default());
        machine.on_animation(AnimationCallback::ComboWindowOpened);

        let attacker = machine.context().attacker();
        assert_eq!(machine.current(), PlayerStateId::LightAttack);
        assert_eq!(attacker.combo_step(), 2);
        assert_eq!(attacker.elapsed(), 0.0);
        assert!(!attacker.has_queued());
        assert!(!attacker.is_window_open());
        assert_eq!(count_trigger(&log, "LightAttack"), 2);
        assert_eq!(RecordingAnimator::last_int(&log, params::COMBO_STEP), Some(2));
    }

    #[test]
    fn test_press_inside_open_window_chains_immediately() {
        let (mut machine, _log) = animated();
        machine.handle_input(PlayerInput::LightAttack);
        machine.on_animation(AnimationCallback::ComboWindowOpened);
        machine.handle_input(PlayerInput::LightAttack);
        assert_eq!(machine.context().attacker().combo_step(), 2);
    }

    #[test]
    fn test_chain_stops_at_max_combo() {
        let (mut machine, log) = animated();
        let max = machine.context().attack_profile(AttackKind::Light).max_combo;
        machine.handle_input(PlayerInput::LightAttack);
        for _ in 0..max + 2 {
            machine.on_animation(AnimationCallback::ComboWindowOpened);
            machine.handle_input(PlayerInput::LightAttack);
        }
        assert_eq!(machine.context().attacker().combo_step(), max);
        assert_eq!(count_trigger(&log, "LightAttack"), max as usize);
    }

    #[test]
    fn test_window_close_without_queue_ends_attack() {
        let (mut machine, log) = animated();
        machine.handle_input(PlayerInput::LightAttack);
        machine.on_animation(AnimationCallback::WeaponHitboxEnabled);
        machine.on_animation(AnimationCallback::ComboWindowOpened);
        machine.on_animation(AnimationCallback::ComboWindowClosed);

        assert_eq!(machine.current(), PlayerStateId::Locomotion);
        assert!(!machine.context().attacker().relay().is_live());
        assert_eq!(RecordingAnimator::last_int(&log, params::COMBO_STEP), Some(0));
    }

    #[test]
    fn test_stray_window_close_is_ignored() {
        let (mut machine, _log) = animated();
        machine.handle_input(PlayerInput::LightAttack);
        machine.on_animation(AnimationCallback::ComboWindowClosed);
        assert_eq!(machine.current(), PlayerStateId::LightAttack);
    }

    #[test]
    fn test_duration_timeout_ends_attack() {
        let (mut machine, _log) = animated();
        machine.handle_input(PlayerInput::StrongAttack);
        assert_eq!(machine.current(), PlayerStateId::StrongAttack);
        let duration = machine.context().attack_profile(AttackKind::Strong).duration;

        machine.update(duration * 0.5, &SpatialFrame::default());
        assert_eq!(machine.current(), PlayerStateId::StrongAttack);
        machine.update(duration * 0.6, &SpatialFrame::default());
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
    }

    #[test]
    fn test_queued_press_holds_attack_past_duration() {
        let (mut machine, _log) = animated();
        machine.handle_input(PlayerInput::LightAttack);
        machine.handle_input(PlayerInput::LightAttack);
        machine.update(5.0, &SpatialFrame::default());
        assert_eq!(machine.current(), PlayerStateId::LightAttack);

        machine.on_animation(AnimationCallback::AttackFinished);
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
    }

    #[test]
    fn test_no_animator_never_queues() {
        let mut machine = PlayerStateMachine::new(context());
        machine.handle_input(PlayerInput::LightAttack);
        machine.handle_input(PlayerInput::LightAttack);
        assert!(!machine.context().attacker().has_queued());

        let duration = machine.context().attack_profile(AttackKind::Light).duration;
        machine.update(duration + 0.01, &SpatialFrame::default());
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
    }

    #[test]
    fn test_cancel_in_attack_closes_hitbox() {
        let (mut machine, _log) = animated();
        machine.handle_input(PlayerInput::LightAttack);
        machine.on_animation(AnimationCallback::WeaponHitboxEnabled);
        assert!(machine.context().attacker().relay().is_live());

        machine.handle_input(PlayerInput::Cancel);
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
        assert!(!machine.context().attacker().relay().is_live());
    }

    #[test]
    fn test_unaffordable_attack_is_refused() {
        let mut machine = PlayerStateMachine::new(context());
        assert!(machine.context().stamina().consume(95.0));
        machine.handle_input(PlayerInput::LightAttack);
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
    }

    #[test]
    fn test_ghost_fails_without_focus() {
        let mut machine = PlayerStateMachine::new(context());
        assert!(machine.context().focus().consume(95.0));
        machine.handle_input(PlayerInput::ToggleGhost);
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
        assert!(!machine.context().is_ghost());
        assert!(!machine.context().abilities().is_active(AbilityKind::Ghost));
    }

    #[test]
    fn test_ghost_disables_weapon_collision() {
        let mut machine = PlayerStateMachine::new(context());
        machine.handle_input(PlayerInput::ToggleGhost);
        assert!(machine.context().is_ghost());
        assert!(!machine.context().attacker().relay().collision_enabled());

        machine.handle_input(PlayerInput::ToggleGhost);
        assert!(!machine.context().is_ghost());
        assert!(machine.context().attacker().relay().collision_enabled());
        assert!(!machine.context().abilities().is_active(AbilityKind::Ghost));
    }

    #[test]
    fn test_dash_ends_when_stamina_starves() {
        let bus = EventBus::new(256);
        let mut machine = PlayerStateMachine::new(context().with_events(bus.clone()));
        machine.handle_input(PlayerInput::SprintPressed);
        assert_eq!(machine.current(), PlayerStateId::Dash);

        for _ in 0..100 {
            machine.update(0.1, &SpatialFrame::default());
            if machine.current() != PlayerStateId::Dash {
                break;
            }
        }
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
        assert!(bus.drain().iter().any(|e| matches!(
            e,
            CombatEvent::AbilityEnded {
                kind: AbilityKind::Sprint,
                reason: EndReason::Starved,
                ..
            }
        )));
    }

    #[test]
    fn test_undrained_stamina_regenerates() {
        let mut machine = PlayerStateMachine::new(context());
        assert!(machine.context().stamina().consume(50.0));
        machine.update(1.0, &SpatialFrame::default());
        assert!((machine.context().stamina().value() - 65.0).abs() < 1e-3);
    }

    #[test]
    fn test_lock_on_needs_target_and_drops_with_it() {
        let mut machine = PlayerStateMachine::new(context());
        machine.handle_input(PlayerInput::ToggleLockOn);
        assert!(!machine.context().is_locked_on());

        let targeted = SpatialFrame::at(Vec3::ZERO).with_target(Vec3::new(0.0, 0.0, 5.0));
        machine.update(0.016, &targeted);
        machine.handle_input(PlayerInput::ToggleLockOn);
        assert!(machine.context().is_locked_on());

        machine.update(0.016, &SpatialFrame::default());
        assert!(!machine.context().is_locked_on());
    }

    #[test]
    fn test_status_effect_slows_movement() {
        let mut machine = PlayerStateMachine::new(context());
        let slow = StatusEffectDef::new(1, "chill", 5.0).with_multipliers(0.5, 1.0);
        machine.context_mut().status_mut().apply(&slow);
        machine.handle_input(PlayerInput::Move(Vec2::new(0.0, 1.0)));
        machine.update(0.016, &SpatialFrame::default());

        let walk = machine.context().config().player.mover.walk_speed;
        let v = machine.context().mover().desired_velocity();
        assert!((v.length() - walk * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut machine = PlayerStateMachine::new(context());
        machine.handle_input(PlayerInput::ToggleSelfSacrifice);
        machine.handle_input(PlayerInput::LightAttack);
        machine.handle_input(PlayerInput::Move(Vec2::new(1.0, 0.0)));
        machine.update(0.016, &SpatialFrame::default());

        machine.cancel();
        let ctx = machine.context();
        assert_eq!(machine.current(), PlayerStateId::Locomotion);
        assert!(AbilityKind::ALL.iter().all(|k| !ctx.abilities().is_active(*k)));
        assert!(!ctx.attacker().relay().is_live());
        assert_eq!(ctx.mover().desired_velocity(), Vec3::ZERO);
    }
}
