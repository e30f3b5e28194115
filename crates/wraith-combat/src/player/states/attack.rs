//! Light, strong and just-avoid attacks share one behavior.
//!
//! A follow-up press is queued whatever the combo window is doing, and only
//! consumed while the window is open. Consuming re-triggers the swing and
//! resets the timer. The attack ends when the window closes with nothing
//! queued, or when the estimated duration runs out with nothing queued and
//! no window open.

use tracing::{debug, trace};

use crate::collaborators::{params, AnimationCallback, MoveMode};
use crate::damage::AttackKind;
use crate::player::context::PlayerContext;
use crate::player::state::{PlayerInput, PlayerState, PlayerStateId, Transition};

/// One attack chain.
#[derive(Debug)]
pub struct AttackState {
    kind: AttackKind,
}

impl AttackState {
    /// Attack state for a kind.
    #[must_use]
    pub const fn new(kind: AttackKind) -> Self {
        Self { kind }
    }

    fn swing(&self, ctx: &mut PlayerContext) {
        let step = i32::try_from(ctx.attacker.combo_step).unwrap_or(i32::MAX);
        ctx.trigger(self.kind.trigger_name());
        ctx.set_int(params::COMBO_STEP, step);
    }

    fn consume_queued(&self, ctx: &mut PlayerContext) {
        ctx.attacker.queued = false;
        let cost = ctx.attack_profile(self.kind).stamina_cost;
        if !ctx.stamina.consume(cost) {
            debug!(actor = %ctx.actor, kind = ?self.kind, "combo dropped: stamina");
            return;
        }
        let attacker = &mut ctx.attacker;
        attacker.combo_step += 1;
        attacker.elapsed = 0.0;
        attacker.window_open = false;
        attacker.relay.close_window();
        debug!(actor = %ctx.actor, kind = ?self.kind, step = ctx.attacker.combo_step, "combo continued");
        self.swing(ctx);
    }
}

impl PlayerState for AttackState {
    fn id(&self) -> PlayerStateId {
        PlayerStateId::attack(self.kind)
    }

    fn enter(&mut self, ctx: &mut PlayerContext) -> Transition {
        let cost = ctx.attack_profile(self.kind).stamina_cost;
        if !ctx.stamina.consume(cost) {
            return Transition::To(PlayerStateId::Locomotion);
        }
        ctx.attacker.begin(self.kind);
        ctx.mover.set_mode(MoveMode::Hold);
        self.swing(ctx);
        Transition::Stay
    }

    fn exit(&mut self, ctx: &mut PlayerContext) {
        // Never leave a live hitbox behind.
        ctx.attacker.end();
        ctx.mover.set_mode(MoveMode::Walk);
        ctx.set_int(params::COMBO_STEP, 0);
    }

    fn update(&mut self, ctx: &mut PlayerContext, dt: f32) -> Transition {
        let duration = ctx.attack_profile(self.kind).duration;
        let attacker = &mut ctx.attacker;
        attacker.elapsed += dt;
        if attacker.elapsed >= duration && !attacker.queued && !attacker.window_open {
            Transition::To(PlayerStateId::Locomotion)
        } else {
            Transition::Stay
        }
    }

    fn on_input(&mut self, ctx: &mut PlayerContext, input: PlayerInput) -> Transition {
        match input {
            PlayerInput::LightAttack | PlayerInput::StrongAttack => {
                // No animator means no combo windows will ever arrive.
                if ctx.animator.is_none() {
                    return Transition::Stay;
                }
                let max_combo = ctx.attack_profile(self.kind).max_combo;
                if ctx.attacker.combo_step >= max_combo {
                    trace!(actor = %ctx.actor, "combo request ignored: chain complete");
                    return Transition::Stay;
                }
                ctx.attacker.queued = true;
                if ctx.attacker.window_open {
                    self.consume_queued(ctx);
                }
                Transition::Stay
            },
            PlayerInput::Cancel => Transition::To(PlayerStateId::Locomotion),
            _ => Transition::Stay,
        }
    }

    fn on_animation(&mut self, ctx: &mut PlayerContext, callback: AnimationCallback) -> Transition {
        match callback {
            AnimationCallback::ComboWindowOpened => {
                ctx.attacker.window_open = true;
                if ctx.attacker.queued {
                    self.consume_queued(ctx);
                }
                Transition::Stay
            },
            AnimationCallback::ComboWindowClosed => {
                if !ctx.attacker.window_open {
                    return Transition::Stay;
                }
                ctx.attacker.window_open = false;
                if ctx.attacker.queued {
                    Transition::Stay
                } else {
                    Transition::To(PlayerStateId::Locomotion)
                }
            },
            AnimationCallback::AttackFinished => Transition::To(PlayerStateId::Locomotion),
            AnimationCallback::WeaponHitboxEnabled => {
                ctx.attacker.relay.open_window();
                Transition::Stay
            },
            AnimationCallback::WeaponHitboxDisabled => {
                ctx.attacker.relay.close_window();
                Transition::Stay
            },
        }
    }
}
