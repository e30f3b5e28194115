use crate::ability::AbilityKind;
use crate::collaborators::{params, MoveMode};
use crate::damage::AttackKind;
use crate::events::EndReason;
use crate::player::context::PlayerContext;
use crate::player::state::{PlayerInput, PlayerState, PlayerStateId, Transition};

use super::request_attack;

/// Sprint-powered dash. Lasts while the sprint ability is sustained.
#[derive(Debug, Default)]
pub struct DashState;

impl PlayerState for DashState {
    fn id(&self) -> PlayerStateId {
        PlayerStateId::Dash
    }

    fn enter(&mut self, ctx: &mut PlayerContext) -> Transition {
        if !ctx.begin_ability(AbilityKind::Sprint) {
            return Transition::To(PlayerStateId::Locomotion);
        }
        ctx.mover.set_mode(MoveMode::Dash);
        ctx.set_bool(params::DASHING, true);
        Transition::Stay
    }

    fn exit(&mut self, ctx: &mut PlayerContext) {
        ctx.end_ability(AbilityKind::Sprint, EndReason::Cancelled);
        ctx.mover.set_mode(MoveMode::Walk);
        ctx.set_bool(params::DASHING, false);
    }

    fn update(&mut self, ctx: &mut PlayerContext, _dt: f32) -> Transition {
        if ctx.abilities.is_active(AbilityKind::Sprint) {
            Transition::Stay
        } else {
            Transition::To(PlayerStateId::Locomotion)
        }
    }

    fn on_input(&mut self, ctx: &mut PlayerContext, input: PlayerInput) -> Transition {
        match input {
            PlayerInput::SprintReleased | PlayerInput::Cancel => {
                Transition::To(PlayerStateId::Locomotion)
            },
            PlayerInput::LightAttack => request_attack(ctx, AttackKind::Light),
            PlayerInput::StrongAttack => request_attack(ctx, AttackKind::Strong),
            _ => Transition::Stay,
        }
    }
}
