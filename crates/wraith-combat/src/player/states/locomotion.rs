use crate::ability::AbilityKind;
use crate::collaborators::{params, MoveMode};
use crate::damage::AttackKind;
use crate::events::EndReason;
use crate::player::context::PlayerContext;
use crate::player::state::{PlayerInput, PlayerState, PlayerStateId, Transition};

use super::request_attack;

/// Idle/move hub.
#[derive(Debug, Default)]
pub struct LocomotionState;

impl PlayerState for LocomotionState {
    fn id(&self) -> PlayerStateId {
        PlayerStateId::Locomotion
    }

    fn enter(&mut self, ctx: &mut PlayerContext) -> Transition {
        ctx.mover.set_mode(MoveMode::Walk);
        Transition::Stay
    }

    fn update(&mut self, ctx: &mut PlayerContext, _dt: f32) -> Transition {
        let speed = ctx.mover.desired_velocity().length();
        ctx.set_float(params::SPEED, speed);
        Transition::Stay
    }

    fn on_input(&mut self, ctx: &mut PlayerContext, input: PlayerInput) -> Transition {
        match input {
            PlayerInput::SprintPressed if ctx.can_afford(AbilityKind::Sprint) => {
                Transition::To(PlayerStateId::Dash)
            },
            PlayerInput::LightAttack => request_attack(ctx, AttackKind::Light),
            PlayerInput::StrongAttack => request_attack(ctx, AttackKind::Strong),
            PlayerInput::ToggleGhost => Transition::To(PlayerStateId::Ghost),
            PlayerInput::ToggleHeal => Transition::To(PlayerStateId::Heal),
            PlayerInput::ToggleSelfSacrifice => {
                if ctx.abilities.is_active(AbilityKind::SelfSacrifice) {
                    ctx.end_ability(AbilityKind::SelfSacrifice, EndReason::Cancelled);
                    Transition::Stay
                } else {
                    Transition::To(PlayerStateId::SelfSacrifice)
                }
            },
            PlayerInput::Cancel => {
                ctx.end_ability(AbilityKind::SelfSacrifice, EndReason::Cancelled);
                Transition::Stay
            },
            _ => Transition::Stay,
        }
    }
}
