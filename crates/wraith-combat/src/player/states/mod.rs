//! Concrete player states.

mod abilities;
mod attack;
mod dash;
mod locomotion;

pub use abilities::{GhostState, HealState, SelfSacrificeState};
pub use attack::AttackState;
pub use dash::DashState;
pub use locomotion::LocomotionState;

use tracing::debug;

use super::context::PlayerContext;
use super::state::{PlayerState, PlayerStateId, Transition};
use crate::damage::AttackKind;

/// Build the state for a key.
#[must_use]
pub fn build(id: PlayerStateId) -> Box<dyn PlayerState> {
    match id {
        PlayerStateId::Locomotion => Box::new(LocomotionState),
        PlayerStateId::Dash => Box::new(DashState),
        PlayerStateId::LightAttack => Box::new(AttackState::new(AttackKind::Light)),
        PlayerStateId::StrongAttack => Box::new(AttackState::new(AttackKind::Strong)),
        PlayerStateId::JustAvoidAttack => Box::new(AttackState::new(AttackKind::JustAvoid)),
        PlayerStateId::Ghost => Box::new(GhostState),
        PlayerStateId::Heal => Box::new(HealState),
        PlayerStateId::SelfSacrifice => Box::new(SelfSacrificeState),
    }
}

/// Route an attack button press to an attack state.
///
/// An armed just-avoid window upgrades the request. Unaffordable attacks are
/// refused without leaving the current state.
pub(crate) fn request_attack(ctx: &mut PlayerContext, requested: AttackKind) -> Transition {
    let kind = if ctx.take_just_avoid() {
        AttackKind::JustAvoid
    } else {
        requested
    };
    let cost = ctx.attack_profile(kind).stamina_cost;
    if !ctx.stamina.can_afford(cost) {
        debug!(actor = %ctx.actor, ?kind, cost, "attack refused: stamina");
        return Transition::Stay;
    }
    Transition::To(PlayerStateId::attack(kind))
}
