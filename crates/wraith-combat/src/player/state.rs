//! Player state identifiers, inputs, and the per-state interface.

use serde::{Deserialize, Serialize};
use wraith_common::Vec2;

use super::context::PlayerContext;
use crate::collaborators::AnimationCallback;
use crate::damage::AttackKind;

/// Every player state. Exactly one is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerStateId {
    /// Idle/move hub.
    Locomotion,
    /// Sprint-powered dash.
    Dash,
    /// Light attack chain.
    LightAttack,
    /// Strong attack chain.
    StrongAttack,
    /// Counter after an evasion.
    JustAvoidAttack,
    /// Evasion mode.
    Ghost,
    /// Healing channel.
    Heal,
    /// Self-sacrifice stance.
    SelfSacrifice,
}

impl PlayerStateId {
    /// All states, in lookup-table order.
    pub const ALL: [Self; 8] = [
        Self::Locomotion,
        Self::Dash,
        Self::LightAttack,
        Self::StrongAttack,
        Self::JustAvoidAttack,
        Self::Ghost,
        Self::Heal,
        Self::SelfSacrifice,
    ];

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// State that runs an attack kind.
    #[must_use]
    pub const fn attack(kind: AttackKind) -> Self {
        match kind {
            AttackKind::Light => Self::LightAttack,
            AttackKind::Strong => Self::StrongAttack,
            AttackKind::JustAvoid => Self::JustAvoidAttack,
        }
    }

    /// Attack kind run by this state, if any.
    #[must_use]
    pub const fn attack_kind(self) -> Option<AttackKind> {
        match self {
            Self::LightAttack => Some(AttackKind::Light),
            Self::StrongAttack => Some(AttackKind::Strong),
            Self::JustAvoidAttack => Some(AttackKind::JustAvoid),
            _ => None,
        }
    }
}

/// Requested state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Remain in the current state.
    Stay,
    /// Exit the current state and enter another.
    To(PlayerStateId),
}

/// Player intents, already mapped from raw devices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerInput {
    /// Movement axis (x = strafe, y = forward).
    Move(Vec2),
    /// Sprint/dash held.
    SprintPressed,
    /// Sprint/dash released.
    SprintReleased,
    /// Light attack button.
    LightAttack,
    /// Strong attack button.
    StrongAttack,
    /// Ghost toggle.
    ToggleGhost,
    /// Heal toggle.
    ToggleHeal,
    /// Self-sacrifice toggle.
    ToggleSelfSacrifice,
    /// Lock-on toggle.
    ToggleLockOn,
    /// Explicit cancel of the current channel.
    Cancel,
}

/// One player state.
///
/// States share the [`PlayerContext`]; only the current state mutates it,
/// and `exit` must leave it consistent for the successor.
pub trait PlayerState: Send {
    /// State key.
    fn id(&self) -> PlayerStateId;

    /// Called when the state becomes current. May redirect immediately.
    fn enter(&mut self, _ctx: &mut PlayerContext) -> Transition {
        Transition::Stay
    }

    /// Called when the state stops being current.
    fn exit(&mut self, _ctx: &mut PlayerContext) {}

    /// Variable-step update.
    fn update(&mut self, ctx: &mut PlayerContext, dt: f32) -> Transition;

    /// Fixed-step update, before the mover pushes forces.
    fn fixed_update(&mut self, _ctx: &mut PlayerContext) {}

    /// Input routed to the current state.
    fn on_input(&mut self, ctx: &mut PlayerContext, input: PlayerInput) -> Transition;

    /// Animation callback routed to the current state.
    fn on_animation(&mut self, _ctx: &mut PlayerContext, _callback: AnimationCallback) -> Transition {
        Transition::Stay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_table_order() {
        for (i, id) in PlayerStateId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_attack_mapping() {
        for kind in [AttackKind::Light, AttackKind::Strong, AttackKind::JustAvoid] {
            assert_eq!(PlayerStateId::attack(kind).attack_kind(), Some(kind));
        }
        assert_eq!(PlayerStateId::Ghost.attack_kind(), None);
    }
}
