//! Ability-backed states.
//!
//! Ghost and Heal end their ability on exit. Self-sacrifice does not: the
//! ability outlives the stance and keeps draining until it starves or is
//! cancelled explicitly.

use wraith_common::Vec2;

use crate::ability::AbilityKind;
use crate::collaborators::{params, MoveMode};
use crate::damage::AttackKind;
use crate::events::EndReason;
use crate::player::context::PlayerContext;
use crate::player::state::{PlayerInput, PlayerState, PlayerStateId, Transition};

use super::request_attack;

fn sustained(ctx: &PlayerContext, kind: AbilityKind) -> Transition {
    if ctx.abilities.is_active(kind) {
        Transition::Stay
    } else {
        Transition::To(PlayerStateId::Locomotion)
    }
}

// ============================================================================
// Ghost
// ============================================================================

/// Evasion: invulnerable, attack collision disabled.
#[derive(Debug, Default)]
pub struct GhostState;

impl PlayerState for GhostState {
    fn id(&self) -> PlayerStateId {
        PlayerStateId::Ghost
    }

    fn enter(&mut self, ctx: &mut PlayerContext) -> Transition {
        if !ctx.begin_ability(AbilityKind::Ghost) {
            return Transition::To(PlayerStateId::Locomotion);
        }
        ctx.attacker.relay.set_collision_enabled(false);
        ctx.ghost = true;
        ctx.set_bool(params::GHOST, true);
        Transition::Stay
    }

    fn exit(&mut self, ctx: &mut PlayerContext) {
        ctx.end_ability(AbilityKind::Ghost, EndReason::Cancelled);
        ctx.attacker.relay.set_collision_enabled(true);
        ctx.ghost = false;
        ctx.set_bool(params::GHOST, false);
    }

    fn update(&mut self, ctx: &mut PlayerContext, _dt: f32) -> Transition {
        sustained(ctx, AbilityKind::Ghost)
    }

    fn on_input(&mut self, ctx: &mut PlayerContext, input: PlayerInput) -> Transition {
        match input {
            PlayerInput::ToggleGhost | PlayerInput::Cancel => {
                Transition::To(PlayerStateId::Locomotion)
            },
            // Only an earned counter breaks out of ghost mode.
            PlayerInput::LightAttack | PlayerInput::StrongAttack if ctx.just_avoid_armed() => {
                request_attack(ctx, AttackKind::JustAvoid)
            },
            _ => Transition::Stay,
        }
    }
}

// ============================================================================
// Heal
// ============================================================================

/// Healing channel. Health is restored by the owner from elapsed time.
#[derive(Debug, Default)]
pub struct HealState;

impl PlayerState for HealState {
    fn id(&self) -> PlayerStateId {
        PlayerStateId::Heal
    }

    fn enter(&mut self, ctx: &mut PlayerContext) -> Transition {
        if !ctx.begin_ability(AbilityKind::Heal) {
            return Transition::To(PlayerStateId::Locomotion);
        }
        ctx.mover.set_mode(MoveMode::Hold);
        ctx.set_bool(params::HEALING, true);
        Transition::Stay
    }

    fn exit(&mut self, ctx: &mut PlayerContext) {
        ctx.end_ability(AbilityKind::Heal, EndReason::Cancelled);
        ctx.mover.set_mode(MoveMode::Walk);
        ctx.set_bool(params::HEALING, false);
    }

    fn update(&mut self, ctx: &mut PlayerContext, _dt: f32) -> Transition {
        sustained(ctx, AbilityKind::Heal)
    }

    fn on_input(&mut self, _ctx: &mut PlayerContext, input: PlayerInput) -> Transition {
        match input {
            PlayerInput::ToggleHeal | PlayerInput::Cancel => Transition::To(PlayerStateId::Locomotion),
            _ => Transition::Stay,
        }
    }
}

// ============================================================================
// Self-Sacrifice
// ============================================================================

/// Self-sacrifice stance. Leaving it keeps the ability running.
#[derive(Debug, Default)]
pub struct SelfSacrificeState;

impl PlayerState for SelfSacrificeState {
    fn id(&self) -> PlayerStateId {
        PlayerStateId::SelfSacrifice
    }

    fn enter(&mut self, ctx: &mut PlayerContext) -> Transition {
        if !ctx.begin_ability(AbilityKind::SelfSacrifice) {
            return Transition::To(PlayerStateId::Locomotion);
        }
        ctx.mover.set_mode(MoveMode::Hold);
        ctx.set_bool(params::SACRIFICING, true);
        Transition::Stay
    }

    fn exit(&mut self, ctx: &mut PlayerContext) {
        ctx.mover.set_mode(MoveMode::Walk);
        ctx.set_bool(params::SACRIFICING, false);
    }

    fn update(&mut self, ctx: &mut PlayerContext, _dt: f32) -> Transition {
        sustained(ctx, AbilityKind::SelfSacrifice)
    }

    fn on_input(&mut self, ctx: &mut PlayerContext, input: PlayerInput) -> Transition {
        match input {
            PlayerInput::ToggleSelfSacrifice | PlayerInput::Cancel => {
                ctx.end_ability(AbilityKind::SelfSacrifice, EndReason::Cancelled);
                Transition::To(PlayerStateId::Locomotion)
            },
            PlayerInput::LightAttack => request_attack(ctx, AttackKind::Light),
            PlayerInput::StrongAttack => request_attack(ctx, AttackKind::Strong),
            PlayerInput::Move(axis) if axis != Vec2::ZERO => Transition::To(PlayerStateId::Locomotion),
            _ => Transition::Stay,
        }
    }
}
