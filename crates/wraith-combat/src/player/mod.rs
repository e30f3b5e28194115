//! Player state machine and actor.
//!
//! This module provides:
//! - State keys, inputs and the per-state interface
//! - The shared context (gauges, abilities, mover, attacker, collaborators)
//! - Concrete states: locomotion, dash, attacks, ghost, heal, self-sacrifice
//! - The machine that owns the lookup table and drives one current state
//! - The player actor that owns health and converts channel time into it

mod character;
mod context;
mod machine;
mod state;
pub mod states;

pub use character::PlayerCharacter;
pub(crate) use character::hit_landed;
pub use context::{Attacker, PlayerContext};
pub use machine::{PlayerStateMachine, PlayerTickReport};
pub use state::{PlayerInput, PlayerState, PlayerStateId, Transition};
