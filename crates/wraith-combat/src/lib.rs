//! # Wraith Combat
//!
//! Melee combat core for Project Wraith.
//!
//! This crate provides the engine-independent combat layer:
//! - Resource gauges, health and metered abilities
//! - Player state machine with combo timing
//! - Damage composition and weapon hit relays
//! - Enemy weighted-random decisions and the enemy agent
//! - Status effect stacking
//! - Cooperative routines (delays, timed turns)
//! - Event bus for inter-system communication
//!
//! Engine services (animation, rigid bodies, scene hierarchy) are reached
//! through the traits in [`collaborators`] and [`hit_relay`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ability;
pub mod collaborators;
pub mod config;
pub mod damage;
pub mod enemy;
pub mod error;
pub mod events;
pub mod gauge;
pub mod hit_relay;
pub mod observable;
pub mod player;
pub mod scheduler;
pub mod status;

#[cfg(test)]
pub mod testing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ability::*;
    pub use crate::collaborators::*;
    pub use crate::config::*;
    pub use crate::damage::*;
    pub use crate::enemy::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::gauge::*;
    pub use crate::hit_relay::*;
    pub use crate::observable::*;
    pub use crate::player::*;
    pub use crate::scheduler::*;
    pub use crate::status::*;
}

pub use prelude::*;
