//! Actor construction errors.

use thiserror::Error;
use wraith_common::WraithError;

use crate::ability::AbilityError;
use crate::config::ConfigError;
use crate::gauge::GaugeError;

/// Anything that can go wrong while wiring an actor.
#[derive(Debug, Error)]
pub enum CombatError {
    /// Gauge parameters were rejected.
    #[error(transparent)]
    Gauge(#[from] GaugeError),
    /// Ability wiring was rejected.
    #[error(transparent)]
    Ability(#[from] AbilityError),
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A shared wiring fault.
    #[error(transparent)]
    Wiring(#[from] WraithError),
}

/// Result type alias for actor construction.
pub type CombatResult<T> = Result<T, CombatError>;
