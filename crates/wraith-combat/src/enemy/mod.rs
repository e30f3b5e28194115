//! Enemy decision engine and agent.

mod agent;
mod decision;

pub use agent::{EnemyAgent, EnemyState};
pub use decision::{
    decide, DistanceBand, EnemyAction, EnemyDecisionConfig, RandomSource, WeightedAction,
};
