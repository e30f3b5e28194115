//! Weighted-random enemy decisions.
//!
//! Distance picks a band, the band picks a candidate list, and a weighted
//! draw picks the action. The previous action is suppressed by zeroing its
//! weight. Anything that leaves no positive weight (empty list, all zero,
//! missing config) yields [`EnemyAction::Wait`].

use serde::{Deserialize, Serialize};

/// What an enemy can decide to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyAction {
    /// Stand still briefly. Also the fallback.
    Wait,
    /// Move toward the target.
    Chase,
    /// Quick attack.
    LightAttack,
    /// Slow, heavy attack.
    HeavyAttack,
    /// Hold distance and watch.
    Observe,
    /// Hop away from the target.
    Backstep,
}

impl EnemyAction {
    /// Returned whenever no candidate can be drawn.
    pub const FALLBACK: Self = Self::Wait;

    /// Whether the action is an attack.
    #[must_use]
    pub const fn is_attack(self) -> bool {
        matches!(self, Self::LightAttack | Self::HeavyAttack)
    }
}

/// Distance tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBand {
    /// At or beyond `far_distance`.
    Far,
    /// Between the thresholds.
    Mid,
    /// At or within `near_distance`.
    Near,
}

/// One `(action, weight)` candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedAction {
    /// Candidate action.
    pub action: EnemyAction,
    /// Relative weight. Non-positive weights are never drawn.
    pub weight: f32,
}

impl WeightedAction {
    /// Create a candidate.
    #[must_use]
    pub const fn new(action: EnemyAction, weight: f32) -> Self {
        Self { action, weight }
    }
}

/// Decision tables, immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyDecisionConfig {
    /// Far threshold (m).
    pub far_distance: f32,
    /// Near threshold (m).
    pub near_distance: f32,
    /// Candidates when far.
    pub far: Vec<WeightedAction>,
    /// Candidates in between.
    pub mid: Vec<WeightedAction>,
    /// Candidates when near.
    pub near: Vec<WeightedAction>,
    /// Observe duration (s).
    pub observe_seconds: f32,
    /// Wait duration (s).
    pub wait_seconds: f32,
    /// Re-decide interval while chasing (s).
    pub reconsider_interval: f32,
}

impl Default for EnemyDecisionConfig {
    fn default() -> Self {
        use EnemyAction::{Backstep, Chase, HeavyAttack, LightAttack, Observe, Wait};
        Self {
            far_distance: 8.0,
            near_distance: 2.5,
            far: vec![
                WeightedAction::new(Chase, 70.0),
                WeightedAction::new(Observe, 20.0),
                WeightedAction::new(Wait, 10.0),
            ],
            mid: vec![
                WeightedAction::new(Chase, 50.0),
                WeightedAction::new(Observe, 30.0),
                WeightedAction::new(Backstep, 10.0),
                WeightedAction::new(Wait, 10.0),
            ],
            near: vec![
                WeightedAction::new(LightAttack, 50.0),
                WeightedAction::new(HeavyAttack, 25.0),
                WeightedAction::new(Backstep, 15.0),
                WeightedAction::new(Observe, 10.0),
            ],
            observe_seconds: 1.5,
            wait_seconds: 0.6,
            reconsider_interval: 1.0,
        }
    }
}

impl EnemyDecisionConfig {
    /// Band for a distance.
    #[must_use]
    pub fn band(&self, distance: f32) -> DistanceBand {
        if distance >= self.far_distance {
            DistanceBand::Far
        } else if distance <= self.near_distance {
            DistanceBand::Near
        } else {
            DistanceBand::Mid
        }
    }

    /// Candidate list of a band.
    #[must_use]
    pub fn candidates(&self, band: DistanceBand) -> &[WeightedAction] {
        match band {
            DistanceBand::Far => &self.far,
            DistanceBand::Mid => &self.mid,
            DistanceBand::Near => &self.near,
        }
    }
}

/// Uniform random source in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f32;
}

impl RandomSource for fastrand::Rng {
    fn next_unit(&mut self) -> f32 {
        self.f32()
    }
}

fn effective_weight(candidate: &WeightedAction, last: Option<EnemyAction>) -> f32 {
    if Some(candidate.action) == last || candidate.weight.is_nan() {
        0.0
    } else {
        candidate.weight.max(0.0)
    }
}

/// Pick the next action.
///
/// The draw is uniform in `[0, total)`; the first candidate whose cumulative
/// weight meets or exceeds it wins. Zero-weight candidates are skipped even
/// when the draw sits on their boundary.
pub fn decide(
    distance: f32,
    last: Option<EnemyAction>,
    config: Option<&EnemyDecisionConfig>,
    rng: &mut impl RandomSource,
) -> EnemyAction {
    let Some(config) = config else {
        return EnemyAction::FALLBACK;
    };
    let candidates = config.candidates(config.band(distance));
    let total: f32 = candidates.iter().map(|c| effective_weight(c, last)).sum();
    if total <= 0.0 || !total.is_finite() {
        return EnemyAction::FALLBACK;
    }

    let draw = rng.next_unit() * total;
    let mut cumulative = 0.0;
    let mut chosen = EnemyAction::FALLBACK;
    for candidate in candidates {
        let weight = effective_weight(candidate, last);
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        chosen = candidate.action;
        if cumulative >= draw {
            break;
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f32);

    impl RandomSource for Fixed {
        fn next_unit(&mut self) -> f32 {
            self.0
        }
    }

    fn two(weights: [f32; 2]) -> EnemyDecisionConfig {
        EnemyDecisionConfig {
            near: vec![
                WeightedAction::new(EnemyAction::LightAttack, weights[0]),
                WeightedAction::new(EnemyAction::HeavyAttack, weights[1]),
            ],
            ..EnemyDecisionConfig::default()
        }
    }

    #[test]
    fn test_bands() {
        let config = EnemyDecisionConfig::default();
        assert_eq!(config.band(20.0), DistanceBand::Far);
        assert_eq!(config.band(8.0), DistanceBand::Far);
        assert_eq!(config.band(5.0), DistanceBand::Mid);
        assert_eq!(config.band(2.5), DistanceBand::Near);
        assert_eq!(config.band(0.0), DistanceBand::Near);
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let config = two([10.0, 30.0]);
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let draws: u32 = 40_000;
        let mut light = 0u32;
        for _ in 0..draws {
            if decide(1.0, None, Some(&config), &mut rng) == EnemyAction::LightAttack {
                light += 1;
            }
        }
        let ratio = f64::from(light) / f64::from(draws);
        assert!((ratio - 0.25).abs() < 0.015, "light ratio {ratio}");
    }

    #[test]
    fn test_anti_repetition() {
        let config = two([10.0, 30.0]);
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..5_000 {
            let action = decide(1.0, Some(EnemyAction::HeavyAttack), Some(&config), &mut rng);
            assert_eq!(action, EnemyAction::LightAttack);
        }
    }

    #[test]
    fn test_only_last_action_weighted_falls_back() {
        let config = two([0.0, 30.0]);
        let mut rng = Fixed(0.5);
        assert_eq!(
            decide(1.0, Some(EnemyAction::HeavyAttack), Some(&config), &mut rng),
            EnemyAction::Wait
        );
    }

    #[test]
    fn test_missing_config_falls_back() {
        let mut rng = Fixed(0.0);
        assert_eq!(decide(1.0, None, None, &mut rng), EnemyAction::Wait);
    }

    #[test]
    fn test_negative_and_nan_weights_never_drawn() {
        let config = EnemyDecisionConfig {
            near: vec![
                WeightedAction::new(EnemyAction::Backstep, -5.0),
                WeightedAction::new(EnemyAction::Observe, f32::NAN),
                WeightedAction::new(EnemyAction::LightAttack, 1.0),
            ],
            ..EnemyDecisionConfig::default()
        };
        for draw in [0.0, 0.3, 0.999] {
            let mut rng = Fixed(draw);
            assert_eq!(decide(1.0, None, Some(&config), &mut rng), EnemyAction::LightAttack);
        }
    }

    #[test]
    fn test_zero_draw_skips_leading_zero_weight() {
        let config = two([0.0, 1.0]);
        let mut rng = Fixed(0.0);
        assert_eq!(decide(1.0, None, Some(&config), &mut rng), EnemyAction::HeavyAttack);
    }

    #[test]
    fn test_cumulative_boundary() {
        let config = two([10.0, 30.0]);
        let mut rng = Fixed(0.25);
        assert_eq!(decide(1.0, None, Some(&config), &mut rng), EnemyAction::LightAttack);
        let mut rng = Fixed(0.2501);
        assert_eq!(decide(1.0, None, Some(&config), &mut rng), EnemyAction::HeavyAttack);
    }

    #[test]
    fn test_empty_band_falls_back() {
        let config = EnemyDecisionConfig {
            far: Vec::new(),
            ..EnemyDecisionConfig::default()
        };
        let mut rng = Fixed(0.1);
        assert_eq!(decide(50.0, None, Some(&config), &mut rng), EnemyAction::Wait);
    }
}
