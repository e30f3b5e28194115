//! Combat tuning tables.
//!
//! Loaded once before the first tick and shared read-only as
//! `Arc<CombatConfig>`. Every table has defaults, so a partial TOML file
//! only overrides what it names.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::collaborators::MoverTuning;
use crate::damage::{AttackKind, AttackProfile, LowResourceTier, LowResourceTiers, PassiveModifiers};
use crate::enemy::{EnemyAction, EnemyDecisionConfig};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    /// File is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Values are out of range.
    #[error("invalid config: {0}")]
    Validation(String),
}

// ============================================================================
// Shared tables
// ============================================================================

/// A gauge's capacity and regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeConfig {
    /// Capacity.
    pub max: f32,
    /// Passive regeneration per second.
    pub regen_per_second: f32,
}

impl GaugeConfig {
    /// Create a gauge table.
    #[must_use]
    pub const fn new(max: f32, regen_per_second: f32) -> Self {
        Self {
            max,
            regen_per_second,
        }
    }
}

/// An ability's costs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityCost {
    /// Paid once on activation.
    pub activation: f32,
    /// Paid continuously while active.
    pub per_second: f32,
}

impl AbilityCost {
    /// Create a cost table.
    #[must_use]
    pub const fn new(activation: f32, per_second: f32) -> Self {
        Self {
            activation,
            per_second,
        }
    }
}

/// Player attack profiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackTable {
    /// Light attack.
    pub light: AttackProfile,
    /// Strong attack.
    pub strong: AttackProfile,
    /// Just-avoid counter.
    pub just_avoid: AttackProfile,
}

impl Default for AttackTable {
    fn default() -> Self {
        Self {
            light: AttackProfile::new(10.0, 0.8).with_stamina_cost(8.0).with_max_combo(3),
            strong: AttackProfile::new(22.0, 1.2).with_stamina_cost(18.0).with_max_combo(2),
            just_avoid: AttackProfile::new(35.0, 1.0).with_max_combo(1),
        }
    }
}

impl AttackTable {
    /// Profile of a kind.
    #[must_use]
    pub fn get(&self, kind: AttackKind) -> &AttackProfile {
        match kind {
            AttackKind::Light => &self.light,
            AttackKind::Strong => &self.strong,
            AttackKind::JustAvoid => &self.just_avoid,
        }
    }
}

// ============================================================================
// Player
// ============================================================================

/// Player tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Health pool.
    pub health: GaugeConfig,
    /// Stamina pool (dash, attacks).
    pub stamina: GaugeConfig,
    /// Focus pool (ghost, heal, self-sacrifice).
    pub focus: GaugeConfig,
    /// Dash sprint costs (stamina).
    pub sprint: AbilityCost,
    /// Ghost costs (focus).
    pub ghost: AbilityCost,
    /// Heal costs (focus).
    pub heal: AbilityCost,
    /// Self-sacrifice costs (focus).
    pub self_sacrifice: AbilityCost,
    /// Attack profiles.
    pub attacks: AttackTable,
    /// Fraction of max health recovered per second of healing.
    pub heal_percent_per_second: f32,
    /// Health lost per second of self-sacrifice.
    pub health_drain_per_second: f32,
    /// Self-sacrifice needs the health ratio strictly above this.
    pub self_sacrifice_min_health_ratio: f32,
    /// Seconds a just-avoid counter stays available after an evasion.
    pub just_avoid_window: f32,
    /// Base animation speed before status effects.
    pub anim_speed: f32,
    /// Movement tuning.
    pub mover: MoverTuning,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            health: GaugeConfig::new(100.0, 0.0),
            stamina: GaugeConfig::new(100.0, 15.0),
            focus: GaugeConfig::new(100.0, 5.0),
            sprint: AbilityCost::new(10.0, 20.0),
            ghost: AbilityCost::new(15.0, 25.0),
            heal: AbilityCost::new(10.0, 20.0),
            self_sacrifice: AbilityCost::new(5.0, 10.0),
            attacks: AttackTable::default(),
            heal_percent_per_second: 0.1,
            health_drain_per_second: 4.0,
            self_sacrifice_min_health_ratio: 0.3,
            just_avoid_window: 0.6,
            anim_speed: 1.0,
            mover: MoverTuning::default(),
        }
    }
}

// ============================================================================
// Enemy
// ============================================================================

/// Enemy attack profiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyAttackTable {
    /// Quick attack.
    pub light: AttackProfile,
    /// Heavy attack.
    pub heavy: AttackProfile,
}

impl Default for EnemyAttackTable {
    fn default() -> Self {
        Self {
            light: AttackProfile::new(8.0, 0.9),
            heavy: AttackProfile::new(18.0, 1.4),
        }
    }
}

impl EnemyAttackTable {
    /// Profile for an attack action.
    #[must_use]
    pub fn get(&self, action: EnemyAction) -> Option<&AttackProfile> {
        match action {
            EnemyAction::LightAttack => Some(&self.light),
            EnemyAction::HeavyAttack => Some(&self.heavy),
            _ => None,
        }
    }
}

/// Enemy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Health pool.
    pub health: GaugeConfig,
    /// Attack profiles.
    pub attacks: EnemyAttackTable,
    /// Backstep impulse (m/s velocity change).
    pub backstep_speed: f32,
    /// Attacks are not interrupted by incoming hits.
    pub super_armor_attacks: bool,
    /// Movement tuning.
    pub mover: MoverTuning,
    /// Decision tables.
    pub decision: EnemyDecisionConfig,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            health: GaugeConfig::new(120.0, 0.0),
            attacks: EnemyAttackTable::default(),
            backstep_speed: 6.0,
            super_armor_attacks: true,
            mover: MoverTuning {
                walk_speed: 3.2,
                ..MoverTuning::default()
            },
            decision: EnemyDecisionConfig::default(),
        }
    }
}

// ============================================================================
// Damage
// ============================================================================

/// Damage modifiers applied to the player's attacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageTuning {
    /// Health-ratio tiers.
    pub low_health_tiers: LowResourceTiers,
    /// Bonus per stack (0.05 = +5%).
    pub bonus_per_stack: f32,
    /// Stack cap.
    pub bonus_max_stacks: u32,
    /// Seconds before all stacks expire.
    pub bonus_duration: f32,
    /// Equipment and passive skills.
    pub passives: Vec<PassiveModifiers>,
}

impl Default for DamageTuning {
    fn default() -> Self {
        Self {
            low_health_tiers: LowResourceTiers::new(vec![
                LowResourceTier {
                    threshold: 0.5,
                    multiplier: 1.2,
                },
                LowResourceTier {
                    threshold: 0.25,
                    multiplier: 1.5,
                },
            ]),
            bonus_per_stack: 0.05,
            bonus_max_stacks: 5,
            bonus_duration: 3.0,
            passives: Vec::new(),
        }
    }
}

impl DamageTuning {
    /// All passives folded into one.
    #[must_use]
    pub fn folded_passives(&self) -> PassiveModifiers {
        PassiveModifiers::fold(&self.passives)
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root combat configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Player tables.
    pub player: PlayerConfig,
    /// Enemy tables.
    pub enemy: EnemyConfig,
    /// Damage tables.
    pub damage: DamageTuning,
}

fn check(ok: bool, message: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Validation(message()))
    }
}

fn check_gauge(name: &str, gauge: &GaugeConfig) -> Result<(), ConfigError> {
    check(gauge.max > 0.0 && gauge.max.is_finite(), || {
        format!("{name}.max must be positive, got {}", gauge.max)
    })?;
    check(gauge.regen_per_second >= 0.0, || {
        format!("{name}.regen_per_second must be >= 0, got {}", gauge.regen_per_second)
    })
}

fn check_cost(name: &str, cost: &AbilityCost) -> Result<(), ConfigError> {
    check(cost.activation >= 0.0 && cost.per_second >= 0.0, || {
        format!("{name} costs must be >= 0")
    })
}

fn check_attack(name: &str, profile: &AttackProfile) -> Result<(), ConfigError> {
    check(profile.duration > 0.0, || format!("{name}.duration must be positive"))?;
    check(profile.max_combo >= 1, || format!("{name}.max_combo must be >= 1"))?;
    check(profile.stamina_cost >= 0.0, || format!("{name}.stamina_cost must be >= 0"))
}

impl CombatConfig {
    /// Parse and validate TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded combat config from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults if it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reject values the core cannot run with.
    ///
    /// Decision weights are not rejected: bad weights only mean "no valid
    /// candidate" at draw time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.player;
        check_gauge("player.health", &p.health)?;
        check_gauge("player.stamina", &p.stamina)?;
        check_gauge("player.focus", &p.focus)?;
        check_cost("player.sprint", &p.sprint)?;
        check_cost("player.ghost", &p.ghost)?;
        check_cost("player.heal", &p.heal)?;
        check_cost("player.self_sacrifice", &p.self_sacrifice)?;
        check_attack("player.attacks.light", &p.attacks.light)?;
        check_attack("player.attacks.strong", &p.attacks.strong)?;
        check_attack("player.attacks.just_avoid", &p.attacks.just_avoid)?;
        check((0.0..1.0).contains(&p.self_sacrifice_min_health_ratio), || {
            "player.self_sacrifice_min_health_ratio must be in [0, 1)".to_string()
        })?;
        check(p.heal_percent_per_second >= 0.0 && p.health_drain_per_second >= 0.0, || {
            "player heal/drain rates must be >= 0".to_string()
        })?;

        let e = &self.enemy;
        check_gauge("enemy.health", &e.health)?;
        check_attack("enemy.attacks.light", &e.attacks.light)?;
        check_attack("enemy.attacks.heavy", &e.attacks.heavy)?;
        let d = &e.decision;
        check(d.near_distance >= 0.0 && d.near_distance < d.far_distance, || {
            format!(
                "enemy.decision needs 0 <= near_distance < far_distance, got {} / {}",
                d.near_distance, d.far_distance
            )
        })?;
        check(d.reconsider_interval > 0.0, || {
            "enemy.decision.reconsider_interval must be positive".to_string()
        })?;
        for band in [&d.far, &d.mid, &d.near] {
            if band.iter().all(|c| c.weight.is_nan() || c.weight <= 0.0) {
                warn!("enemy decision band has no positive weight; it will always wait");
            }
        }

        check(self.damage.bonus_per_stack >= 0.0, || {
            "damage.bonus_per_stack must be >= 0".to_string()
        })
    }
}
