//! Contracts for the I/O layers the core drives but does not implement.
//!
//! Animation playback, physics integration and spatial queries live outside
//! the core. The core issues fire-and-forget animation parameters, pushes
//! forces into a body, and reads positions once per tick.

use serde::{Deserialize, Serialize};
use wraith_common::{camera_relative, flatten, slerp_facing, Vec2, Vec3};

// ============================================================================
// Animation
// ============================================================================

/// Animation parameter sink. Return values are never inspected.
pub trait AnimationSink: Send {
    /// Fire a trigger.
    fn play_trigger(&mut self, name: &str);
    /// Set a bool parameter.
    fn set_bool(&mut self, name: &str, value: bool);
    /// Set an int parameter.
    fn set_int(&mut self, name: &str, value: i32);
    /// Set a float parameter.
    fn set_float(&mut self, name: &str, value: f32);
}

/// Callbacks authored on animation clips.
///
/// These may arrive in any order relative to the core's own timers and are
/// authoritative over estimated durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationCallback {
    /// The current attack clip finished.
    AttackFinished,
    /// Follow-up inputs are honored from here.
    ComboWindowOpened,
    /// Follow-up inputs are no longer honored.
    ComboWindowClosed,
    /// Weapon collider goes live.
    WeaponHitboxEnabled,
    /// Weapon collider goes dead.
    WeaponHitboxDisabled,
}

/// Animation parameter names shared by player and enemy rigs.
pub mod params {
    /// Planar speed (float).
    pub const SPEED: &str = "Speed";
    /// Dashing (bool).
    pub const DASHING: &str = "IsDashing";
    /// Ghost mode (bool).
    pub const GHOST: &str = "IsGhost";
    /// Healing channel (bool).
    pub const HEALING: &str = "IsHealing";
    /// Self-sacrifice channel (bool).
    pub const SACRIFICING: &str = "IsSacrificing";
    /// Lock-on (bool).
    pub const LOCKED_ON: &str = "IsLockedOn";
    /// Current combo step (int).
    pub const COMBO_STEP: &str = "ComboStep";
    /// Animation playback speed (float).
    pub const ANIM_SPEED: &str = "AnimSpeed";
    /// Hit reaction trigger.
    pub const HIT: &str = "Hit";
    /// Death trigger.
    pub const DIE: &str = "Die";
    /// Enemy backstep trigger.
    pub const BACKSTEP: &str = "Backstep";
    /// Enemy heavy attack trigger.
    pub const HEAVY_ATTACK: &str = "HeavyAttack";
}

// ============================================================================
// Physics
// ============================================================================

/// How a force vector is interpreted by the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForceMode {
    /// Continuous force, mass-dependent.
    Force,
    /// Continuous acceleration, mass-independent.
    Acceleration,
    /// Instant impulse, mass-dependent.
    Impulse,
    /// Instant velocity change, mass-independent.
    VelocityChange,
}

/// Rigid body primitive. The core never integrates positions itself.
pub trait PhysicsBody: Send {
    /// Push a force.
    fn add_force(&mut self, force: Vec3, mode: ForceMode);
    /// Current linear velocity.
    fn linear_velocity(&self) -> Vec3;
}

/// Read-only positions sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialFrame {
    /// Own position.
    pub self_position: Vec3,
    /// Current target, if any.
    pub target_position: Option<Vec3>,
    /// Camera forward (player only).
    pub camera_forward: Vec3,
}

impl Default for SpatialFrame {
    fn default() -> Self {
        Self {
            self_position: Vec3::ZERO,
            target_position: None,
            camera_forward: Vec3::Z,
        }
    }
}

impl SpatialFrame {
    /// Create a frame at `position` with no target.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            self_position: position,
            ..Self::default()
        }
    }

    /// Set the target (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target_position = Some(target);
        self
    }

    /// Set the camera forward (builder pattern).
    #[must_use]
    pub fn with_camera(mut self, forward: Vec3) -> Self {
        self.camera_forward = forward;
        self
    }

    /// Planar direction toward the target.
    #[must_use]
    pub fn direction_to_target(&self) -> Option<Vec3> {
        self.target_position
            .map(|t| flatten(t - self.self_position))
    }

    /// Planar distance to the target.
    #[must_use]
    pub fn distance_to_target(&self) -> Option<f32> {
        self.target_position
            .map(|t| wraith_common::planar_distance(self.self_position, t))
    }
}

// ============================================================================
// Mover
// ============================================================================

/// Movement mode chosen by the active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveMode {
    /// Normal locomotion.
    #[default]
    Walk,
    /// Dash speed.
    Dash,
    /// Stand still (attacks, channels).
    Hold,
}

/// Mover tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoverTuning {
    /// Walk speed (m/s).
    pub walk_speed: f32,
    /// Dash speed (m/s).
    pub dash_speed: f32,
    /// Turn rate (fraction of the arc per second).
    pub turn_rate: f32,
}

impl Default for MoverTuning {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            dash_speed: 9.0,
            turn_rate: 12.0,
        }
    }
}

/// Turns intent into desired velocity and facing, then into forces.
///
/// `update` runs in the variable-step phase, `fixed_update` in the
/// fixed-step phase.
#[derive(Debug, Clone)]
pub struct Mover {
    tuning: MoverTuning,
    mode: MoveMode,
    axis: Vec2,
    speed_multiplier: f32,
    desired_velocity: Vec3,
    facing: Vec3,
}

impl Mover {
    /// Create a mover facing +Z.
    #[must_use]
    pub fn new(tuning: MoverTuning) -> Self {
        Self {
            tuning,
            mode: MoveMode::Walk,
            axis: Vec2::ZERO,
            speed_multiplier: 1.0,
            desired_velocity: Vec3::ZERO,
            facing: Vec3::Z,
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> MoveMode {
        self.mode
    }

    /// Set the mode.
    pub fn set_mode(&mut self, mode: MoveMode) {
        self.mode = mode;
    }

    /// Set the raw input axis (or the AI's steering axis).
    pub fn set_axis(&mut self, axis: Vec2) {
        self.axis = axis.clamp_length_max(1.0);
    }

    /// Raw input axis.
    #[must_use]
    pub fn axis(&self) -> Vec2 {
        self.axis
    }

    /// Status-effect speed multiplier.
    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier.max(0.0);
    }

    /// Velocity requested for the next fixed step.
    #[must_use]
    pub fn desired_velocity(&self) -> Vec3 {
        self.desired_velocity
    }

    /// Planar facing.
    #[must_use]
    pub fn facing(&self) -> Vec3 {
        self.facing
    }

    /// Point the facing somewhere immediately.
    pub fn face(&mut self, direction: Vec3) {
        let d = flatten(direction);
        if d != Vec3::ZERO {
            self.facing = d;
        }
    }

    /// Variable-step: compute desired velocity and turn.
    ///
    /// A target in the frame (lock-on or AI target) overrides facing.
    pub fn update(&mut self, dt: f32, frame: &SpatialFrame) {
        let direction = camera_relative(self.axis, frame.camera_forward);
        let speed = match self.mode {
            MoveMode::Walk => self.tuning.walk_speed,
            MoveMode::Dash => self.tuning.dash_speed,
            MoveMode::Hold => 0.0,
        };
        let mut move_dir = direction;
        if self.mode == MoveMode::Dash && move_dir == Vec3::ZERO {
            move_dir = self.facing;
        }
        let magnitude = match self.mode {
            MoveMode::Dash => 1.0,
            MoveMode::Walk | MoveMode::Hold => self.axis.length(),
        };
        self.desired_velocity = move_dir * speed * self.speed_multiplier * magnitude;

        let want = frame
            .direction_to_target()
            .filter(|d| *d != Vec3::ZERO)
            .unwrap_or(move_dir);
        if want != Vec3::ZERO {
            self.facing = slerp_facing(self.facing, want, self.tuning.turn_rate * dt);
        }
    }

    /// Fixed-step: push the planar velocity delta into the body.
    pub fn fixed_update(&self, body: &mut dyn PhysicsBody) {
        let current = body.linear_velocity();
        let delta = Vec3::new(
            self.desired_velocity.x - current.x,
            0.0,
            self.desired_velocity.z - current.z,
        );
        if delta.length_squared() > 1e-8 {
            body.add_force(delta, ForceMode::VelocityChange);
        }
    }

    /// Stop immediately.
    pub fn halt(&mut self) {
        self.axis = Vec2::ZERO;
        self.desired_velocity = Vec3::ZERO;
    }
}
