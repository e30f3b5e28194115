//! In-memory collaborators for tests.

use std::sync::Arc;

use parking_lot::Mutex;
use wraith_common::Vec3;

use crate::collaborators::{AnimationSink, ForceMode, PhysicsBody};

/// One recorded animation call.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimCall {
    /// `play_trigger`
    Trigger(String),
    /// `set_bool`
    Bool(String, bool),
    /// `set_int`
    Int(String, i32),
    /// `set_float`
    Float(String, f32),
}

/// Animation sink that records every call into a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingAnimator {
    /// Shared call log.
    pub log: Arc<Mutex<Vec<AnimCall>>>,
}

impl RecordingAnimator {
    /// New animator and a handle to its log.
    #[must_use]
    pub fn new() -> (Self, Arc<Mutex<Vec<AnimCall>>>) {
        let animator = Self::default();
        let log = Arc::clone(&animator.log);
        (animator, log)
    }

    /// Triggers fired so far, in order.
    #[must_use]
    pub fn triggers(log: &Mutex<Vec<AnimCall>>) -> Vec<String> {
        log.lock()
            .iter()
            .filter_map(|c| match c {
                AnimCall::Trigger(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last int value written to `name`.
    #[must_use]
    pub fn last_int(log: &Mutex<Vec<AnimCall>>, name: &str) -> Option<i32> {
        log.lock().iter().rev().find_map(|c| match c {
            AnimCall::Int(n, v) if n == name => Some(*v),
            _ => None,
        })
    }

    /// Last bool value written to `name`.
    #[must_use]
    pub fn last_bool(log: &Mutex<Vec<AnimCall>>, name: &str) -> Option<bool> {
        log.lock().iter().rev().find_map(|c| match c {
            AnimCall::Bool(n, v) if n == name => Some(*v),
            _ => None,
        })
    }
}

impl AnimationSink for RecordingAnimator {
    fn play_trigger(&mut self, name: &str) {
        self.log.lock().push(AnimCall::Trigger(name.to_string()));
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.log.lock().push(AnimCall::Bool(name.to_string(), value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.log.lock().push(AnimCall::Int(name.to_string(), value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.log.lock().push(AnimCall::Float(name.to_string(), value));
    }
}

/// Body that records forces and reports a fixed velocity.
#[derive(Debug, Clone, Default)]
pub struct RecordingBody {
    /// Velocity returned by `linear_velocity`.
    pub velocity: Vec3,
    /// Every force pushed, in order.
    pub forces: Vec<(Vec3, ForceMode)>,
}

impl RecordingBody {
    /// Body moving at `velocity`.
    #[must_use]
    pub fn with_velocity(velocity: Vec3) -> Self {
        Self {
            velocity,
            forces: Vec::new(),
        }
    }
}

impl PhysicsBody for RecordingBody {
    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        self.forces.push((force, mode));
    }

    fn linear_velocity(&self) -> Vec3 {
        self.velocity
    }
}

/// Recording body behind a shared handle, for bodies owned by an actor.
#[derive(Debug, Clone, Default)]
pub struct SharedBody(pub Arc<Mutex<RecordingBody>>);

impl PhysicsBody for SharedBody {
    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        self.0.lock().add_force(force, mode);
    }

    fn linear_velocity(&self) -> Vec3 {
        self.0.lock().velocity
    }
}
