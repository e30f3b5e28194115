//! Cooperative, single-threaded routines.
//!
//! A routine yields by returning [`RoutineStatus::Pending`] and resumes on
//! the next [`Scheduler::tick`]. Nothing here blocks a thread or runs
//! concurrently with the frame that spawned it. Every routine carries a
//! [`CancelToken`]; cancelling calls [`Routine::on_cancel`] before the
//! routine is dropped so it can leave its owner in a terminal state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;
use wraith_common::{slerp_facing, Vec3};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Check if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of resuming a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineStatus {
    /// Resume again next tick.
    Pending,
    /// Finished.
    Done,
}

/// A resumable step function.
pub trait Routine: Send {
    /// Advance by `dt` seconds.
    fn resume(&mut self, dt: f32) -> RoutineStatus;

    /// Called once if the routine is cancelled before finishing.
    fn on_cancel(&mut self) {}
}

/// Handle to a spawned routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutineId(u64);

struct Task {
    id: RoutineId,
    token: CancelToken,
    routine: Box<dyn Routine>,
}

/// Runs routines once per tick, in spawn order.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Scheduler {
    /// Empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a routine. It first resumes on the next `tick`.
    pub fn spawn(&mut self, routine: impl Routine + 'static) -> (RoutineId, CancelToken) {
        self.next_id += 1;
        let id = RoutineId(self.next_id);
        let token = CancelToken::new();
        self.tasks.push(Task {
            id,
            token: token.clone(),
            routine: Box::new(routine),
        });
        trace!(routine = self.next_id, "routine spawned");
        (id, token)
    }

    /// Resume every routine once. Cancelled routines get `on_cancel` instead.
    pub fn tick(&mut self, dt: f32) {
        self.tasks.retain_mut(|task| {
            if task.token.is_cancelled() {
                task.routine.on_cancel();
                trace!(routine = task.id.0, "routine cancelled");
                return false;
            }
            match task.routine.resume(dt) {
                RoutineStatus::Pending => true,
                RoutineStatus::Done => {
                    trace!(routine = task.id.0, "routine finished");
                    false
                },
            }
        });
    }

    /// Cancel a routine now. Returns true if it was still running.
    pub fn cancel(&mut self, id: RoutineId) -> bool {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            return false;
        };
        let mut task = self.tasks.remove(index);
        task.token.cancel();
        task.routine.on_cancel();
        true
    }

    /// Cancel everything.
    pub fn cancel_all(&mut self) {
        for mut task in self.tasks.drain(..) {
            task.token.cancel();
            task.routine.on_cancel();
        }
    }

    /// Running routines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if nothing is running.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

// ============================================================================
// Stock routines
// ============================================================================

/// Waits, then runs a callback once.
pub struct Delay<F: FnOnce() + Send> {
    remaining: f32,
    action: Option<F>,
}

impl<F: FnOnce() + Send> Delay<F> {
    /// Run `action` after `seconds`.
    pub fn new(seconds: f32, action: F) -> Self {
        Self {
            remaining: seconds.max(0.0),
            action: Some(action),
        }
    }
}

impl<F: FnOnce() + Send> Routine for Delay<F> {
    fn resume(&mut self, dt: f32) -> RoutineStatus {
        self.remaining -= dt;
        if self.remaining > 0.0 {
            return RoutineStatus::Pending;
        }
        if let Some(action) = self.action.take() {
            action();
        }
        RoutineStatus::Done
    }

    fn on_cancel(&mut self) {
        self.action = None;
    }
}

/// Turns a shared facing toward a target over a fixed duration.
pub struct LookAt {
    facing: Arc<parking_lot::Mutex<Vec3>>,
    start: Vec3,
    target: Vec3,
    duration: f32,
    elapsed: f32,
}

impl LookAt {
    /// Interpolate `facing` toward `target` over `duration` seconds.
    #[must_use]
    pub fn new(facing: Arc<parking_lot::Mutex<Vec3>>, target: Vec3, duration: f32) -> Self {
        let start = *facing.lock();
        Self {
            facing,
            start,
            target,
            duration: duration.max(f32::EPSILON),
            elapsed: 0.0,
        }
    }
}

impl Routine for LookAt {
    fn resume(&mut self, dt: f32) -> RoutineStatus {
        self.elapsed += dt;
        let t = (self.elapsed / self.duration).min(1.0);
        *self.facing.lock() = slerp_facing(self.start, self.target, t);
        if t >= 1.0 {
            RoutineStatus::Done
        } else {
            RoutineStatus::Pending
        }
    }

    fn on_cancel(&mut self) {
        // Snap to the end facing.
        *self.facing.lock() = slerp_facing(self.start, self.target, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_delay_fires_once_after_time() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let mut scheduler = Scheduler::new();
        scheduler.spawn(Delay::new(0.5, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        scheduler.tick(0.25);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        scheduler.tick(0.25);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_empty());
        scheduler.tick(1.0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_token_skips_action() {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let mut scheduler = Scheduler::new();
        let (_, token) = scheduler.spawn(Delay::new(0.1, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        token.cancel();
        scheduler.tick(1.0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.len(), 0);
    }

    struct Channel {
        active: Arc<AtomicBool>,
    }

    impl Routine for Channel {
        fn resume(&mut self, _dt: f32) -> RoutineStatus {
            RoutineStatus::Pending
        }

        fn on_cancel(&mut self) {
            self.active.store(false, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_cancel_leaves_terminal_state() {
        let active = Arc::new(AtomicBool::new(true));
        let mut scheduler = Scheduler::new();
        let (id, _) = scheduler.spawn(Channel {
            active: Arc::clone(&active),
        });
        scheduler.tick(0.1);
        assert!(active.load(Ordering::SeqCst));
        assert!(scheduler.cancel(id));
        assert!(!active.load(Ordering::SeqCst));
        assert!(!scheduler.cancel(id));
    }

    #[test]
    fn test_look_at_reaches_target() {
        let facing = Arc::new(parking_lot::Mutex::new(Vec3::Z));
        let mut scheduler = Scheduler::new();
        scheduler.spawn(LookAt::new(Arc::clone(&facing), Vec3::X, 0.3));
        scheduler.tick(0.1);
        let mid = *facing.lock();
        assert!(mid.x > 0.0 && mid.z > 0.0);
        scheduler.tick(0.1);
        scheduler.tick(0.1);
        scheduler.tick(0.1);
        assert!((*facing.lock() - Vec3::X).length() < 1e-4);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_cancel_all_snaps_look_at() {
        let facing = Arc::new(parking_lot::Mutex::new(Vec3::Z));
        let mut scheduler = Scheduler::new();
        scheduler.spawn(LookAt::new(Arc::clone(&facing), Vec3::X, 10.0));
        scheduler.tick(0.1);
        scheduler.cancel_all();
        assert!((*facing.lock() - Vec3::X).length() < 1e-4);
    }
}
