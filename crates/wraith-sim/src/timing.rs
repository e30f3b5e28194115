//! Frame timing for the headless duel.
//!
//! Splits wall-clock frames into one variable-step update and zero or more
//! fixed steps, with a clamp on long frames so a stall cannot snowball into
//! an unbounded catch-up loop.

use std::collections::VecDeque;

/// Upper bound on fixed steps run for one frame.
const MAX_FIXED_STEPS: u32 = 10;

/// Variable/fixed step clock.
#[derive(Debug)]
pub struct FrameClock {
    /// Fixed timestep delta (physics)
    fixed_dt: f32,
    /// Largest frame delta accepted
    max_dt: f32,
    /// Time owed to the fixed step
    accumulator: f32,
    /// Simulated time so far
    elapsed: f32,
    /// Frames seen
    frames: u64,
    /// Recent frame deltas for averaging
    frame_times: VecDeque<f32>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 0.25)
    }
}

impl FrameClock {
    /// Create a clock.
    #[must_use]
    pub fn new(fixed_dt: f32, max_dt: f32) -> Self {
        Self {
            fixed_dt: fixed_dt.max(0.001),
            max_dt: max_dt.max(fixed_dt),
            accumulator: 0.0,
            elapsed: 0.0,
            frames: 0,
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Fixed timestep.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Simulated seconds so far.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Frames advanced so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Start a frame of raw length `dt`.
    ///
    /// Returns the clamped variable-step delta and how many fixed steps to run.
    pub fn advance(&mut self, dt: f32) -> (f32, u32) {
        let dt = dt.clamp(0.0, self.max_dt);
        self.frames += 1;
        self.elapsed += dt;

        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < MAX_FIXED_STEPS {
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }
        // Still behind: drop the debt.
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }
        (dt, steps)
    }

    /// Average frame time in milliseconds over recent frames.
    #[must_use]
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        (self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32) * 1000.0
    }
}
