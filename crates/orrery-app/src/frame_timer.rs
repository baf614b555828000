//! Wall-clock frame timing for the render loop.
//!
//! All animation in the scene derives from accumulated elapsed time, so the
//! timer's job is to measure per-frame deltas and clamp the spikes a
//! suspended or stalled process would otherwise feed into the scene clock.

use std::time::Instant;
use tracing::warn;

/// Maximum accepted frame delta in seconds. A frame longer than this (e.g.
/// the window was suspended) is clamped so the scene does not jump.
pub const MAX_DELTA: f64 = 0.25;

/// Measures elapsed time since startup and the delta between consecutive
/// frames.
pub struct FrameTimer {
    start: Instant,
    previous: Instant,
    frame_count: u64,
}

impl FrameTimer {
    /// Creates a timer starting from the current instant.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            previous: now,
            frame_count: 0,
        }
    }

    /// Marks a frame boundary and returns the delta in seconds since the
    /// previous frame, clamped to [`MAX_DELTA`].
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let mut delta = now.duration_since(self.previous).as_secs_f64();
        self.previous = now;
        self.frame_count += 1;

        if delta > MAX_DELTA {
            warn!(
                "Frame delta {:.1}ms exceeds maximum, clamping to {:.1}ms",
                delta * 1000.0,
                MAX_DELTA * 1000.0
            );
            delta = MAX_DELTA;
        }

        delta
    }

    /// Wall-clock seconds since the timer was created.
    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Total number of frames ticked so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// A testable version of the frame timer that accepts explicit frame times
/// instead of measuring wall-clock time.
#[cfg(test)]
struct TestableFrameTimer {
    elapsed: f64,
    frame_count: u64,
}

#[cfg(test)]
impl TestableFrameTimer {
    fn new() -> Self {
        Self {
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Tick with an explicit frame time (in seconds), returning the clamped
    /// delta.
    fn tick(&mut self, frame_time: f64) -> f64 {
        let delta = if frame_time > MAX_DELTA {
            MAX_DELTA
        } else {
            frame_time
        };
        self.elapsed += delta;
        self.frame_count += 1;
        delta
    }
}
