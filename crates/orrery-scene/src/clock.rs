//! Scene clock: elapsed time driving all animation angles.

/// Monotonically increasing scene time, advanced once per frame.
///
/// Every animation angle in the scene derives from `elapsed_seconds`. The
/// per-frame delta is stored alongside but nothing downstream consumes it;
/// it is kept for frame-time logging.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneClock {
    elapsed_seconds: f64,
    delta_seconds: f64,
}

impl SceneClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one frame's delta. Negative deltas are ignored
    /// so the clock never runs backwards.
    pub fn advance(&mut self, delta_seconds: f64) {
        let delta = delta_seconds.max(0.0);
        self.elapsed_seconds += delta;
        self.delta_seconds = delta;
    }

    /// Total elapsed scene time in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// The delta applied by the most recent [`advance`](Self::advance).
    pub fn delta_seconds(&self) -> f64 {
        self.delta_seconds
    }
}
