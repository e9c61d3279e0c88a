//! Frame clock shared by every effect.
//!
//! The [`Clock`] is the single source of time for the engine. It is advanced
//! exactly once per frame by the [`FrameDriver`](crate::driver::FrameDriver)
//! and every active effect receives the same [`FrameTime`] snapshot for that
//! frame, so no effect can drift from another.
//!
//! # Example
//!
//! ```
//! use vfxe::time::Clock;
//!
//! let mut clock = Clock::new();
//!
//! // Deterministic stepping (tests, headless runs):
//! let frame = clock.advance(0.016);
//! assert_eq!(frame.index, 1);
//! assert!((frame.elapsed - 0.016).abs() < 1e-6);
//! ```

use std::time::Instant;

/// Timing values observed by every effect during one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous frame (after scaling).
    pub delta: f32,
    /// Accumulated seconds since the clock started (sum of deltas).
    pub elapsed: f32,
    /// Frame index, starting at 1 for the first tick.
    pub index: u64,
}

impl FrameTime {
    /// A frame at an explicit point in time. Handy for driving a single
    /// effect in isolation.
    pub fn new(delta: f32, elapsed: f32, index: u64) -> Self {
        Self {
            delta,
            elapsed,
            index,
        }
    }
}

/// Monotonic frame clock.
///
/// Elapsed time is the accumulation of (scaled) deltas, so pausing or changing
/// the time scale never makes `elapsed` jump.
#[derive(Debug)]
pub struct Clock {
    /// When the last frame was sampled.
    last_sample: Instant,
    /// Accumulated elapsed time in seconds.
    elapsed_secs: f32,
    /// Time since last frame in seconds.
    delta_secs: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Whether time is paused.
    paused: bool,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
    /// Upper bound for a single wall-clock delta.
    max_delta: f32,
}

impl Clock {
    /// Create a new clock starting from now.
    pub fn new() -> Self {
        Self {
            last_sample: Instant::now(),
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: 0.1,
        }
    }

    /// Sample the wall clock and advance. Call once per frame.
    ///
    /// Long stalls (window drag, debugger) are capped at `max_delta` so
    /// delta-integrated effects do not tunnel through their bounds.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw = now.duration_since(self.last_sample).as_secs_f32();
        self.last_sample = now;
        let raw = self.fixed_delta.unwrap_or(raw.min(self.max_delta));
        self.step(raw)
    }

    /// Advance by an explicit delta, ignoring the wall clock.
    pub fn advance(&mut self, delta: f32) -> FrameTime {
        self.last_sample = Instant::now();
        self.step(delta.max(0.0))
    }

    fn step(&mut self, raw_delta: f32) -> FrameTime {
        self.delta_secs = if self.paused {
            0.0
        } else {
            raw_delta * self.time_scale
        };
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;
        self.now()
    }

    /// The most recent frame snapshot.
    pub fn now(&self) -> FrameTime {
        FrameTime {
            delta: self.delta_secs,
            elapsed: self.elapsed_secs,
            index: self.frame_count,
        }
    }

    /// Total elapsed time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Whether time is currently paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Pause time progression.
    ///
    /// While paused, frames still tick but `delta` is 0 and `elapsed` holds.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_sample = Instant::now();
            self.paused = false;
        }
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set a fixed delta time for deterministic updates.
    ///
    /// Pass `None` to use real frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Reset the clock to its initial state.
    pub fn reset(&mut self) {
        self.last_sample = Instant::now();
        self.elapsed_secs = 0.0;
        self.delta_secs = 0.0;
        self.frame_count = 0;
        self.paused = false;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_clock_new() {
        let clock = Clock::new();
        assert_eq!(clock.frame(), 0);
        assert!(!clock.is_paused());
        assert_eq!(clock.time_scale(), 1.0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_clock_tick() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        let frame = clock.tick();

        assert!(frame.elapsed > 0.0);
        assert!(frame.delta > 0.0);
        assert_eq!(frame.index, 1);
    }

    #[test]
    fn test_elapsed_is_sum_of_deltas() {
        let mut clock = Clock::new();
        clock.advance(0.25);
        clock.advance(0.5);
        let frame = clock.advance(0.25);
        assert!((frame.elapsed - 1.0).abs() < 1e-6);
        assert_eq!(frame.index, 3);
    }

    #[test]
    fn test_clock_pause() {
        let mut clock = Clock::new();
        clock.advance(0.1);

        clock.pause();
        assert!(clock.is_paused());

        let before = clock.elapsed();
        let frame = clock.advance(0.1);

        assert_eq!(frame.elapsed, before);
        assert_eq!(frame.delta, 0.0);
        // Frames still count while paused
        assert_eq!(frame.index, 2);
    }

    #[test]
    fn test_clock_scale() {
        let mut clock = Clock::new();
        clock.set_time_scale(2.0);
        let frame = clock.advance(0.1);
        assert!((frame.delta - 0.2).abs() < 1e-6);

        // Negative scale should clamp to 0
        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = Clock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(30));
        clock.tick();

        let expected = 1.0 / 60.0;
        assert!((clock.delta() - expected).abs() < 0.0001);
    }

    #[test]
    fn test_stall_is_capped() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(150));
        let frame = clock.tick();
        assert!(frame.delta <= 0.1 + 1e-6);
    }
}
