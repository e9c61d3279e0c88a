//! Frame-rate sampling.
//!
//! The frame driver bumps a shared [`FrameCounter`] once per frame. A
//! [`PerformanceMonitor`] reads that counter on its own schedule and turns it
//! into frames per second over a one second window. Reading an atomic counter
//! is the only interaction, so the monitor can sample at any phase relative to
//! frame boundaries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic frame counter shared between the frame driver and samplers.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter(Arc<AtomicU64>);

impl FrameCounter {
    /// A counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed frame.
    #[inline]
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Frames recorded so far.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// FPS sampler over a fixed window (one second by default).
#[derive(Debug)]
pub struct PerformanceMonitor {
    counter: FrameCounter,
    window: Duration,
    last_sample: Instant,
    last_count: u64,
    fps: f32,
}

impl PerformanceMonitor {
    /// Create a sampler reading `counter`, starting its window now.
    pub fn new(counter: FrameCounter) -> Self {
        Self::starting_at(counter, Instant::now())
    }

    /// Create a sampler whose first window starts at `start`.
    pub fn starting_at(counter: FrameCounter, start: Instant) -> Self {
        let last_count = counter.get();
        Self {
            counter,
            window: Duration::from_secs(1),
            last_sample: start,
            last_count,
            fps: 0.0,
        }
    }

    /// Override the sampling window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window.max(Duration::from_millis(1));
        self
    }

    /// Sample at `now`.
    ///
    /// Returns the new FPS value once a full window has elapsed since the
    /// previous sample, `None` otherwise.
    pub fn sample(&mut self, now: Instant) -> Option<f32> {
        let elapsed = now.checked_duration_since(self.last_sample)?;
        if elapsed < self.window {
            return None;
        }

        let count = self.counter.get();
        let frames = count.saturating_sub(self.last_count);
        self.fps = frames as f32 / elapsed.as_secs_f32();
        self.last_count = count;
        self.last_sample = now;
        Some(self.fps)
    }

    /// Sample against the wall clock.
    pub fn poll(&mut self) -> Option<f32> {
        self.sample(Instant::now())
    }

    /// Most recent FPS value (0 until the first window completes).
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Total frames observed on the shared counter.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.counter.get()
    }
}
