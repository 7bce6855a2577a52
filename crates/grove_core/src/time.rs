//! Frame clock feeding the per-frame callback `(elapsed_ms, delta_ms)`.
//!
//! The simulation runs on a **variable** timestep: every consumer receives the
//! real delta of the frame in milliseconds and is responsible for being
//! frame-rate independent (the camera uses exponential smoothing, the player
//! scales by delta). Two ways to produce ticks:
//!
//! - `begin_frame()` measures wall-clock time with `Instant` (interactive use).
//! - `advance(delta_ms)` injects a delta (replays, tests, headless runs).
//!
//! Both paths apply the same spiral-of-death cap and FPS smoothing.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;
const DEFAULT_MAX_DELTA_MS: f64 = 250.0;

/// One frame's timing, handed to every consumer in the frame sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub elapsed_ms: f64,
    pub delta_ms: f64,
}

pub struct FrameClock {
    pub max_delta_ms: f64,
    pub elapsed_ms: f64,
    pub delta_ms: f64,
    pub frame_count: u64,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            max_delta_ms: DEFAULT_MAX_DELTA_MS,
            elapsed_ms: 0.0,
            delta_ms: 0.0,
            frame_count: 0,
            last_instant: Instant::now(),
            fps_samples: [1000.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    pub fn with_max_delta(max_delta_ms: f64) -> Self {
        Self {
            max_delta_ms: max_delta_ms.max(1.0),
            ..Self::new()
        }
    }

    /// Measure the wall-clock delta since the previous frame.
    pub fn begin_frame(&mut self) -> FrameTick {
        let now = Instant::now();
        let measured = now.duration_since(self.last_instant).as_secs_f64() * 1000.0;
        self.last_instant = now;
        self.advance(measured)
    }

    /// Advance by an externally supplied delta.
    pub fn advance(&mut self, delta_ms: f64) -> FrameTick {
        let mut delta = if delta_ms.is_finite() {
            delta_ms.max(0.0)
        } else {
            0.0
        };

        // Spiral-of-death cap
        if delta > self.max_delta_ms {
            log::warn!(
                "Frame took {:.1}ms, capping delta to {}ms",
                delta,
                self.max_delta_ms
            );
            delta = self.max_delta_ms;
        }

        self.delta_ms = delta;
        self.elapsed_ms += delta;
        self.frame_count += 1;

        // FPS smoothing
        self.fps_samples[self.fps_sample_index] = delta;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_ms: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_ms;
        self.smoothed_fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };

        self.tick()
    }

    pub fn tick(&self) -> FrameTick {
        FrameTick {
            elapsed_ms: self.elapsed_ms,
            delta_ms: self.delta_ms,
        }
    }

    /// Reset the wall-clock reference, e.g. after the loop was suspended.
    pub fn resync(&mut self) {
        self.last_instant = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_elapsed() {
        let mut clock = FrameClock::new();
        clock.advance(16.0);
        let tick = clock.advance(20.0);
        assert_eq!(tick.delta_ms, 20.0);
        assert_eq!(tick.elapsed_ms, 36.0);
        assert_eq!(clock.frame_count, 2);
    }

    #[test]
    fn advance_caps_large_delta() {
        let mut clock = FrameClock::with_max_delta(100.0);
        let tick = clock.advance(1000.0);
        assert_eq!(tick.delta_ms, 100.0);
        assert_eq!(tick.elapsed_ms, 100.0);
    }

    #[test]
    fn advance_rejects_negative_and_nan() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(-5.0).delta_ms, 0.0);
        assert_eq!(clock.advance(f64::NAN).delta_ms, 0.0);
        assert_eq!(clock.elapsed_ms, 0.0);
    }

    #[test]
    fn begin_frame_measures_wall_clock() {
        let mut clock = FrameClock::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let first = clock.begin_frame();
        assert!(first.delta_ms >= 5.0, "{}", first.delta_ms);
        assert!(first.delta_ms <= clock.max_delta_ms);

        clock.resync();
        let second = clock.begin_frame();
        assert!(second.delta_ms >= 0.0);
        assert_eq!(second.elapsed_ms, first.delta_ms + second.delta_ms);
        assert_eq!(clock.frame_count, 2);
    }

    #[test]
    fn smoothed_fps_converges_to_steady_rate() {
        let mut clock = FrameClock::new();
        for _ in 0..FPS_SAMPLE_COUNT {
            clock.advance(10.0);
        }
        assert!((clock.smoothed_fps - 100.0).abs() < 1e-6);
        assert!((clock.smoothed_frame_time_ms - 10.0).abs() < 1e-9);
    }
}
