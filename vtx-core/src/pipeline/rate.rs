//! Frame pacing and arrival-rate measurement.
//!
//! [`FrameRateGovernor`] holds a caller's loop at a target rate,
//! independent of however the transport clocks itself.
//! [`ReceiveRateEstimator`] measures the rate frames actually arrive
//! at — the two are deliberately separate: one shapes time, the other
//! observes it.

use std::time::{Duration, Instant};

// ── Timer resolution guard ───────────────────────────────────────

/// Scoped request for fine OS timer resolution.
///
/// Windows sleeps are quantised to the multimedia timer period
/// (~15.6 ms by default), far too coarse for frame pacing. The guard
/// requests a 1 ms period for exactly the duration of one wait and
/// restores the previous state on drop — a per-call acquire/release of
/// the process-wide resource, never held across cycles.
struct TimerResolutionGuard;

#[cfg(target_os = "windows")]
impl TimerResolutionGuard {
    fn acquire() -> Self {
        unsafe {
            let _ = windows::Win32::Media::timeBeginPeriod(1);
        }
        Self
    }
}

#[cfg(target_os = "windows")]
impl Drop for TimerResolutionGuard {
    fn drop(&mut self) {
        unsafe {
            let _ = windows::Win32::Media::timeEndPeriod(1);
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl TimerResolutionGuard {
    /// Non-Windows sleeps are already millisecond-accurate.
    fn acquire() -> Self {
        Self
    }
}

// ── FrameRateGovernor ────────────────────────────────────────────

/// Per-cycle sleep that holds a loop at a target frame rate.
///
/// Call [`hold`](Self::hold) once per cycle, after the cycle's work.
/// A cycle that already ran longer than the target interval returns
/// immediately — no busy-wait, and no attempt to repay the backlog on
/// later cycles.
pub struct FrameRateGovernor {
    last: Option<Instant>,
}

impl FrameRateGovernor {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Sleep until the target interval since the previous call has
    /// elapsed, if it has not already.
    pub fn hold(&mut self, target_fps: f64) {
        if target_fps > 0.0 {
            if let Some(wait) = self.sleep_needed(Instant::now(), target_fps) {
                let _resolution = TimerResolutionGuard::acquire();
                std::thread::sleep(wait);
            }
        }
        self.last = Some(Instant::now());
    }

    /// Forget the previous cycle (after a long pause, so the next
    /// `hold` does not treat the gap as an overrun to sleep against).
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// The pure pacing decision: how long to sleep at `now`, if at
    /// all. The first cycle has no reference point and never sleeps.
    fn sleep_needed(&self, now: Instant, target_fps: f64) -> Option<Duration> {
        let interval = Duration::from_secs_f64(1.0 / target_fps);
        let prev = self.last?;
        let elapsed = now.saturating_duration_since(prev);
        (elapsed < interval).then(|| interval - elapsed)
    }
}

impl Default for FrameRateGovernor {
    fn default() -> Self {
        Self::new()
    }
}

// ── ReceiveRateEstimator ─────────────────────────────────────────

/// Rolling estimate of the observed frame arrival rate.
///
/// Each arrival folds the instantaneous rate into the estimate with a
/// damping factor equal to the measured inter-arrival interval itself
/// (clamped to (0, 1]): steady fast streams adjust gently, while a
/// stall or burst neither spikes nor overshoots the estimate.
pub struct ReceiveRateEstimator {
    fps: f64,
    last: Option<Instant>,
}

impl ReceiveRateEstimator {
    /// Estimator seeded with an expected rate.
    pub fn new(seed_fps: f64) -> Self {
        Self {
            fps: seed_fps.max(0.0),
            last: None,
        }
    }

    /// Record one successfully received frame.
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Record an arrival with an explicit timestamp (useful for
    /// testing).
    pub fn update_at(&mut self, now: Instant) {
        let Some(prev) = self.last.replace(now) else {
            // First arrival: establishes the reference point only.
            return;
        };
        let dt = now.saturating_duration_since(prev).as_secs_f64();
        if dt <= 0.0 {
            return;
        }
        let damping = dt.min(1.0);
        let instantaneous = 1.0 / dt;
        self.fps += (instantaneous - self.fps) * damping;
    }

    /// Current estimate, rounded for display.
    pub fn fps(&self) -> u32 {
        self.fps.round().max(0.0) as u32
    }

    /// Reinitialise after a gap (e.g. a new source connected).
    pub fn reset(&mut self, seed_fps: f64) {
        self.fps = seed_fps.max(0.0);
        self.last = None;
    }
}

// ── Tests ────────────────────────────────────────────────────────
