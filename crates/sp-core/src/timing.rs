//! Lightweight wall-clock timing for solver runs.
//!
//! Disabled by default. Enable with the `SP_TIMING` environment variable or
//! programmatically through [`enable_timing`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable performance timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("SP_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer and log the result at info level if enabled.
    pub fn stop_and_log(self) -> Option<f64> {
        let label = self.label;
        let elapsed = self.stop();
        if let Some(secs) = elapsed {
            tracing::info!(target: "sp_timing", label, elapsed_s = secs, "solver execution time");
        }
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_timer_reports_elapsed() {
        enable_timing();
        let timer = Timer::start("unit");
        assert_eq!(timer.label(), "unit");
        let elapsed = timer.stop_and_log();
        assert!(elapsed.is_some_and(|s| s >= 0.0));
    }
}
