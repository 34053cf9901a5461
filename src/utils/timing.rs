//! Timing utilities for measuring and formatting durations

use std::time::{Duration, Instant};

/// A simple timer for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new timer that starts immediately
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration since the timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Format a duration as `< 1ms`, `456ms` or `1.23s`
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();

    if millis == 0 {
        "< 1ms".to_string()
    } else if millis >= 1000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", millis)
    }
}

/// Time spent on one controls file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsTiming {
    pub id: String,
    /// Number of checks that were run
    pub checks: usize,
    pub duration: Duration,
}

/// Timing of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTiming {
    pub controls: Vec<ControlsTiming>,
    pub total: Duration,
}

impl RunTiming {
    pub fn add(&mut self, id: impl Into<String>, checks: usize, duration: Duration) {
        self.controls.push(ControlsTiming {
            id: id.into(),
            checks,
            duration,
        });
    }

    pub fn total_formatted(&self) -> String {
        format_duration(self.total)
    }
}
