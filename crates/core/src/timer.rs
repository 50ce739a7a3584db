//! Wall-clock timer driving time-based animation.

use std::time::{Duration, Instant};

/// Measures elapsed time since construction.
///
/// The renderer derives the quad's rotation angle from the total elapsed
/// time, so the timer is created once at startup and never reset mid-run.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Get the elapsed time in seconds since the timer was created.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_monotonic() {
        let timer = Timer::new();
        let first = timer.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        let second = timer.elapsed();
        assert!(second >= first + Duration::from_millis(5));
    }

    #[test]
    fn elapsed_secs_matches_elapsed() {
        let timer = Timer::new();
        assert!(timer.elapsed_secs() >= 0.0);
        assert!(timer.elapsed_secs() < 1.0);
    }
}
