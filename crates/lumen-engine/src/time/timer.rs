use std::time::{Duration, Instant};

/// Stopwatch measuring time since `start`/`reset`.
#[derive(Debug, Copy, Clone)]
pub struct Timer {
    started: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

impl Timer {
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }

    pub fn reset(&mut self) {
        self.started = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Returns the elapsed time and restarts the timer.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let lap = now.saturating_duration_since(self.started);
        self.started = now;
        lap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_grows_and_reset_restarts() {
        let mut t = Timer::start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(t.elapsed() >= Duration::from_millis(5));
        assert!(t.elapsed_millis() >= 5.0);

        let before = t.elapsed();
        t.reset();
        assert!(t.elapsed() < before);
    }

    #[test]
    fn lap_restarts() {
        let mut t = Timer::start();
        std::thread::sleep(Duration::from_millis(2));
        let lap = t.lap();
        assert!(lap >= Duration::from_millis(2));
    }
}
