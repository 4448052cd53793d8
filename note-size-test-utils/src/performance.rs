//! Timing helper for cache hit-path tests

use std::time::{Duration, Instant};

/// Outcome of a timed loop
#[derive(Debug, Clone, Copy)]
pub struct TimedRun {
    pub iterations: usize,
    pub elapsed: Duration,
}

impl TimedRun {
    /// Average time per iteration
    pub fn per_iteration(&self) -> Duration {
        if self.iterations == 0 {
            return Duration::ZERO;
        }
        self.elapsed / self.iterations as u32
    }
}

/// Run `f` `iterations` times and measure the whole loop
pub fn time_iterations<F>(iterations: usize, mut f: F) -> TimedRun
where
    F: FnMut(),
{
    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    TimedRun {
        iterations,
        elapsed: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_iterations_counts_calls() {
        let mut calls = 0;
        let run = time_iterations(10, || calls += 1);
        assert_eq!(calls, 10);
        assert_eq!(run.iterations, 10);
        assert!(run.per_iteration() <= run.elapsed);
    }

    #[test]
    fn test_zero_iterations() {
        let run = time_iterations(0, || {});
        assert_eq!(run.per_iteration(), Duration::ZERO);
    }
}
