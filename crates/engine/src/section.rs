// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Critical-section body that holds the resource for a random while

use rand::Rng;
use std::time::Duration;

/// Holds the section for a duration drawn uniformly from `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldSection {
    min: Duration,
    max: Duration,
}

impl HoldSection {
    /// Bounds are reordered if given backwards
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw the next hold duration
    pub fn pick(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }

    /// Sleep for a freshly drawn duration and report it
    pub async fn hold(&self) -> Duration {
        let duration = self.pick();
        tokio::time::sleep(duration).await;
        duration
    }
}

impl Default for HoldSection {
    fn default() -> Self {
        Self::new(Duration::from_millis(10), Duration::from_millis(50))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_within_bounds() {
        let section = HoldSection::new(Duration::from_millis(5), Duration::from_millis(9));
        for _ in 0..200 {
            let d = section.pick();
            assert!(d >= Duration::from_millis(5) && d <= Duration::from_millis(9));
        }
    }

    #[test]
    fn backwards_bounds_are_reordered() {
        let section = HoldSection::new(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(section.min(), Duration::from_secs(1));
        assert_eq!(section.max(), Duration::from_secs(2));
    }

    #[test]
    fn zero_width_range_is_exact() {
        let section = HoldSection::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(section.pick(), Duration::ZERO);
    }

    #[tokio::test]
    async fn hold_sleeps_for_the_picked_duration() {
        let section = HoldSection::new(Duration::from_millis(15), Duration::from_millis(15));
        let start = tokio::time::Instant::now();
        let held = section.hold().await;
        assert_eq!(held, Duration::from_millis(15));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
