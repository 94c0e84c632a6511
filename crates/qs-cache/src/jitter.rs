//! TTL jitter.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const MIN_TTL: Duration = Duration::from_secs(1);

/// Spreads TTLs uniformly around their base value.
///
/// For a base `B` and ratio `r`, [`TtlJitter::apply`] returns a duration in
/// `[B·(1-r), B·(1+r)]`, never below one second.
#[derive(Debug)]
pub struct TtlJitter {
    ratio: f64,
    rng: Mutex<StdRng>,
}

impl TtlJitter {
    /// Creates a jitter source seeded from the OS.
    #[must_use]
    pub fn new(ratio: f64) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Creates a deterministic jitter source.
    #[must_use]
    pub fn with_seed(ratio: f64, seed: u64) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Returns the configured ratio.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Returns `base` shifted by a random offset of at most `base * ratio`.
    #[must_use]
    pub fn apply(&self, base: Duration) -> Duration {
        let base_secs = base.as_secs_f64();
        if self.ratio <= 0.0 || base_secs <= 0.0 {
            return base.max(MIN_TTL);
        }

        let delta = base_secs * self.ratio;
        let offset = self.rng.lock().random_range(-delta..=delta);
        Duration::from_secs_f64((base_secs + offset).max(MIN_TTL.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_samples_stay_within_bounds() {
        let jitter = TtlJitter::new(0.1);
        let base = Duration::from_secs(600);
        let mut seen = HashSet::new();

        for _ in 0..1000 {
            let ttl = jitter.apply(base);
            assert!(ttl >= Duration::from_secs(540), "{ttl:?} below bound");
            assert!(ttl <= Duration::from_secs(660), "{ttl:?} above bound");
            seen.insert(ttl);
        }

        assert!(seen.len() > 1, "jittered TTL never varied");
    }

    #[test]
    fn test_zero_ratio_is_identity() {
        let jitter = TtlJitter::new(0.0);
        assert_eq!(jitter.apply(Duration::from_secs(300)), Duration::from_secs(300));
    }

    #[test]
    fn test_floor_of_one_second() {
        let jitter = TtlJitter::new(1.0);
        for _ in 0..1000 {
            assert!(jitter.apply(Duration::from_secs(1)) >= MIN_TTL);
        }
        assert_eq!(TtlJitter::new(0.5).apply(Duration::ZERO), MIN_TTL);
    }

    #[test]
    fn test_seeded_sources_agree() {
        let a = TtlJitter::with_seed(0.2, 7);
        let b = TtlJitter::with_seed(0.2, 7);
        let base = Duration::from_secs(3600);
        for _ in 0..10 {
            assert_eq!(a.apply(base), b.apply(base));
        }
    }
}
