use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;

/// Seedable random number generator.
///
/// Wraps StdRng to provide deterministic randomness from a seed value. Pattern
/// generators take any [`RngCore`], so passing an `Rng` with a fixed seed makes
/// the random patterns reproducible.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Rng {
    seed: u64,
    #[serde(skip_serializing)]
    rng: StdRng,
}

impl Rng {
    /// Creates a new RNG from a seed value.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed value for deterministic random generation
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a new RNG seeded from the thread-local generator.
    ///
    /// The chosen seed is kept so the run can be replayed with [`Rng::from_seed`].
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// The seed this generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RngCore for Rng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }
}

impl Clone for Rng {
    fn clone(&self) -> Self {
        Self::from_seed(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use crate::util::Rng;
    use rand::RngCore;

    #[test]
    fn test_rng_clone() {
        let mut rng = Rng::from_seed(0x42);
        let a = rng.next_u32();
        let mut cloned_rng = rng.clone();
        let b = cloned_rng.next_u32();
        assert_eq!(a, b, "Cloned Rng should start with the same seed");
    }

    #[test]
    fn test_rng_entropy_seed_replays() {
        let mut rng = Rng::from_entropy();
        let mut replay = Rng::from_seed(rng.seed());
        assert_eq!(rng.next_u64(), replay.next_u64());
    }
}
