//! A single seeded PRNG threaded explicitly through the CSP tie-breaks and
//! every GGA stochastic operator, so a run is reproducible given the same
//! seed. Never reach for `rand::thread_rng()` anywhere in this crate.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct PlannerRng(ChaCha8Rng);

impl PlannerRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn gen_range(&mut self, range: std::ops::Range<usize>) -> usize {
        self.0.gen_range(range)
    }

    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.0.gen_bool(probability.clamp(0.0, 1.0))
    }

    pub fn gen_f64(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.gen_range(0..items.len());
        items.get(idx)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        use rand::seq::SliceRandom;
        items.shuffle(&mut self.0);
    }
}
