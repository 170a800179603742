//! Injectable randomness
//!
//! Every random choice a run makes (trip gaps, flight choice, synthetic
//! purchaser) goes through a [`Randomizer`] owned by that run, so a seed fully
//! determines the run.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::ops::RangeInclusive;

use crate::{Error, Result};

/// Uniform picker over an injected random source
#[derive(Debug, Clone)]
pub struct Randomizer<R: RngCore = StdRng> {
    rng: R,
}

impl Randomizer<StdRng> {
    /// Deterministic randomizer for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Randomizer seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: RngCore> Randomizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniformly random index into a sequence of `len` elements
    pub fn pick_index(&mut self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(Error::EmptySequence);
        }
        Ok(self.rng.gen_range(0..len))
    }

    /// Uniformly random element of `items`
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T> {
        let index = self.pick_index(items.len())?;
        Ok(&items[index])
    }

    /// Uniformly random value in an inclusive range
    pub fn in_range(&mut self, range: RangeInclusive<u64>) -> Result<u64> {
        if range.is_empty() {
            return Err(Error::EmptySequence);
        }
        Ok(self.rng.gen_range(range))
    }

    /// String of `len` random decimal digits
    pub fn digits(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect()
    }

    /// Fresh seed for a child randomizer
    pub fn fork_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_element_always_returned() {
        let mut random = Randomizer::from_entropy();
        for _ in 0..50 {
            assert_eq!(*random.pick(&["only"]).unwrap(), "only");
        }
    }

    #[test]
    fn test_empty_sequence() {
        let mut random = Randomizer::seeded(7);
        let empty: [u8; 0] = [];
        assert!(matches!(random.pick(&empty), Err(Error::EmptySequence)));
        assert!(matches!(random.pick_index(0), Err(Error::EmptySequence)));
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 5..=4;
        assert!(matches!(random.in_range(reversed), Err(Error::EmptySequence)));
    }

    #[test]
    fn test_same_seed_same_choices() {
        let items: Vec<u32> = (0..100).collect();
        let mut a = Randomizer::seeded(42);
        let mut b = Randomizer::seeded(42);
        let left: Vec<u32> = (0..20).map(|_| *a.pick(&items).unwrap()).collect();
        let right: Vec<u32> = (0..20).map(|_| *b.pick(&items).unwrap()).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn test_picks_cover_sequence() {
        let items = ["a", "b", "c"];
        let mut random = Randomizer::seeded(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(*random.pick(&items).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_injected_source() {
        // a zero-stepping source only ever yields 0, so the first element wins
        let mut random = Randomizer::new(rand::rngs::mock::StepRng::new(0, 0));
        assert_eq!(*random.pick(&[10, 20, 30]).unwrap(), 10);
    }

    #[test]
    fn test_digits_and_range() {
        let mut random = Randomizer::seeded(11);
        let card = random.digits(15);
        assert_eq!(card.len(), 15);
        assert!(card.chars().all(|c| c.is_ascii_digit()));

        for _ in 0..100 {
            let zip = random.in_range(10_000..=99_999).unwrap();
            assert!((10_000..=99_999).contains(&zip));
        }
    }
}
