//! Tie-break randomness.

use rand::Rng;

/// Source of uniform choices for scheduling tie-breaks.
///
/// Every `rand::Rng` is a source, so `StdRng::seed_from_u64` gives reproducible
/// schedules. [`SequenceSource`] scripts exact choices for tests.
pub trait RandomSource {
    /// Uniform index in `0..len`. `len` is never 0.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform element of a non-empty slice.
    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            return None;
        }
        items.get(self.pick_index(items.len()))
    }
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn pick_index(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

/// Replays a fixed list of indices, wrapping around; out-of-range entries
/// are reduced modulo the requested length.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    picks: Vec<usize>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(picks: Vec<usize>) -> Self {
        Self { picks, cursor: 0 }
    }

    /// Always picks the first candidate.
    pub fn first() -> Self {
        Self::new(vec![0])
    }

    /// Number of picks drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceSource {
    fn pick_index(&mut self, len: usize) -> usize {
        let pick = if self.picks.is_empty() {
            0
        } else {
            self.picks[self.cursor % self.picks.len()]
        };
        self.cursor += 1;
        pick % len.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sequence_source_replays() {
        let mut source = SequenceSource::new(vec![2, 0, 5]);
        assert_eq!(source.pick_index(4), 2);
        assert_eq!(source.pick_index(4), 0);
        assert_eq!(source.pick_index(4), 1);
        assert_eq!(source.pick_index(4), 2);
        assert_eq!(source.draws(), 4);
    }

    #[test]
    fn test_choose_empty() {
        let mut source = SequenceSource::first();
        let empty: [u8; 0] = [];
        assert_eq!(source.choose(&empty), None);
        assert_eq!(source.choose(&[7, 8]), Some(&7));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let picks_a: Vec<usize> = (0..10).map(|_| a.pick_index(7)).collect();
        let picks_b: Vec<usize> = (0..10).map(|_| b.pick_index(7)).collect();
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|&i| i < 7));
    }
}
