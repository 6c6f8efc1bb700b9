//! Random sampling with an injected random source.

use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffled copy of `items`.
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}

/// Up to `n` items drawn without replacement, in random order.
pub fn sample<T: Clone, R: Rng + ?Sized>(items: &[T], n: usize, rng: &mut R) -> Vec<T> {
    let mut out = shuffled(items, rng);
    out.truncate(n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_without_replacement() {
        let mut rng = StdRng::seed_from_u64(7);
        let items: Vec<u32> = (0..20).collect();

        let mut picked = sample(&items, 5, &mut rng);
        assert_eq!(picked.len(), 5);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 5);
    }

    #[test]
    fn test_sample_larger_than_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut picked = sample(&[3, 1, 2], 10, &mut rng);
        picked.sort_unstable();
        assert_eq!(picked, vec![1, 2, 3]);
    }

    #[test]
    fn test_same_seed_same_order() {
        let items: Vec<u32> = (0..50).collect();
        let a = shuffled(&items, &mut StdRng::seed_from_u64(42));
        let b = shuffled(&items, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
