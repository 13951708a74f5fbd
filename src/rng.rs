use rand::{rngs::StdRng, Rng, SeedableRng};

/// Byte source for `Cxkk`.
pub trait RandomSource {
    fn next_byte(&mut self) -> u8;
}

/// Deterministic generator: the same seed yields the same byte sequence.
#[derive(Debug, Clone)]
pub struct SeededRng {
    rng: StdRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRng {
    fn next_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_bytes() {
        let (mut a, mut b) = (SeededRng::new(42), SeededRng::new(42));
        let a: Vec<u8> = (0..64).map(|_| a.next_byte()).collect();
        let b: Vec<u8> = (0..64).map(|_| b.next_byte()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let (mut a, mut b) = (SeededRng::new(1), SeededRng::new(2));
        let a: Vec<u8> = (0..64).map(|_| a.next_byte()).collect();
        let b: Vec<u8> = (0..64).map(|_| b.next_byte()).collect();
        assert_ne!(a, b);
    }
}
