//! Offline arithmetic provider.

use rand::Rng;

use crate::error::ProviderError;

use super::{Challenge, ChallengeProvider};

/// Generates small addition/subtraction/multiplication puzzles locally.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticProvider;

impl ArithmeticProvider {
    fn generate(rng: &mut impl Rng) -> Challenge {
        let a: i64 = rng.random_range(1..=12);
        let b: i64 = rng.random_range(1..=12);
        match rng.random_range(0..3) {
            0 => Challenge::new(format!("{a} + {b} = ?"), a + b),
            1 => {
                let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
                Challenge::new(format!("{hi} - {lo} = ?"), hi - lo)
            }
            _ => Challenge::new(format!("{a} x {b} = ?"), a * b),
        }
    }
}

#[async_trait::async_trait]
impl ChallengeProvider for ArithmeticProvider {
    async fn fetch_challenges(&self, count: usize) -> Result<Vec<Challenge>, ProviderError> {
        let mut rng = rand::rng();
        Ok((0..count).map(|_| Self::generate(&mut rng)).collect())
    }

    fn name(&self) -> &'static str {
        "arithmetic"
    }
}
