//! Stimulus sources: procedural generation and static banks.
//!
//! The remote-per-trial sources live in `earlyedge-clients`, implemented on
//! the service clients themselves.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::StimulusError;
use crate::model::{ArithmeticQuestion, Category, Stimulus};
use crate::traits::StimulusSource;

/// Round to two decimals, as the division answers are displayed.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Synthesize one arithmetic question for the given category.
///
/// Operands are 1..=10. The distractor differs from the correct answer by a
/// random offset of ±1..=3 and is never equal to it.
pub fn generate_arithmetic(rng: &mut impl Rng, category: Category) -> ArithmeticQuestion {
    let op1 = rng.gen_range(1..=10);
    let op2 = rng.gen_range(1..=10);

    let correct = match category {
        Category::Addition => (op1 + op2) as f64,
        Category::Subtraction => (op1 - op2) as f64,
        Category::Multiplication => (op1 * op2) as f64,
        Category::Division => round2(op1 as f64 / op2 as f64),
    };

    let sign = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
    let offset = sign * rng.gen_range(1..=3) as f64;
    let distractor = match category {
        Category::Division => round2(correct + offset),
        _ => correct + offset,
    };
    debug_assert!((distractor - correct).abs() > f64::EPSILON);

    ArithmeticQuestion {
        op1,
        op2,
        category,
        correct,
        distractor,
    }
}

/// Procedural arithmetic source backed by a seedable RNG.
pub struct ProceduralArithmetic {
    rng: StdRng,
}

impl ProceduralArithmetic {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic source for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ProceduralArithmetic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StimulusSource for ProceduralArithmetic {
    async fn next(
        &mut self,
        category: Option<Category>,
    ) -> Result<Option<Stimulus>, StimulusError> {
        let category = category.unwrap_or(Category::Addition);
        Ok(Some(Stimulus::Arithmetic(generate_arithmetic(
            &mut self.rng,
            category,
        ))))
    }
}

/// A fixed ordered list of stimuli, stepped through by index.
///
/// Exhausting the list ends the session early regardless of the configured
/// trial count.
pub struct StaticBank {
    items: Vec<Stimulus>,
    cursor: usize,
}

impl StaticBank {
    pub fn new(items: Vec<Stimulus>) -> Self {
        Self { items, cursor: 0 }
    }

    /// The built-in letter-tracing sequence: A–Z then a–z.
    pub fn letter_tracing() -> Self {
        let items = ('A'..='Z')
            .chain('a'..='z')
            .map(|letter| Stimulus::LetterTracing { letter })
            .collect();
        Self::new(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.cursor)
    }
}

#[async_trait]
impl StimulusSource for StaticBank {
    async fn next(
        &mut self,
        _category: Option<Category>,
    ) -> Result<Option<Stimulus>, StimulusError> {
        let item = self.items.get(self.cursor).cloned();
        if item.is_some() {
            self.cursor += 1;
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distractor_never_equals_correct() {
        let mut rng = StdRng::seed_from_u64(7);
        for category in [
            Category::Addition,
            Category::Subtraction,
            Category::Multiplication,
            Category::Division,
        ] {
            for _ in 0..1000 {
                let q = generate_arithmetic(&mut rng, category);
                assert!(
                    (q.distractor - q.correct).abs() > f64::EPSILON,
                    "distractor equals correct for {q:?}"
                );
            }
        }
    }

    #[test]
    fn operands_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let q = generate_arithmetic(&mut rng, Category::Multiplication);
            assert!((1..=10).contains(&q.op1));
            assert!((1..=10).contains(&q.op2));
            assert_eq!(q.correct, (q.op1 * q.op2) as f64);
        }
    }

    #[test]
    fn division_answers_are_rounded() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..500 {
            let q = generate_arithmetic(&mut rng, Category::Division);
            assert_eq!(q.correct, round2(q.correct));
            assert_eq!(q.distractor, round2(q.distractor));
        }
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let qa = generate_arithmetic(&mut a, Category::Addition);
        let qb = generate_arithmetic(&mut b, Category::Addition);
        assert_eq!(qa, qb);
    }

    #[tokio::test]
    async fn static_bank_exhausts_to_none() {
        let mut bank = StaticBank::new(vec![
            Stimulus::LetterTracing { letter: 'A' },
            Stimulus::LetterTracing { letter: 'B' },
        ]);
        assert!(bank.next(None).await.unwrap().is_some());
        assert!(bank.next(None).await.unwrap().is_some());
        assert!(bank.next(None).await.unwrap().is_none());
        assert!(bank.next(None).await.unwrap().is_none());
    }

    #[test]
    fn letter_tracing_bank_covers_both_cases() {
        let bank = StaticBank::letter_tracing();
        assert_eq!(bank.len(), 52);
    }

    #[tokio::test]
    async fn procedural_source_respects_category() {
        let mut source = ProceduralArithmetic::seeded(3);
        let stim = source
            .next(Some(Category::Subtraction))
            .await
            .unwrap()
            .unwrap();
        match stim {
            Stimulus::Arithmetic(q) => assert_eq!(q.category, Category::Subtraction),
            other => panic!("unexpected stimulus: {other:?}"),
        }
    }
}
