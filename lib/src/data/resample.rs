use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use super::TrainingExample;

/// Sampling factor for a rating bucket. Ratings in this corpus pile up on
/// 4 stars; the low buckets get duplicated and the 4s get halved so the
/// model sees a flatter score distribution.
pub fn bucket_factor(score: f32) -> f32 {
  if score <= 1.5 {
    4.0
  } else if score <= 2.5 {
    2.0
  } else if score <= 3.5 {
    1.0
  } else if score <= 4.5 {
    0.5
  } else {
    1.0
  }
}

/// Applies `bucket_factor` to every example: the integer part duplicates
/// exactly, the fractional part keeps one more copy with that probability.
/// The result is shuffled so duplicates do not train back to back.
pub fn resample(examples: Vec<TrainingExample>, rng: &mut StdRng) -> Vec<TrainingExample> {
  let before = examples.len();
  let mut out = Vec::with_capacity(before);
  for example in examples {
    let factor = bucket_factor(example.score[0]);
    let copies = factor.trunc() as usize;
    let extra = rng.gen::<f32>() < factor.fract();
    for _ in 0..copies {
      out.push(example.clone());
    }
    if extra {
      out.push(example);
    }
  }
  out.shuffle(rng);
  info!("resampled the dataset from {} to {} examples", before, out.len());
  out
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use rand::SeedableRng;

  use super::*;
  use crate::data::INPUT_DIMENSION;

  fn example(id: u32, score: f32) -> TrainingExample {
    TrainingExample {
      movie_id: id,
      user_id: 0,
      score: [score],
      features: vec![0.0; INPUT_DIMENSION],
    }
  }

  #[test]
  fn factors_follow_the_rating_buckets() {
    assert_eq!(bucket_factor(1.0), 4.0);
    assert_eq!(bucket_factor(1.5), 4.0);
    assert_eq!(bucket_factor(2.0), 2.0);
    assert_eq!(bucket_factor(3.0), 1.0);
    assert_eq!(bucket_factor(4.0), 0.5);
    assert_eq!(bucket_factor(5.0), 1.0);
  }

  #[test]
  fn integer_factors_duplicate_exactly() {
    let examples: Vec<_> = (0..10).map(|id| example(id, 1.0)).collect();
    let mut rng = StdRng::seed_from_u64(7);
    let out = resample(examples, &mut rng);
    assert_eq!(out.len(), 40);
    for id in 0..10 {
      assert_eq!(out.iter().filter(|e| e.movie_id == id).count(), 4);
    }
  }

  #[test]
  fn unit_factor_preserves_the_multiset() {
    let examples: Vec<_> = (0..20).map(|id| example(id, 3.0)).collect();
    let mut rng = StdRng::seed_from_u64(7);
    let out = resample(examples, &mut rng);
    let mut ids: Vec<u32> = out.iter().map(|e| e.movie_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..20).collect::<Vec<u32>>());
  }

  #[test]
  fn half_factor_keeps_roughly_half() {
    let examples: Vec<_> = (0..1000).map(|id| example(id, 4.0)).collect();
    let mut rng = StdRng::seed_from_u64(7);
    let out = resample(examples, &mut rng);
    assert!(out.len() > 400 && out.len() < 600, "kept {}", out.len());
    // a kept example appears once, never twice
    for id in 0..1000 {
      assert!(out.iter().filter(|e| e.movie_id == id).count() <= 1);
    }
  }

  #[test]
  fn same_seed_same_dataset() {
    let examples: Vec<_> = (0..50)
      .map(|id| example(id, 1.0 + (id % 5) as f32))
      .collect();
    let mut a = StdRng::seed_from_u64(42);
    let mut b = StdRng::seed_from_u64(42);
    let out_a = resample(examples.clone(), &mut a);
    let out_b = resample(examples, &mut b);
    assert_eq!(out_a, out_b);
  }

  proptest! {
    #[test]
    fn per_example_copy_counts_follow_the_factor(
      scores in prop::collection::vec(0.5f32..5.5, 1..30),
      seed in 0u64..1000,
    ) {
      let examples: Vec<_> = scores
        .iter()
        .enumerate()
        .map(|(id, score)| example(id as u32, *score))
        .collect();
      let mut rng = StdRng::seed_from_u64(seed);
      let out = resample(examples, &mut rng);
      for (id, score) in scores.iter().enumerate() {
        let factor = bucket_factor(*score);
        let trunc = factor.trunc() as usize;
        let count = out.iter().filter(|e| e.movie_id == id as u32).count();
        if factor.fract() == 0.0 {
          prop_assert_eq!(count, trunc);
        } else {
          prop_assert!(
            count == trunc || count == trunc + 1,
            "score {} with factor {} produced {} copies", score, factor, count
          );
        }
      }
    }
  }
}
