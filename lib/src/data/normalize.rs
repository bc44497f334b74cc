use tracing::info;

use super::{NormalizedDataset, TrainingExample, INPUT_DIMENSION, NORMALIZED_WINDOW};

/// Min-max scales the trailing `NORMALIZED_WINDOW` features of every
/// example to [0, 1]. A column with a single distinct value maps to 0.0.
/// The genre flags ahead of the window pass through untouched.
pub fn normalize(mut examples: Vec<TrainingExample>) -> NormalizedDataset {
  let base = INPUT_DIMENSION - NORMALIZED_WINDOW;
  let mut mins = [f32::INFINITY; NORMALIZED_WINDOW];
  let mut maxs = [f32::NEG_INFINITY; NORMALIZED_WINDOW];

  for example in examples.iter() {
    for i in 0..NORMALIZED_WINDOW {
      mins[i] = f32::min(mins[i], example.features[base + i]);
      maxs[i] = f32::max(maxs[i], example.features[base + i]);
    }
  }
  if examples.is_empty() {
    mins = [0.0; NORMALIZED_WINDOW];
    maxs = [0.0; NORMALIZED_WINDOW];
  }

  for example in examples.iter_mut() {
    for i in 0..NORMALIZED_WINDOW {
      let value = &mut example.features[base + i];
      *value = if maxs[i] > mins[i] {
        (*value - mins[i]) / (maxs[i] - mins[i])
      } else {
        0.0
      };
    }
  }
  info!(
    "scaled the trailing {} features of {} examples to [0, 1]",
    NORMALIZED_WINDOW,
    examples.len()
  );
  NormalizedDataset {
    examples,
    mins,
    maxs,
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn example(features: Vec<f32>) -> TrainingExample {
    TrainingExample {
      movie_id: 0,
      user_id: 0,
      score: [3.0],
      features,
    }
  }

  #[test]
  fn scales_trailing_window_to_unit_interval() {
    let base = INPUT_DIMENSION - NORMALIZED_WINDOW;
    let mut low = vec![1.0; INPUT_DIMENSION];
    let mut high = vec![1.0; INPUT_DIMENSION];
    for i in base..INPUT_DIMENSION {
      low[i] = 10.0;
      high[i] = 30.0;
    }
    let mut mid = low.clone();
    mid[base] = 15.0;

    let dataset = normalize(vec![example(low), example(mid), example(high)]);
    assert_eq!(dataset.mins[0], 10.0);
    assert_eq!(dataset.maxs[0], 30.0);
    assert_eq!(dataset.examples[0].features[base], 0.0);
    assert_eq!(dataset.examples[1].features[base], 0.25);
    assert_eq!(dataset.examples[2].features[base], 1.0);
    // flags ahead of the window stay raw
    assert_eq!(dataset.examples[0].features[0], 1.0);
  }

  #[test]
  fn constant_column_maps_to_zero() {
    let features = vec![5.0; INPUT_DIMENSION];
    let dataset = normalize(vec![example(features.clone()), example(features)]);
    let base = INPUT_DIMENSION - NORMALIZED_WINDOW;
    for ex in &dataset.examples {
      assert_eq!(ex.features[base], 0.0);
    }
    assert_eq!(dataset.mins[0], 5.0);
    assert_eq!(dataset.maxs[0], 5.0);
  }

  #[test]
  fn empty_dataset_yields_zero_bounds() {
    let dataset = normalize(Vec::new());
    assert!(dataset.examples.is_empty());
    assert_eq!(dataset.mins, [0.0; NORMALIZED_WINDOW]);
    assert_eq!(dataset.maxs, [0.0; NORMALIZED_WINDOW]);
  }

  proptest! {
    #[test]
    fn normalized_values_stay_in_bounds(
      rows in prop::collection::vec(
        prop::collection::vec(-1e6f32..1e6, INPUT_DIMENSION),
        1..40,
      )
    ) {
      let prefix: Vec<Vec<f32>> = rows
        .iter()
        .map(|row| row[..INPUT_DIMENSION - NORMALIZED_WINDOW].to_vec())
        .collect();
      let dataset = normalize(rows.into_iter().map(example).collect());
      let base = INPUT_DIMENSION - NORMALIZED_WINDOW;
      for (ex, before) in dataset.examples.iter().zip(prefix.iter()) {
        prop_assert_eq!(&ex.features[..base], before.as_slice());
        for value in &ex.features[base..] {
          prop_assert!((0.0..=1.0).contains(value));
        }
      }
    }
  }
}
