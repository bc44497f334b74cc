use serde::{Deserialize, Serialize};

/// Width of one training example: the movie features from the store minus
/// the externally supplied tail, with the three user values appended in
/// its place.
pub const INPUT_DIMENSION: usize = 15;

/// Trailing features of the store that are per-request values, not movie
/// document fields. Bulk extraction runs without user context, so these
/// come back as 0.0 and the assembler swaps in the rating user's values.
pub const EXTERNAL_FEATURES: usize = 3;

/// Trailing window of the example vector that gets min-max scaled. It
/// covers every non-binary feature; the genre flags ahead of it stay raw.
pub const NORMALIZED_WINDOW: usize = 8;

pub type InputsVec = Vec<[f32; INPUT_DIMENSION]>;
pub type OutputsVec = Vec<f32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id: u32,
  /// 0.0 = M, 1.0 = F.
  pub gender: f32,
  pub age: f32,
  pub occupation: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
  pub user_id: u32,
  pub movie_id: u32,
  pub rating: f32,
}

/// One document's computed feature vector under a feature store, in the
/// store's declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieFeatureVector {
  pub db_id: String,
  pub features: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
  pub movie_id: u32,
  pub user_id: u32,
  pub score: [f32; 1],
  pub features: Vec<f32>,
}

/// Examples with the trailing window rescaled to [0, 1], plus the column
/// bounds the rescale used. The exporter turns the bounds into
/// engine-side normalizers so query-time inputs match training inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDataset {
  pub examples: Vec<TrainingExample>,
  pub mins: [f32; NORMALIZED_WINDOW],
  pub maxs: [f32; NORMALIZED_WINDOW],
}
