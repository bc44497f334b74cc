use std::collections::HashMap;
use std::convert::TryInto;

use tracing::info;

use super::{
  InputsVec, MovieFeatureVector, OutputsVec, Rating, TrainingExample, User, EXTERNAL_FEATURES,
  INPUT_DIMENSION,
};

/// Inner join of ratings x users x extracted movie vectors. A rating whose
/// user or movie is missing on either side is dropped. The movie vector's
/// external tail (zeros from bulk extraction) is replaced by the rating
/// user's gender, age and occupation.
pub fn assemble(
  ratings: &[Rating],
  users: &[User],
  movies: &[MovieFeatureVector],
) -> Vec<TrainingExample> {
  let users: HashMap<u32, &User> = users.iter().map(|u| (u.user_id, u)).collect();
  let movies: HashMap<u32, &MovieFeatureVector> = movies
    .iter()
    .filter_map(|m| m.db_id.parse::<u32>().ok().map(|id| (id, m)))
    .collect();

  let mut examples = Vec::new();
  for rating in ratings {
    let user = match users.get(&rating.user_id) {
      Some(user) => user,
      None => continue,
    };
    let movie = match movies.get(&rating.movie_id) {
      Some(movie) => movie,
      None => continue,
    };
    assert_eq!(
      movie.features.len(),
      INPUT_DIMENSION,
      "movie {} has a feature vector of the wrong width",
      movie.db_id
    );
    let mut features = movie.features[..INPUT_DIMENSION - EXTERNAL_FEATURES].to_vec();
    features.extend_from_slice(&[user.gender, user.age, user.occupation]);
    examples.push(TrainingExample {
      movie_id: rating.movie_id,
      user_id: rating.user_id,
      score: [rating.rating],
      features,
    });
  }
  info!(
    "assembled {} training examples out of {} ratings",
    examples.len(),
    ratings.len()
  );
  examples
}

pub fn to_xy(examples: &[TrainingExample]) -> (InputsVec, OutputsVec) {
  let mut x: InputsVec = Vec::with_capacity(examples.len());
  let mut y: OutputsVec = Vec::with_capacity(examples.len());
  for example in examples {
    let features: [f32; INPUT_DIMENSION] = example
      .features
      .as_slice()
      .try_into()
      .unwrap_or_else(|_| {
        panic!(
          "example for movie {} has {} features, expected {}",
          example.movie_id,
          example.features.len(),
          INPUT_DIMENSION
        )
      });
    x.push(features);
    y.push(example.score[0]);
  }
  (x, y)
}

pub fn split_dataset(
  x: InputsVec,
  y: OutputsVec,
  ratio: f32,
) -> (InputsVec, InputsVec, OutputsVec, OutputsVec) {
  assert_eq!(x.len(), y.len());
  let splitting_point = (x.len() as f32 * ratio) as usize;

  let (x_train, x_test) = x.split_at(splitting_point);
  let (y_train, y_test) = y.split_at(splitting_point);

  (
    x_train.to_vec(),
    x_test.to_vec(),
    y_train.to_vec(),
    y_test.to_vec(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn movie(id: &str) -> MovieFeatureVector {
    let mut features = vec![0.0; INPUT_DIMENSION];
    features[7] = 1995.0;
    MovieFeatureVector {
      db_id: id.to_string(),
      features,
    }
  }

  fn user(id: u32) -> User {
    User {
      user_id: id,
      gender: 1.0,
      age: 24.0,
      occupation: 7.0,
    }
  }

  fn rating(user_id: u32, movie_id: u32, rating: f32) -> Rating {
    Rating {
      user_id,
      movie_id,
      rating,
    }
  }

  #[test]
  fn assemble_replaces_external_tail_with_user_values() {
    let examples = assemble(&[rating(1, 10, 4.0)], &[user(1)], &[movie("10")]);
    assert_eq!(examples.len(), 1);
    let example = &examples[0];
    assert_eq!(example.features.len(), INPUT_DIMENSION);
    assert_eq!(example.features[7], 1995.0);
    assert_eq!(
      &example.features[INPUT_DIMENSION - EXTERNAL_FEATURES..],
      &[1.0, 24.0, 7.0]
    );
    assert_eq!(example.score, [4.0]);
  }

  #[test]
  fn assemble_drops_ratings_without_both_sides() {
    let ratings = vec![
      rating(1, 10, 4.0),
      rating(2, 10, 3.0),  // unknown user
      rating(1, 11, 5.0),  // unextracted movie
    ];
    let examples = assemble(&ratings, &[user(1)], &[movie("10")]);
    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].user_id, 1);
    assert_eq!(examples[0].movie_id, 10);
  }

  #[test]
  fn assemble_skips_movies_with_non_numeric_ids() {
    let examples = assemble(&[rating(1, 10, 4.0)], &[user(1)], &[movie("not-a-number")]);
    assert!(examples.is_empty());
  }

  #[test]
  fn split_respects_ratio() {
    let x: InputsVec = vec![[0.0; INPUT_DIMENSION]; 10];
    let y: OutputsVec = (0..10).map(|v| v as f32).collect();
    let (x_train, x_test, y_train, y_test) = split_dataset(x, y, 0.8);
    assert_eq!(x_train.len(), 8);
    assert_eq!(x_test.len(), 2);
    assert_eq!(y_train.len(), 8);
    assert_eq!(y_test, vec![8.0, 9.0]);
  }

  #[test]
  fn to_xy_preserves_order() {
    let examples = assemble(
      &[rating(1, 10, 4.0), rating(1, 20, 2.0)],
      &[user(1)],
      &[movie("10"), movie("20")],
    );
    let (x, y) = to_xy(&examples);
    assert_eq!(x.len(), 2);
    assert_eq!(y, vec![4.0, 2.0]);
    assert_eq!(x[0][7], 1995.0);
  }
}
