use std::error::Error;
use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, SeedableRng};

use crate::data::{assemble, normalize, read_ratings, read_users, resample, MovieFeatureVector};
use crate::utils::{deserialize_from_file, serialize_to_file};

pub struct BuildDataset {
  users_path: PathBuf,
  ratings_path: PathBuf,
  features_path: PathBuf,
  output_path: PathBuf,
  seed: u64,
}

impl BuildDataset {
  pub fn new(
    users_path: &Path,
    ratings_path: &Path,
    features_path: &Path,
    output_path: &Path,
    seed: u64,
  ) -> Self {
    Self {
      users_path: PathBuf::from(users_path),
      ratings_path: PathBuf::from(ratings_path),
      features_path: PathBuf::from(features_path),
      output_path: PathBuf::from(output_path),
      seed,
    }
  }

  /// Joins ratings, users and extracted movie vectors, scales the
  /// trailing window, resamples by rating bucket and writes the result.
  pub fn run(self) -> Result<(), Box<dyn Error>> {
    let users = read_users(&self.users_path)?;
    let ratings = read_ratings(&self.ratings_path)?;
    let movies: Vec<MovieFeatureVector> = deserialize_from_file(&self.features_path);

    let examples = assemble(&ratings, &users, &movies);
    let mut dataset = normalize(examples);
    let mut rng = StdRng::seed_from_u64(self.seed);
    dataset.examples = resample(dataset.examples, &mut rng);

    serialize_to_file(&self.output_path, &dataset);
    Ok(())
  }
}
