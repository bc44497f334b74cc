use std::error::Error;
use std::iter::zip;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::{split_dataset, to_xy, NormalizedDataset};
use crate::model::{ExportedNetwork, TRAIN_SPLIT};
use crate::utils::deserialize_from_file;

/// Scores a written-out network against the held-out slice of a dataset,
/// exercising the exact affine math the engine will run.
pub struct Evaluate {
  network_path: PathBuf,
  dataset_path: PathBuf,
}

impl Evaluate {
  pub fn new(network_path: &Path, dataset_path: &Path) -> Self {
    Self {
      network_path: PathBuf::from(network_path),
      dataset_path: PathBuf::from(dataset_path),
    }
  }

  pub fn run(self) -> Result<(), Box<dyn Error>> {
    let network: ExportedNetwork = deserialize_from_file(&self.network_path);
    let dataset: NormalizedDataset = deserialize_from_file(&self.dataset_path);

    let (x, y) = to_xy(&dataset.examples);
    let (_, test_x, _, test_y) = split_dataset(x, y, TRAIN_SPLIT);
    if test_x.is_empty() {
      return Err("dataset leaves no held-out examples to score".into());
    }

    let mut squared_error = 0.0;
    for (features, target) in zip(test_x.iter(), test_y.iter()) {
      squared_error += (network.forward(features) - target).powi(2);
    }
    info!(
      "mse over {} held-out examples: {:.4}",
      test_x.len(),
      squared_error / test_x.len() as f32
    );
    Ok(())
  }
}
