use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::{to_xy, NormalizedDataset};
use crate::model::{dfdx_mlp, luminal_mlp, TrainParams};
use crate::utils::{deserialize_from_file, serialize_to_file};

/// Which trainer runs: the graph-compiled one or the eager one. Both fit
/// the same layer stack, so their exported networks are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
  Luminal,
  Dfdx,
}

pub struct Train {
  dataset_path: PathBuf,
  output_path: PathBuf,
  epochs: usize,
  backend: Backend,
}

impl Train {
  pub fn new(dataset_path: &Path, output_path: &Path, epochs: usize, backend: Backend) -> Self {
    Self {
      dataset_path: PathBuf::from(dataset_path),
      output_path: PathBuf::from(output_path),
      epochs,
      backend,
    }
  }

  pub fn run(self) {
    let dataset: NormalizedDataset = deserialize_from_file(&self.dataset_path);
    let params = TrainParams {
      data: to_xy(&dataset.examples),
      epochs: self.epochs,
    };
    let network = match self.backend {
      Backend::Luminal => luminal_mlp::run_model(params).export(),
      Backend::Dfdx => {
        let (network, test_mse) = dfdx_mlp::run_model(params);
        info!("test mse {:.4}", test_mse);
        network
      }
    };
    serialize_to_file(&self.output_path, &network);
  }
}
