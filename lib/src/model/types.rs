use serde::{Deserialize, Serialize};

use crate::data::{InputsVec, OutputsVec, INPUT_DIMENSION};

pub const H1: usize = 32;
pub const H2: usize = 16;
pub const H3: usize = 8;
pub const H4: usize = 4;

/// Layer widths of the rating predictor, input first. Both trainers build
/// this exact stack and the exporter checks extracted tensors against it.
pub const LAYER_SIZES: [usize; 6] = [INPUT_DIMENSION, H1, H2, H3, H4, 1];

/// Ordered train/test split shared by the trainers and the offline
/// evaluator, so "test MSE" always means the same trailing slice.
pub const TRAIN_SPLIT: f32 = 0.8;

pub struct TrainParams {
  pub data: (InputsVec, OutputsVec),
  pub epochs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
  Relu,
  Identity,
}

/// One linear layer the way the search engine consumes it:
/// `matrix[output][input]`, one bias per output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights {
  pub matrix: Vec<Vec<f32>>,
  pub bias: Vec<f32>,
  pub activation: Activation,
}

/// Trained weights in forward order. This is the on-disk checkpoint every
/// step after training reads back, and the layer stack the model upload
/// embeds verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedNetwork {
  pub layers: Vec<LayerWeights>,
}

pub struct ExponentialAverage {
  beta: f32,
  moment: f32,
  pub value: f32,
  t: i32,
}

impl ExponentialAverage {
  pub fn new(initial: f32) -> Self {
    ExponentialAverage {
      beta: 0.999,
      moment: 0.,
      value: initial,
      t: 0,
    }
  }
}

impl ExponentialAverage {
  pub fn update(&mut self, value: f32) {
    self.t += 1;
    self.moment = self.beta * self.moment + (1. - self.beta) * value;
    // bias correction
    self.value = self.moment / (1. - f32::powi(self.beta, self.t));
  }

  pub fn reset(&mut self) {
    self.moment = 0.;
    self.value = 0.0;
    self.t = 0;
  }
}
