use std::iter::zip;

use dfdx::{
  optim::{Adam, AdamConfig, Optimizer},
  prelude::*,
};
use tracing::{info, warn};

use crate::data::{split_dataset, INPUT_DIMENSION};
use crate::model::{
  matrix_from_output_major, network_from_layers, ExponentialAverage, ExportedNetwork, TrainParams,
  H1, H2, H3, H4, TRAIN_SPLIT,
};

/// The same stack as the graph-based trainer, built from dfdx modules.
/// These layers carry bias terms, so the exported model keeps them.
pub type Model = (
  (Linear<INPUT_DIMENSION, H1>, ReLU),
  (Linear<H1, H2>, ReLU),
  (Linear<H2, H3>, ReLU),
  (Linear<H3, H4>, ReLU),
  Linear<H4, 1>,
);

pub type Built = <Model as BuildOnDevice<Cpu, f32>>::Built;

pub const BATCH_SIZE: usize = 32;
pub const LEARNING_RATE: f64 = 1e-3;

/// Trains the rating predictor with minibatched Adam and returns the
/// exported network together with its MSE on the held-out split.
pub fn run_model(train_params: TrainParams) -> (ExportedNetwork, f32) {
  let (x, y) = train_params.data;
  let epochs = train_params.epochs;

  let dev = Cpu::default();
  let mut model = dev.build_module::<Model, f32>();
  let mut grads = model.alloc_grads();
  let mut opt = Adam::new(
    &model,
    AdamConfig {
      lr: LEARNING_RATE,
      ..Default::default()
    },
  );

  let (train_x, test_x, train_y, test_y) = split_dataset(x, y, TRAIN_SPLIT);

  let mut loss_avg = ExponentialAverage::new(1.0);
  let start = std::time::Instant::now();
  let mut iter = 0;
  for epoch in 0..epochs {
    for (batch_x, batch_y) in zip(train_x.chunks(BATCH_SIZE), train_y.chunks(BATCH_SIZE)) {
      let x = batch_tensor(&dev, batch_x);
      let y = dev.tensor_from_vec(batch_y.to_vec(), (batch_y.len(), Const::<1>));

      let prediction = model.forward_mut(x.traced(grads));
      let loss = mse_loss(prediction, y);
      loss_avg.update(loss.array());

      grads = loss.backward();
      opt.update(&mut model, &grads).unwrap();
      model.zero_grads(&mut grads);
      iter += 1;
    }
    info!("epoch {}, smoothed loss {:.4}", epoch + 1, loss_avg.value);
  }

  if iter > 0 {
    info!("finished in {iter} iterations");
    info!(
      "took {:.2}s, {:.2}µs / iter",
      start.elapsed().as_secs_f32(),
      start.elapsed().as_micros() / iter
    );
  }

  let test_mse = if test_x.is_empty() {
    warn!("no held-out examples, skipping the test pass");
    f32::NAN
  } else {
    let x = batch_tensor(&dev, &test_x);
    let y = dev.tensor_from_vec(test_y.clone(), (test_y.len(), Const::<1>));
    mse_loss(model.forward(x), y).array()
  };

  (export_network(&model), test_mse)
}

fn batch_tensor(
  dev: &Cpu,
  rows: &[[f32; INPUT_DIMENSION]],
) -> Tensor<(usize, Const<INPUT_DIMENSION>), f32, Cpu> {
  let flat: Vec<f32> = rows.iter().flatten().copied().collect();
  dev.tensor_from_vec(flat, (rows.len(), Const::<INPUT_DIMENSION>))
}

/// Reads each trained layer back out as `[output][input]` rows plus its
/// bias vector.
pub fn export_network(model: &Built) -> ExportedNetwork {
  let layers = vec![
    layer(model.0 .0.weight.as_vec(), model.0 .0.bias.as_vec()),
    layer(model.1 .0.weight.as_vec(), model.1 .0.bias.as_vec()),
    layer(model.2 .0.weight.as_vec(), model.2 .0.bias.as_vec()),
    layer(model.3 .0.weight.as_vec(), model.3 .0.bias.as_vec()),
    layer(model.4.weight.as_vec(), model.4.bias.as_vec()),
  ];
  network_from_layers(layers)
}

fn layer(weight: Vec<f32>, bias: Vec<f32>) -> (Vec<Vec<f32>>, Vec<f32>) {
  // dfdx stores Linear weights row-major over outputs
  let inputs = weight.len() / bias.len();
  (matrix_from_output_major(&weight, inputs, bias.len()), bias)
}
