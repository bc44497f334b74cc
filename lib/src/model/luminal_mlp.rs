use std::iter::zip;

use itertools::Itertools;
use luminal::prelude::*;
use luminal_nn::{Linear, ReLU};
use luminal_training::{mse_loss, sgd_on_graph, Autograd};
use petgraph::Direction::Outgoing;
use tracing::info;

use crate::data::{split_dataset, INPUT_DIMENSION};
use crate::model::{
  matrix_from_input_major, network_from_layers, ExponentialAverage, ExportedNetwork, TrainParams,
  H1, H2, H3, H4, LAYER_SIZES, TRAIN_SPLIT,
};

/// Rating predictor as a luminal graph. luminal's `Linear` carries no
/// bias term, so every layer is a plain matmul.
pub type Model = (
  (Linear<INPUT_DIMENSION, H1>, ReLU),
  (Linear<H1, H2>, ReLU),
  (Linear<H2, H3>, ReLU),
  (Linear<H3, H4>, ReLU),
  Linear<H4, 1>,
);

/// A trained graph kept around for evaluation and export: the gradient
/// graph itself, the node ids needed to re-bind its load ops, and the
/// trained weight tensor of each layer in forward order.
pub struct TrainedMlp {
  pub cx: Graph,
  pub input_id: NodeIndex,
  pub target_id: NodeIndex,
  pub output_id: NodeIndex,
  pub weights: Vec<(NodeIndex, Vec<f32>)>,
}

pub fn run_model(train_params: TrainParams) -> TrainedMlp {
  let (x, y) = train_params.data;
  let epochs = train_params.epochs;
  // Setup gradient graph
  let mut cx = Graph::new();
  let model = <Model>::initialize(&mut cx);
  let input = cx.tensor::<R1<INPUT_DIMENSION>>();
  let output = model.forward(input).retrieve();

  let target = cx.tensor::<R1<1>>();
  let loss = mse_loss(output, target).retrieve();
  let weights = params(&model);
  assert_eq!(weights.len(), LAYER_SIZES.len() - 1);

  let grads = cx.compile(Autograd::new(&weights, loss), ());
  let (new_weights, lr) = sgd_on_graph(&mut cx, &weights, &grads);
  cx.keep_tensors(&new_weights);
  cx.keep_tensors(&weights);
  lr.set(5e-3);

  let mut loss_avg = ExponentialAverage::new(1.0);
  let start = std::time::Instant::now();

  let (train_x, test_x, train_y, test_y) = split_dataset(x, y, TRAIN_SPLIT);
  let mut iter = 0;
  for epoch in 0..epochs {
    for (x, y) in zip(train_x.iter(), train_y.iter()) {
      input.set(*x);
      target.set([*y]);

      cx.execute();
      transfer_data_same_graph(&new_weights, &weights, &mut cx);
      loss_avg.update(loss.data()[0]);
      loss.drop();
      output.drop();
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
  } else {
    // No step ran, so the weight initializers never executed. One pass
    // materializes the initial tensors for extraction.
    input.set([0.0; INPUT_DIMENSION]);
    target.set([0.0]);
    cx.execute();
    loss.drop();
    output.drop();
  }

  if !test_x.is_empty() {
    let mut squared_error = 0.0;
    for (x, y) in zip(test_x.iter(), test_y.iter()) {
      input.set(*x);
      target.set([*y]);
      cx.execute();
      squared_error += (output.data()[0] - y).powi(2);
      loss.drop();
      output.drop();
    }
    info!(
      "test mse over {} examples: {:.4}",
      test_x.len(),
      squared_error / test_x.len() as f32
    );
  }

  // params() ordering is not contractual; node creation order is, and it
  // matches the forward order of the layers.
  let weights = weights
    .into_iter()
    .sorted()
    .map(|id| {
      let data: Vec<f32> = cx
        .tensors
        .get(&(id, 0 /* single output */))
        .map(|tensor| tensor.downcast_ref::<Vec<f32>>().unwrap())
        .unwrap_or(&Vec::new())
        .clone();
      assert_eq!(
        data.len(),
        tensor_len(id, &cx),
        "weight tensor does not match its node's edge shape"
      );
      (id, data)
    })
    .collect();

  TrainedMlp {
    cx,
    input_id: input.id,
    target_id: target.id,
    output_id: output.id,
    weights,
  }
}

impl TrainedMlp {
  /// Runs one example through the trained graph by re-binding the input
  /// and weight load ops, then executing it again.
  pub fn evaluate(&mut self, input_data: [f32; INPUT_DIMENSION]) -> f32 {
    self.cx.get_op_mut::<Function>(self.input_id).1 =
      Box::new(move |_| vec![Tensor::new(input_data.to_vec())]);
    self.cx.get_op_mut::<Function>(self.target_id).1 =
      Box::new(move |_| vec![Tensor::new(vec![0.0])]); // feeds the loss, value irrelevant
    let weights = self.weights.clone();
    for (id, data) in weights {
      self.cx.get_op_mut::<Function>(id).1 = Box::new(move |_| vec![Tensor::new(data.clone())]);
    }
    self.cx.execute();
    let out = self
      .cx
      .get_tensor_ref(self.output_id, 0)
      .unwrap()
      .clone()
      .downcast_ref::<Vec<f32>>()
      .unwrap()
      .clone();
    out[0]
  }

  /// Pulls the per-layer weight matrices out of the trained graph in
  /// `[output][input]` orientation. The layers are unbiased, so the
  /// exported biases are zero vectors and the exported function equals
  /// the trained one.
  pub fn export(&self) -> ExportedNetwork {
    assert_eq!(self.weights.len(), LAYER_SIZES.len() - 1);
    let layers = self
      .weights
      .iter()
      .enumerate()
      .map(|(layer, (_, flat))| {
        let (inputs, outputs) = (LAYER_SIZES[layer], LAYER_SIZES[layer + 1]);
        assert_eq!(
          flat.len(),
          inputs * outputs,
          "layer {} holds {} weights, expected {}x{}",
          layer,
          flat.len(),
          inputs,
          outputs
        );
        (matrix_from_input_major(flat, inputs, outputs), vec![0.0; outputs])
      })
      .collect();
    network_from_layers(layers)
  }
}

/// A node's tensor size, read off the shape its outgoing edge carries.
fn tensor_len(node: NodeIndex, cx: &Graph) -> usize {
  let shape = if let Some(w) = cx.to_retrieve.get(&node) {
    w.clone().1
  } else {
    match cx
      .edges_directed(node, Outgoing)
      .filter_map(|e| e.weight().as_data())
      .next()
    {
      Some((_, _, shape)) => shape,
      None => panic!("node {:?} has no outgoing edges and is not retrieved", node),
    }
  };
  match shape.n_physical_elements().to_usize() {
    Some(n) => n,
    None => panic!("node {:?} has a dynamic shape", node),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::{InputsVec, OutputsVec};
  use crate::model::Activation;

  fn toy_data(n: usize) -> (InputsVec, OutputsVec) {
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
      let mut features = [0.0; INPUT_DIMENSION];
      for (j, f) in features.iter_mut().enumerate() {
        *f = ((i * 7 + j * 3) % 10) as f32 / 10.0;
      }
      y.push(1.0 + 4.0 * features[0]);
      x.push(features);
    }
    (x, y)
  }

  #[test]
  fn trained_graph_exports_the_expected_stack() {
    let (x, y) = toy_data(10);
    let trained = run_model(TrainParams {
      data: (x, y),
      epochs: 1,
    });
    let network = trained.export();
    assert_eq!(network.layers.len(), LAYER_SIZES.len() - 1);
    for (layer, window) in zip(&network.layers, LAYER_SIZES.windows(2)) {
      assert_eq!(layer.matrix.len(), window[1]);
      assert_eq!(layer.matrix[0].len(), window[0]);
      assert_eq!(layer.bias.len(), window[1]);
      assert!(layer.bias.iter().all(|b| *b == 0.0));
    }
    assert_eq!(
      network.layers.last().unwrap().activation,
      Activation::Identity
    );
  }

  #[test]
  fn export_reproduces_the_trained_graph() {
    let (x, y) = toy_data(10);
    let mut trained = run_model(TrainParams {
      data: (x, y),
      epochs: 1,
    });
    let network = trained.export();
    let sample = [0.5; INPUT_DIMENSION];
    let graph_output = trained.evaluate(sample);
    let exported_output = network.forward(&sample);
    assert!(
      (graph_output - exported_output).abs() < 1e-4,
      "graph {} vs exported {}",
      graph_output,
      exported_output
    );
  }

  #[test]
  fn untrained_graph_still_exports_initial_weights() {
    let trained = run_model(TrainParams {
      data: (Vec::new(), Vec::new()),
      epochs: 0,
    });
    let network = trained.export();
    assert_eq!(network.layers.len(), LAYER_SIZES.len() - 1);
    // initializers are random, not zero
    assert!(network.layers[0]
      .matrix
      .iter()
      .flatten()
      .any(|w| *w != 0.0));
  }
}
