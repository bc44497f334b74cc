use std::iter::zip;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::data::NORMALIZED_WINDOW;
use crate::features::FeatureDefinition;

use super::{Activation, ExportedNetwork, LayerWeights};

pub const NEURAL_NETWORK_MODEL: &str = "org.apache.solr.ltr.model.NeuralNetworkModel";
pub const MINMAX_NORMALIZER: &str = "org.apache.solr.ltr.norm.MinMaxNormalizer";

/// The model-store document: the feature list in store order, with the
/// trailing window carrying min-max normalizers, plus the layer stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtrModel {
  pub store: String,
  pub name: String,
  pub class: String,
  pub features: Vec<ModelFeature>,
  pub params: ModelParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFeature {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub norm: Option<Normalizer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
  pub class: String,
  pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
  pub layers: Vec<LayerWeights>,
}

/// Stacks `(matrix, bias)` pairs into an [`ExportedNetwork`]: ReLU after
/// every layer except the last, which stays identity so the engine emits
/// the raw affine output as the document score.
pub fn network_from_layers(layers: Vec<(Vec<Vec<f32>>, Vec<f32>)>) -> ExportedNetwork {
  let count = layers.len();
  ExportedNetwork {
    layers: layers
      .into_iter()
      .enumerate()
      .map(|(i, (matrix, bias))| LayerWeights {
        matrix,
        bias,
        activation: if i + 1 == count {
          Activation::Identity
        } else {
          Activation::Relu
        },
      })
      .collect(),
  }
}

/// Reshapes a row-major `[input][output]` flat tensor (luminal's linear
/// layout) into `[output][input]` rows.
pub fn matrix_from_input_major(flat: &[f32], inputs: usize, outputs: usize) -> Vec<Vec<f32>> {
  assert_eq!(flat.len(), inputs * outputs);
  (0..outputs)
    .map(|o| (0..inputs).map(|i| flat[i * outputs + o]).collect())
    .collect()
}

/// Chunks a row-major `[output][input]` flat tensor (dfdx's linear
/// layout) into `[output][input]` rows.
pub fn matrix_from_output_major(flat: &[f32], inputs: usize, outputs: usize) -> Vec<Vec<f32>> {
  assert_eq!(flat.len(), inputs * outputs);
  flat.chunks(inputs).map(|row| row.to_vec()).collect()
}

impl ExportedNetwork {
  /// The engine-side scoring math: each layer is `matrix * x + bias`
  /// followed by its recorded activation. Used for offline evaluation
  /// and to cross-check weight extraction against the live graphs.
  pub fn forward(&self, features: &[f32]) -> f32 {
    let mut activations = features.to_vec();
    for layer in &self.layers {
      let mut next = Vec::with_capacity(layer.matrix.len());
      for (row, bias) in zip(&layer.matrix, &layer.bias) {
        assert_eq!(
          row.len(),
          activations.len(),
          "layer expects {} inputs, got {}",
          row.len(),
          activations.len()
        );
        let mut value = zip(row, &activations).map(|(w, a)| w * a).sum::<f32>() + bias;
        if layer.activation == Activation::Relu {
          value = value.max(0.0);
        }
        next.push(value);
      }
      activations = next;
    }
    assert_eq!(activations.len(), 1, "network does not end in a scalar");
    activations[0]
  }
}

/// Builds the model-store document for `network`. The dataset's min-max
/// bounds become engine-side normalizers on the trailing feature window,
/// so query-time inputs are scaled exactly as the training inputs were.
/// A column with `min == max` trained as constant 0.0 and gets none.
pub fn ltr_model(
  name: &str,
  store: &str,
  features: &[FeatureDefinition],
  mins: &[f32; NORMALIZED_WINDOW],
  maxs: &[f32; NORMALIZED_WINDOW],
  network: &ExportedNetwork,
) -> LtrModel {
  assert!(features.len() >= NORMALIZED_WINDOW);
  let base = features.len() - NORMALIZED_WINDOW;
  let features = features
    .iter()
    .enumerate()
    .map(|(position, feature)| {
      let norm = position.checked_sub(base).and_then(|i| {
        (maxs[i] > mins[i]).then(|| Normalizer {
          class: MINMAX_NORMALIZER.into(),
          params: json!({ "min": mins[i].to_string(), "max": maxs[i].to_string() }),
        })
      });
      ModelFeature {
        name: feature.name.clone(),
        norm,
      }
    })
    .collect();
  LtrModel {
    store: store.into(),
    name: name.into(),
    class: NEURAL_NETWORK_MODEL.into(),
    features,
    params: ModelParams {
      layers: network.layers.clone(),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::features::movie_feature_set;

  fn tiny_network() -> ExportedNetwork {
    // 2 -> 2 -> 1, hand-checkable
    network_from_layers(vec![
      (vec![vec![1.0, 0.0], vec![-1.0, 1.0]], vec![0.0, 0.5]),
      (vec![vec![1.0, 2.0]], vec![0.25]),
    ])
  }

  #[test]
  fn final_layer_is_identity_the_rest_relu() {
    let network = tiny_network();
    assert_eq!(network.layers[0].activation, Activation::Relu);
    assert_eq!(network.layers[1].activation, Activation::Identity);
  }

  #[test]
  fn forward_applies_relu_then_raw_affine_output() {
    let network = tiny_network();
    // layer 1: [3.0, max(0, -3 + 2 + 0.5)] = [3.0, 0.0]
    // layer 2: 3.0 * 1 + 0.0 * 2 + 0.25 = 3.25
    assert!((network.forward(&[3.0, 2.0]) - 3.25).abs() < 1e-6);
    // negative pre-activations clamp to zero in the hidden layer only
    // layer 1: [max(0, -1), max(0, 1 + 2 + 0.5)] = [0.0, 3.5]
    // layer 2: 0.0 + 3.5 * 2 + 0.25 = 7.25
    assert!((network.forward(&[-1.0, 2.0]) - 7.25).abs() < 1e-6);
  }

  #[test]
  fn input_major_reshape_transposes() {
    // luminal layout for a 2-in 3-out layer: [in0out0, in0out1, in0out2,
    // in1out0, in1out1, in1out2]
    let flat = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let matrix = matrix_from_input_major(&flat, 2, 3);
    assert_eq!(
      matrix,
      vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
    );
  }

  #[test]
  fn output_major_reshape_chunks() {
    let flat = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let matrix = matrix_from_output_major(&flat, 2, 3);
    assert_eq!(
      matrix,
      vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]
    );
  }

  #[test]
  fn both_orientations_agree_through_forward() {
    // one layer, 2 -> 2: y = W x, no bias
    let input_major = matrix_from_input_major(&[1.0, 2.0, 3.0, 4.0], 2, 2);
    let output_major = matrix_from_output_major(&[1.0, 3.0, 2.0, 4.0], 2, 2);
    assert_eq!(input_major, output_major);
  }

  #[test]
  fn model_document_attaches_normalizers_to_the_trailing_window() {
    let features = movie_feature_set();
    let base = features.len() - NORMALIZED_WINDOW;
    let mut mins = [0.0; NORMALIZED_WINDOW];
    let mut maxs = [10.0; NORMALIZED_WINDOW];
    // one degenerate column
    mins[2] = 5.0;
    maxs[2] = 5.0;

    let model = ltr_model(
      "movieRatingNet",
      "movieFeatures",
      &features,
      &mins,
      &maxs,
      &tiny_network(),
    );
    assert_eq!(model.class, NEURAL_NETWORK_MODEL);
    assert_eq!(model.features.len(), features.len());
    for feature in &model.features[..base] {
      assert!(feature.norm.is_none());
    }
    for (i, feature) in model.features[base..].iter().enumerate() {
      if i == 2 {
        assert!(feature.norm.is_none());
      } else {
        let norm = feature.norm.as_ref().unwrap();
        assert_eq!(norm.class, MINMAX_NORMALIZER);
        assert_eq!(norm.params["min"], json!("0"));
        assert_eq!(norm.params["max"], json!("10"));
      }
    }
    assert_eq!(model.params.layers.len(), 2);
  }

  #[test]
  fn layers_serialize_to_the_engine_schema() {
    let network = tiny_network();
    let value = serde_json::to_value(&network.layers[1]).unwrap();
    assert_eq!(
      value,
      json!({
        "matrix": [[1.0, 2.0]],
        "bias": [0.25],
        "activation": "identity"
      })
    );
  }

  #[test]
  fn features_without_normalizers_serialize_without_the_field() {
    let feature = ModelFeature {
      name: "isComedy".to_string(),
      norm: None,
    };
    assert_eq!(
      serde_json::to_value(&feature).unwrap(),
      json!({ "name": "isComedy" })
    );
  }
}
