use std::error::Error;
use std::path::Path;

use tracing::warn;

use crate::data::{NormalizedDataset, NORMALIZED_WINDOW};
use crate::features::movie_feature_set;
use crate::model::{ltr_model, ExportedNetwork};
use crate::solr::SolrClient;
use crate::utils::deserialize_from_file;

pub struct UploadModel {
  client: SolrClient,
  store: String,
  name: String,
  network: ExportedNetwork,
  mins: [f32; NORMALIZED_WINDOW],
  maxs: [f32; NORMALIZED_WINDOW],
  reset: bool,
}

impl UploadModel {
  /// The dataset is read back for its min-max bounds; the uploaded model
  /// must normalize query-time features exactly as training did.
  pub fn new(
    solr_url: &str,
    collection: &str,
    store: &str,
    name: &str,
    network_path: &Path,
    dataset_path: &Path,
    reset: bool,
  ) -> Self {
    let dataset: NormalizedDataset = deserialize_from_file(dataset_path);
    Self {
      client: SolrClient::new(solr_url, collection),
      store: store.to_string(),
      name: name.to_string(),
      network: deserialize_from_file(network_path),
      mins: dataset.mins,
      maxs: dataset.maxs,
      reset,
    }
  }

  pub async fn run(self) -> Result<(), Box<dyn Error>> {
    let document = ltr_model(
      &self.name,
      &self.store,
      &movie_feature_set(),
      &self.mins,
      &self.maxs,
      &self.network,
    );
    if self.reset {
      if let Err(e) = self.client.delete_model(&self.name).await {
        warn!("model delete failed, continuing: {}", e);
      }
    }
    self.client.upload_model(&document).await
  }
}
