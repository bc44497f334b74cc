use std::error::Error;

use tracing::warn;

use crate::features::movie_feature_set;
use crate::solr::SolrClient;

pub struct UploadFeatures {
  client: SolrClient,
  store: String,
  reset: bool,
}

impl UploadFeatures {
  pub fn new(solr_url: &str, collection: &str, store: &str, reset: bool) -> Self {
    Self {
      client: SolrClient::new(solr_url, collection),
      store: store.to_string(),
      reset,
    }
  }

  pub async fn run(self) -> Result<(), Box<dyn Error>> {
    if self.reset {
      // a fresh store may not exist yet, so a failed delete is fine
      if let Err(e) = self.client.delete_feature_store(&self.store).await {
        warn!("feature store delete failed, continuing: {}", e);
      }
    }
    self
      .client
      .upload_features(&self.store, &movie_feature_set())
      .await
  }
}
