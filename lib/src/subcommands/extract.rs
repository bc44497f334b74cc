use std::error::Error;
use std::path::{Path, PathBuf};

use crate::data::INPUT_DIMENSION;
use crate::solr::SolrClient;
use crate::utils::serialize_to_file;

pub struct Extract {
  client: SolrClient,
  store: String,
  rows: usize,
  sort: String,
  output_path: PathBuf,
}

impl Extract {
  pub fn new(
    solr_url: &str,
    collection: &str,
    store: &str,
    rows: usize,
    sort: &str,
    output_path: &Path,
  ) -> Self {
    Self {
      client: SolrClient::new(solr_url, collection),
      store: store.to_string(),
      rows,
      sort: sort.to_string(),
      output_path: PathBuf::from(output_path),
    }
  }

  pub async fn run(self) -> Result<(), Box<dyn Error>> {
    let vectors = self
      .client
      .extract_features(&self.store, self.rows, Some(&self.sort))
      .await?;
    for vector in &vectors {
      if vector.features.len() != INPUT_DIMENSION {
        return Err(
          format!(
            "document {} extracted {} features, expected {}",
            vector.db_id,
            vector.features.len(),
            INPUT_DIMENSION
          )
          .into(),
        );
      }
    }
    serialize_to_file(&self.output_path, &vectors);
    Ok(())
  }
}
