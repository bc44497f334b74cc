use std::error::Error;
use std::path::Path;

use serde::Deserialize;

/// File-level settings, YAML. Every field may be omitted; command line
/// flags win over file values, which win over the built-in defaults.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
  pub solr_url: Option<String>,
  pub collection: Option<String>,
  pub feature_store: Option<String>,
  pub epochs: Option<usize>,
  pub seed: Option<u64>,
}

impl AppConfig {
  pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
  }

  // merge configs where the second overwrites the first
  pub fn merge(self, other: Self) -> Self {
    Self {
      solr_url: other.solr_url.or(self.solr_url),
      collection: other.collection.or(self.collection),
      feature_store: other.feature_store.or(self.feature_store),
      epochs: other.epochs.or(self.epochs),
      seed: other.seed.or(self.seed),
    }
  }
}
