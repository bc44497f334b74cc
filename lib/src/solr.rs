use std::error::Error;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::data::MovieFeatureVector;
use crate::features::FeatureDefinition;
use crate::model::LtrModel;

/// Client for the engine's LTR endpoints: the feature-store and
/// model-store managed resources under `/schema`, and `/select` with the
/// `[features]` transformer for bulk extraction.
pub struct SolrClient {
  base_url: String,
  collection: String,
  http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
  response: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
  #[serde(rename = "numFound")]
  num_found: u64,
  docs: Vec<SelectDoc>,
}

#[derive(Debug, Deserialize)]
struct SelectDoc {
  id: String,
  #[serde(rename = "[features]")]
  features: Option<String>,
}

impl SolrClient {
  pub fn new(base_url: &str, collection: &str) -> Self {
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      collection: collection.to_string(),
      http: reqwest::Client::new(),
    }
  }

  fn schema_url(&self, resource: &str) -> String {
    format!("{}/{}/schema/{}", self.base_url, self.collection, resource)
  }

  /// Publishes the feature definitions under `store`. The managed
  /// resource takes a flat list with the store name repeated on every
  /// entry.
  pub async fn upload_features(
    &self,
    store: &str,
    features: &[FeatureDefinition],
  ) -> Result<(), Box<dyn Error>> {
    let mut entries = Vec::with_capacity(features.len());
    for feature in features {
      let mut entry = serde_json::to_value(feature)?;
      entry["store"] = json!(store);
      entries.push(entry);
    }
    info!("uploading {} features to store {}", entries.len(), store);
    let response = self
      .http
      .put(self.schema_url("feature-store"))
      .header(CONTENT_TYPE, "application/json")
      .body(serde_json::to_string(&entries)?)
      .send()
      .await?;
    expect_ok(response, "feature upload").await
  }

  pub async fn delete_feature_store(&self, store: &str) -> Result<(), Box<dyn Error>> {
    info!("deleting feature store {}", store);
    let response = self
      .http
      .delete(self.schema_url(&format!("feature-store/{}", store)))
      .send()
      .await?;
    expect_ok(response, "feature store delete").await
  }

  pub async fn upload_model(&self, model: &LtrModel) -> Result<(), Box<dyn Error>> {
    info!("uploading model {} to store {}", model.name, model.store);
    let response = self
      .http
      .put(self.schema_url("model-store"))
      .header(CONTENT_TYPE, "application/json")
      .body(serde_json::to_string(model)?)
      .send()
      .await?;
    expect_ok(response, "model upload").await
  }

  pub async fn delete_model(&self, name: &str) -> Result<(), Box<dyn Error>> {
    info!("deleting model {}", name);
    let response = self
      .http
      .delete(self.schema_url(&format!("model-store/{}", name)))
      .send()
      .await?;
    expect_ok(response, "model delete").await
  }

  /// Pulls the computed feature vector of up to `rows` documents through
  /// the `[features]` transformer, in the store's declaration order.
  pub async fn extract_features(
    &self,
    store: &str,
    rows: usize,
    sort: Option<&str>,
  ) -> Result<Vec<MovieFeatureVector>, Box<dyn Error>> {
    let mut query: Vec<(&str, String)> = vec![
      ("q", "*:*".into()),
      ("rows", rows.to_string()),
      ("fl", format!("id,[features store={}]", store)),
      ("wt", "json".into()),
    ];
    if let Some(sort) = sort {
      query.push(("sort", sort.into()));
    }

    let response = self
      .http
      .get(format!("{}/{}/select", self.base_url, self.collection))
      .query(&query)
      .send()
      .await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(format!("feature extraction failed with {}: {}", status, body).into());
    }

    let parsed: SelectResponse = serde_json::from_str(&response.text().await?)?;
    if parsed.response.num_found > rows as u64 {
      warn!(
        "collection holds {} documents, extracted only {}",
        parsed.response.num_found, rows
      );
    }

    let mut vectors = Vec::with_capacity(parsed.response.docs.len());
    for doc in parsed.response.docs {
      let raw = doc.features.ok_or_else(|| {
        format!(
          "document {} came back without [features], store {} may not be deployed",
          doc.id, store
        )
      })?;
      vectors.push(MovieFeatureVector {
        db_id: doc.id,
        features: parse_feature_vector(&raw)?,
      });
    }
    info!("extracted {} feature vectors", vectors.len());
    Ok(vectors)
  }
}

/// Parses the transformer output, `name=value` pairs joined by commas.
fn parse_feature_vector(raw: &str) -> Result<Vec<f32>, Box<dyn Error>> {
  let mut values = Vec::new();
  for pair in raw.split(',') {
    let (name, value) = pair
      .split_once('=')
      .ok_or_else(|| format!("malformed feature entry {:?}", pair))?;
    let value: f32 = value
      .parse()
      .map_err(|e| format!("feature {}: {}", name, e))?;
    values.push(value);
  }
  Ok(values)
}

async fn expect_ok(response: reqwest::Response, what: &str) -> Result<(), Box<dyn Error>> {
  let status = response.status();
  if status.is_success() {
    Ok(())
  } else {
    let body = response.text().await.unwrap_or_default();
    Err(format!("{} failed with {}: {}", what, status, body).into())
  }
}
