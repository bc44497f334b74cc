use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::data::{EXTERNAL_FEATURES, INPUT_DIMENSION};

pub const SOLR_FEATURE: &str = "org.apache.solr.ltr.feature.SolrFeature";
pub const FIELD_VALUE_FEATURE: &str = "org.apache.solr.ltr.feature.FieldValueFeature";
pub const FIELD_LENGTH_FEATURE: &str = "org.apache.solr.ltr.feature.FieldLengthFeature";
pub const VALUE_FEATURE: &str = "org.apache.solr.ltr.feature.ValueFeature";

/// One named feature of an LTR feature store. `params` is the
/// class-specific payload, kept as raw JSON the way the engine takes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDefinition {
  pub name: String,
  pub class: String,
  pub params: serde_json::Value,
}

impl FeatureDefinition {
  /// Match flag over a collection-valued field: 1.0 when `field` holds
  /// `value`, 0.0 otherwise.
  pub fn collection_flag(name: &str, field: &str, value: &str) -> Self {
    Self {
      name: name.into(),
      class: SOLR_FEATURE.into(),
      params: json!({ "fq": [format!("{}:{}", field, value)] }),
    }
  }

  /// Scalar document field taken directly as the feature value.
  pub fn field_value(name: &str, field: &str) -> Self {
    Self {
      name: name.into(),
      class: FIELD_VALUE_FEATURE.into(),
      params: json!({ "field": field }),
    }
  }

  /// Term count of a document field.
  pub fn field_length(name: &str, field: &str) -> Self {
    Self {
      name: name.into(),
      class: FIELD_LENGTH_FEATURE.into(),
      params: json!({ "field": field }),
    }
  }

  /// Externally supplied per-request value. Not required, so bulk
  /// extraction without user context computes 0.0 here instead of
  /// failing the query.
  pub fn external(name: &str) -> Self {
    Self {
      name: name.into(),
      class: VALUE_FEATURE.into(),
      params: json!({ "value": format!("${{{}}}", name), "required": false }),
    }
  }
}

/// The experiment's movie store: genre flags, then movie scalars, then the
/// per-request user values. Order matters. The dataset assembler swaps the
/// external tail for real user values, and the model exporter attaches
/// normalizers to the trailing window.
pub fn movie_feature_set() -> Vec<FeatureDefinition> {
  vec![
    FeatureDefinition::collection_flag("isAction", "genre", "Action"),
    FeatureDefinition::collection_flag("isComedy", "genre", "Comedy"),
    FeatureDefinition::collection_flag("isDrama", "genre", "Drama"),
    FeatureDefinition::collection_flag("isHorror", "genre", "Horror"),
    FeatureDefinition::collection_flag("isRomance", "genre", "Romance"),
    FeatureDefinition::collection_flag("isSciFi", "genre", "Sci-Fi"),
    FeatureDefinition::collection_flag("isThriller", "genre", "Thriller"),
    FeatureDefinition::field_value("releaseYear", "release_year"),
    FeatureDefinition::field_length("titleLength", "title"),
    FeatureDefinition::field_length("genreCount", "genre"),
    FeatureDefinition::field_value("popularity", "popularity"),
    FeatureDefinition::field_value("runtimeMinutes", "runtime_minutes"),
    FeatureDefinition::external("userGender"),
    FeatureDefinition::external("userAge"),
    FeatureDefinition::external("userOccupation"),
  ]
}
