mod app_config;

use lib::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::{error::Error, path::PathBuf};
use tracing::info;

use app_config::AppConfig;

const DEFAULT_SOLR_URL: &str = "http://localhost:8983/solr";
const DEFAULT_COLLECTION: &str = "movies";
const DEFAULT_FEATURE_STORE: &str = "movieFeatures";
const DEFAULT_MODEL_NAME: &str = "movieRatingNet";
const DEFAULT_EPOCHS: usize = 20;
const DEFAULT_SEED: u64 = 1;
const DEFAULT_ROWS: usize = 10_000;

#[derive(Parser)]
struct Cli {
  /// YAML settings file; command line flags win over its values
  #[arg(short, long, value_name = "PATH", global = true)]
  config: Option<PathBuf>,
  #[command(subcommand)]
  command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
  Luminal,
  Dfdx,
}

impl From<BackendArg> for subcommands::Backend {
  fn from(value: BackendArg) -> Self {
    match value {
      BackendArg::Luminal => subcommands::Backend::Luminal,
      BackendArg::Dfdx => subcommands::Backend::Dfdx,
    }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Publish the movie feature definitions to the engine
  UploadFeatures {
    /// Delete the store before uploading
    #[arg(long)]
    reset: bool,
    #[arg(long)]
    solr_url: Option<String>,
    #[arg(long)]
    collection: Option<String>,
    #[arg(long)]
    feature_store: Option<String>,
  },
  /// Pull every document's computed feature vector into a file
  Extract {
    /// File for the extracted vectors
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,
    #[arg(long, value_name = "INT", default_value_t = DEFAULT_ROWS)]
    rows: usize,
    /// Result order; the default keeps repeated extractions identical
    #[arg(long, value_name = "SORT", default_value = "id asc")]
    sort: String,
    #[arg(long)]
    solr_url: Option<String>,
    #[arg(long)]
    collection: Option<String>,
    #[arg(long)]
    feature_store: Option<String>,
  },
  /// Join ratings, users and extracted vectors into a training dataset
  BuildDataset {
    /// Users csv
    #[arg(long, value_name = "PATH")]
    users: PathBuf,
    /// Ratings csv
    #[arg(long, value_name = "PATH")]
    ratings: PathBuf,
    /// Extracted feature vectors, as written by extract
    #[arg(long, value_name = "PATH")]
    features: PathBuf,
    /// File for the dataset
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,
    /// Resampling seed
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,
  },
  /// Train the rating predictor and write the network
  Train {
    /// Dataset, as written by build-dataset
    #[arg(short, long, value_name = "PATH")]
    data: PathBuf,
    /// File for the trained network
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,
    #[arg(short, long, value_name = "INT")]
    epochs: Option<usize>,
    #[arg(short, long, value_enum, default_value = "luminal")]
    backend: BackendArg,
  },
  /// Score a written network against the held-out slice of a dataset
  Evaluate {
    /// Network, as written by train
    #[arg(short, long, value_name = "PATH")]
    network: PathBuf,
    /// Dataset, as written by build-dataset
    #[arg(short, long, value_name = "PATH")]
    data: PathBuf,
  },
  /// Publish a trained network as a neural LTR model
  UploadModel {
    /// Network, as written by train
    #[arg(short, long, value_name = "PATH")]
    network: PathBuf,
    /// Dataset the network was trained on, for its normalizer bounds
    #[arg(short, long, value_name = "PATH")]
    data: PathBuf,
    /// Model name in the model store
    #[arg(long)]
    name: Option<String>,
    /// Delete the model before uploading
    #[arg(long)]
    reset: bool,
    #[arg(long)]
    solr_url: Option<String>,
    #[arg(long)]
    collection: Option<String>,
    #[arg(long)]
    feature_store: Option<String>,
  },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
  utils::init_logging()?;
  let Cli { config, command } = Cli::parse();

  let config = match config {
    Some(path) => {
      info!("settings from {:?}", path);
      AppConfig::load(&path)?
    }
    None => AppConfig::default(),
  };

  match command {
    Command::UploadFeatures {
      reset,
      solr_url,
      collection,
      feature_store,
    } => {
      let settings = config.merge(AppConfig {
        solr_url,
        collection,
        feature_store,
        ..Default::default()
      });
      subcommands::UploadFeatures::new(
        settings.solr_url.as_deref().unwrap_or(DEFAULT_SOLR_URL),
        settings.collection.as_deref().unwrap_or(DEFAULT_COLLECTION),
        settings
          .feature_store
          .as_deref()
          .unwrap_or(DEFAULT_FEATURE_STORE),
        reset,
      )
      .run()
      .await?;
    }
    Command::Extract {
      output,
      rows,
      sort,
      solr_url,
      collection,
      feature_store,
    } => {
      let settings = config.merge(AppConfig {
        solr_url,
        collection,
        feature_store,
        ..Default::default()
      });
      subcommands::Extract::new(
        settings.solr_url.as_deref().unwrap_or(DEFAULT_SOLR_URL),
        settings.collection.as_deref().unwrap_or(DEFAULT_COLLECTION),
        settings
          .feature_store
          .as_deref()
          .unwrap_or(DEFAULT_FEATURE_STORE),
        rows,
        &sort,
        &output,
      )
      .run()
      .await?;
    }
    Command::BuildDataset {
      users,
      ratings,
      features,
      output,
      seed,
    } => {
      let settings = config.merge(AppConfig {
        seed,
        ..Default::default()
      });
      subcommands::BuildDataset::new(
        &users,
        &ratings,
        &features,
        &output,
        settings.seed.unwrap_or(DEFAULT_SEED),
      )
      .run()?;
    }
    Command::Train {
      data,
      output,
      epochs,
      backend,
    } => {
      let settings = config.merge(AppConfig {
        epochs,
        ..Default::default()
      });
      subcommands::Train::new(
        &data,
        &output,
        settings.epochs.unwrap_or(DEFAULT_EPOCHS),
        backend.into(),
      )
      .run();
    }
    Command::Evaluate { network, data } => {
      subcommands::Evaluate::new(&network, &data).run()?;
    }
    Command::UploadModel {
      network,
      data,
      name,
      reset,
      solr_url,
      collection,
      feature_store,
    } => {
      let settings = config.merge(AppConfig {
        solr_url,
        collection,
        feature_store,
        ..Default::default()
      });
      subcommands::UploadModel::new(
        settings.solr_url.as_deref().unwrap_or(DEFAULT_SOLR_URL),
        settings.collection.as_deref().unwrap_or(DEFAULT_COLLECTION),
        settings
          .feature_store
          .as_deref()
          .unwrap_or(DEFAULT_FEATURE_STORE),
        name.as_deref().unwrap_or(DEFAULT_MODEL_NAME),
        &network,
        &data,
        reset,
      )
      .run()
      .await?;
    }
  }
  Ok(())
}
