use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(not(debug_assertions))]
use human_panic::setup_panic;
use tracing::subscriber::SetGlobalDefaultError;

#[cfg(debug_assertions)]
extern crate better_panic;

use tracing_subscriber::{self};

// [NOTE] tracing: prefer `tracing::{info, warn, debug}` over println in
// library code; `#[tracing::instrument]` on pipeline entry points records
// their arguments as span fields.

pub fn install_logger() -> Result<(), SetGlobalDefaultError> {
  let subscriber = tracing_subscriber::fmt().compact();
  let subscriber = subscriber.finish();
  tracing::subscriber::set_global_default(subscriber)
}

pub fn init_logging() -> Result<(), SetGlobalDefaultError> {
  // Human Panic. Only enabled when *not* debugging.
  #[cfg(not(debug_assertions))]
  {
    setup_panic!();
  }

  // Better Panic. Only enabled *when* debugging.
  #[cfg(debug_assertions)]
  {
    better_panic::Settings::debug()
      .most_recent_first(false)
      .lineno_suffix(true)
      .verbosity(better_panic::Verbosity::Full)
      .install();
  }

  // Setup Logging
  install_logger()?;

  Ok(())
}

pub fn serialize_to_file<T: Serialize>(path: &Path, obj: &T) {
  let buff = match serde_json::to_string(obj) {
    Ok(buff) => buff,
    Err(e) => panic!("Cannot serialize for {:?}: {}", path, e),
  };

  if let Err(e) = std::fs::write(path, buff) {
    panic!("Error creating file {:?}: {}", path, e);
  };
}

pub fn deserialize_from_file<T: for<'de> Deserialize<'de>>(path: &Path) -> T {
  let content = match std::fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) => panic!("Failed to read file {:?}: {}", path, e),
  };
  match serde_json::from_str(&content) {
    Ok(obj) => obj,
    Err(e) => panic!("Malformed JSON in {:?}: {}", path, e),
  }
}
