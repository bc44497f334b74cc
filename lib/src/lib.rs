pub mod data;
pub mod features;
pub mod model;
pub mod solr;
pub mod subcommands;
pub mod utils;
