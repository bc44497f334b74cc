pub use build_dataset::*;
pub use evaluate::*;
pub use extract::*;
pub use train::*;
pub use upload_features::*;
pub use upload_model::*;

pub mod build_dataset;
pub mod evaluate;
pub mod extract;
pub mod train;
pub mod upload_features;
pub mod upload_model;
