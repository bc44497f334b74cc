pub use dataset::*;
pub use loader::*;
pub use normalize::*;
pub use resample::*;
pub use types::*;

pub mod dataset;
pub mod loader;
pub mod normalize;
pub mod resample;
pub mod types;
