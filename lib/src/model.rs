pub mod dfdx_mlp;
pub mod export;
pub mod luminal_mlp;
pub mod types;

pub use export::*;
pub use types::*;
