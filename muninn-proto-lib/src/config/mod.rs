mod loader;
mod model;

pub use loader::load_from_path;
pub use model::{ModelConfig, ProtocolModel, RangeModel};
