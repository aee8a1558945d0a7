mod builder;
mod cache;
mod collect;
mod dump;
mod elem;
mod envelope;

pub use cache::ProtoSelect;
pub use dump::dump;
pub use elem::{ProtoConfig, SelectElem, ThreshEntry};
