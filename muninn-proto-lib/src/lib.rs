#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod params;
pub mod proto;
pub mod select;
pub mod worker;

pub use config::{load_from_path, ModelConfig};
pub use error::{InitError, Result, SelectError};
pub use params::{DtClass, MemType, OpAttr, OpId, SelectParam};
pub use proto::model::{registry_from_model, ModeledProtocol};
pub use proto::{
    CfgThresh, InitRequest, Perf, PerfRange, ProtoCaps, ProtoId, ProtoMask, ProtoRegistry,
    Protocol, MAX_PRIV, MAX_PROTOCOLS,
};
pub use select::{dump, ProtoConfig, ProtoSelect, SelectElem, ThreshEntry};
pub use worker::Worker;
