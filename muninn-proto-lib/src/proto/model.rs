use crate::config::{ModelConfig, ProtocolModel};
use crate::error::{InitError, Result};

use super::caps::{Perf, PerfRange, ProtoCaps};
use super::registry::{InitRequest, ProtoRegistry, Protocol};

/// A protocol whose capabilities come from a declarative cost model instead
/// of probing real transport resources. This is what the threshold explorer
/// CLI registers, and what most tests select against.
pub struct ModeledProtocol {
    name: String,
    caps: ProtoCaps,
    config: String,
}

impl ModeledProtocol {
    pub fn new(name: impl Into<String>, caps: ProtoCaps) -> Self {
        ModeledProtocol { name: name.into(), caps, config: String::new() }
    }

    /// Attach the free-form configuration rendered by `config_str`.
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    fn from_model(model: &ProtocolModel) -> Self {
        let ranges = model
            .ranges
            .iter()
            .map(|r| PerfRange {
                max_length: r.max_length,
                perf: Perf::from_bandwidth(r.overhead, r.bandwidth),
            })
            .collect();
        ModeledProtocol {
            name: model.name.clone(),
            caps: ProtoCaps::new(model.min_length, ranges, model.threshold),
            config: model.config.clone(),
        }
    }
}

impl Protocol for ModeledProtocol {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(
        &self,
        _req: &InitRequest<'_>,
        priv_buf: &mut [u8],
    ) -> std::result::Result<(ProtoCaps, usize), InitError> {
        let blob = self.config.as_bytes();
        if blob.len() > priv_buf.len() {
            return Err(InitError::Failed(format!(
                "configuration does not fit the private buffer ({} bytes)",
                blob.len()
            )));
        }
        priv_buf[..blob.len()].copy_from_slice(blob);
        Ok((self.caps.clone(), blob.len()))
    }

    fn config_str(&self, priv_data: &[u8]) -> String {
        if priv_data.is_empty() {
            "(default)".to_string()
        } else {
            String::from_utf8_lossy(priv_data).into_owned()
        }
    }
}

/// Build a registry holding one [`ModeledProtocol`] per model file entry.
pub fn registry_from_model(cfg: &ModelConfig) -> Result<ProtoRegistry> {
    let mut registry = ProtoRegistry::new();
    for model in &cfg.protocols {
        registry.register(Box::new(ModeledProtocol::from_model(model)))?;
    }
    Ok(registry)
}
