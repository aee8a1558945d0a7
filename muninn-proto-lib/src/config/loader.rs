use std::fs;
use std::path::Path;

use crate::config::ModelConfig;
use crate::error::{Result, SelectError};
use crate::proto::MAX_PROTOCOLS;

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<ModelConfig> {
    let txt = fs::read_to_string(p)
        .map_err(|e| SelectError::Config(format!("Failed to read model file: {e}")))?;
    let cfg: ModelConfig = toml::from_str(&txt)
        .map_err(|e| SelectError::Config(format!("Failed to parse model file: {e}")))?;

    validate_model(&cfg)?;

    Ok(cfg)
}

fn validate_model(cfg: &ModelConfig) -> Result<()> {
    if cfg.protocols.is_empty() {
        return Err(SelectError::Config("model file defines no protocols".to_string()));
    }
    if cfg.protocols.len() > MAX_PROTOCOLS {
        return Err(SelectError::Config(format!(
            "model file defines {} protocols, at most {MAX_PROTOCOLS} fit a registry",
            cfg.protocols.len()
        )));
    }

    let mut names: Vec<&str> = cfg.protocols.iter().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
        return Err(SelectError::Config(format!("duplicate protocol name: {}", dup[0])));
    }

    for proto in &cfg.protocols {
        if proto.ranges.is_empty() {
            return Err(SelectError::Config(format!(
                "protocol {} has no cost ranges",
                proto.name
            )));
        }
        let mut prev = None;
        for range in &proto.ranges {
            if let Some(prev) = prev {
                if range.max_length <= prev {
                    return Err(SelectError::Config(format!(
                        "protocol {}: range bounds must be strictly increasing",
                        proto.name
                    )));
                }
            }
            if !(range.overhead.is_finite() && range.overhead >= 0.0) {
                return Err(SelectError::Config(format!(
                    "protocol {}: overhead must be a non-negative number of seconds",
                    proto.name
                )));
            }
            if !(range.bandwidth.is_finite() && range.bandwidth > 0.0) {
                return Err(SelectError::Config(format!(
                    "protocol {}: bandwidth must be a positive number of bytes/second",
                    proto.name
                )));
            }
            prev = Some(range.max_length);
        }
        let last = proto.ranges[proto.ranges.len() - 1].max_length;
        if last < proto.min_length {
            return Err(SelectError::Config(format!(
                "protocol {}: ranges end before min_length",
                proto.name
            )));
        }
    }

    Ok(())
}
