use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::proto::{parse_size, CfgThresh};

/// Declarative protocol cost models, loaded from a TOML model file.
///
/// ```toml
/// [[protocol]]
/// name = "eager-copy"
/// threshold = "auto"
///
/// [[protocol.range]]
/// max_length = "inf"
/// overhead = 1.0e-6
/// bandwidth = 1.0e9
/// ```
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    #[serde(default, rename = "protocol")]
    pub protocols: Vec<ProtocolModel>,
}

/// Cost model and overrides for one protocol.
#[derive(Debug, Deserialize)]
pub struct ProtocolModel {
    pub name: String,
    /// Smallest message length the protocol services
    /// Default: 0
    #[serde(default, deserialize_with = "de_size")]
    pub min_length: usize,
    /// User threshold override: "auto", "inf", or a byte size
    /// Default: "auto"
    #[serde(default)]
    pub threshold: CfgThresh,
    /// Free-form configuration rendered in dumps
    #[serde(default)]
    pub config: String,
    /// Cost model ranges, listed in increasing `max_length` order
    #[serde(default, rename = "range")]
    pub ranges: Vec<RangeModel>,
}

/// One affine cost range of a protocol model.
#[derive(Debug, Deserialize)]
pub struct RangeModel {
    /// Inclusive upper bound; "inf" for an unbounded tail range
    #[serde(deserialize_with = "de_size")]
    pub max_length: usize,
    /// Fixed cost in seconds
    pub overhead: f64,
    /// Modeled bandwidth in bytes/second
    pub bandwidth: f64,
}

/// Byte sizes in the model file may be integers or strings with a k/m/g
/// suffix; "inf" reads as `usize::MAX`.
fn de_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    struct SizeVisitor;

    impl Visitor<'_> for SizeVisitor {
        type Value = usize;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte size such as 4096, \"16k\", or \"inf\"")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<usize, E> {
            parse_size(v).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<usize, E> {
            Ok(v as usize)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<usize, E> {
            if v < 0 {
                return Err(E::custom("byte size cannot be negative"));
            }
            Ok(v as usize)
        }
    }

    deserializer.deserialize_any(SizeVisitor)
}
