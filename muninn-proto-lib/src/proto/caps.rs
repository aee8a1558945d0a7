use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// Affine cost model for one capability range: estimated seconds to move
/// `x` bytes is `overhead + per_byte * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perf {
    /// Fixed cost in seconds.
    pub overhead: f64,
    /// Cost per byte in seconds.
    pub per_byte: f64,
}

impl Perf {
    pub const ZERO: Perf = Perf { overhead: 0.0, per_byte: 0.0 };

    pub fn new(overhead: f64, per_byte: f64) -> Self {
        Perf { overhead, per_byte }
    }

    /// Perf from fixed overhead and bandwidth in bytes/second.
    pub fn from_bandwidth(overhead: f64, bandwidth: f64) -> Self {
        Perf { overhead, per_byte: 1.0 / bandwidth }
    }

    pub fn estimate(&self, length: f64) -> f64 {
        self.overhead + self.per_byte * length
    }

    /// Modeled bandwidth in bytes/second; infinite for a pure-overhead range.
    pub fn bandwidth(&self) -> f64 {
        if self.per_byte > 0.0 {
            1.0 / self.per_byte
        } else {
            f64::INFINITY
        }
    }

    fn is_valid(&self) -> bool {
        self.overhead.is_finite()
            && self.per_byte.is_finite()
            && self.overhead >= 0.0
            && self.per_byte >= 0.0
    }
}

/// One contiguous interval of message lengths a protocol models with a
/// single affine cost. The interval starts where the previous range (or
/// the protocol's `min_length`) ends.
#[derive(Debug, Clone, Copy)]
pub struct PerfRange {
    /// Inclusive upper bound; `usize::MAX` for an unbounded tail range.
    pub max_length: usize,
    pub perf: Perf,
}

/// User override for one protocol's selection threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CfgThresh {
    /// Let the cost model decide.
    #[default]
    Auto,
    /// Protocol disabled for all message lengths.
    Inf,
    /// Protocol disabled below `T` bytes and forced on from `T` upward.
    At(usize),
}

impl CfgThresh {
    pub fn is_auto(&self) -> bool {
        *self == CfgThresh::Auto
    }
}

impl FromStr for CfgThresh {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(CfgThresh::Auto),
            "inf" | "infinity" => Ok(CfgThresh::Inf),
            _ => parse_size(s).map(CfgThresh::At),
        }
    }
}

impl fmt::Display for CfgThresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgThresh::Auto => f.write_str("auto"),
            CfgThresh::Inf => f.write_str("inf"),
            CfgThresh::At(t) => f.write_str(&format_size(*t)),
        }
    }
}

impl<'de> Deserialize<'de> for CfgThresh {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ThreshVisitor;

        impl Visitor<'_> for ThreshVisitor {
            type Value = CfgThresh;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"auto\", \"inf\", or a byte size such as 4096 or \"16k\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<CfgThresh, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<CfgThresh, E> {
                Ok(CfgThresh::At(v as usize))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<CfgThresh, E> {
                if v < 0 {
                    return Err(E::custom("threshold cannot be negative"));
                }
                Ok(CfgThresh::At(v as usize))
            }
        }

        deserializer.deserialize_any(ThreshVisitor)
    }
}

/// Parse a byte size with an optional k/m/g suffix, e.g. `"512"`, `"16k"`,
/// `"2m"`. `"inf"` maps to `usize::MAX`.
pub fn parse_size(s: &str) -> std::result::Result<usize, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("inf") {
        return Ok(usize::MAX);
    }
    let (digits, shift) = match s.as_bytes().last() {
        Some(b'k') | Some(b'K') => (&s[..s.len() - 1], 10),
        Some(b'm') | Some(b'M') => (&s[..s.len() - 1], 20),
        Some(b'g') | Some(b'G') => (&s[..s.len() - 1], 30),
        _ => (s, 0),
    };
    let value: usize = digits
        .parse()
        .map_err(|_| format!("invalid byte size: {s}"))?;
    value
        .checked_shl(shift)
        .filter(|_| value.leading_zeros() as usize >= shift as usize)
        .ok_or_else(|| format!("byte size overflows: {s}"))
}

/// Render a byte size the way `parse_size` reads it.
pub fn format_size(size: usize) -> String {
    const K: usize = 1 << 10;
    const M: usize = 1 << 20;
    const G: usize = 1 << 30;
    if size == usize::MAX {
        "inf".to_string()
    } else if size >= G && size % G == 0 {
        format!("{}g", size / G)
    } else if size >= M && size % M == 0 {
        format!("{}m", size / M)
    } else if size >= K && size % K == 0 {
        format!("{}k", size / K)
    } else {
        size.to_string()
    }
}

/// Capability record one protocol reports for a parameter combination.
#[derive(Debug, Clone, Default)]
pub struct ProtoCaps {
    /// Smallest message length the protocol can service.
    pub min_length: usize,
    /// Cost model ranges, partitioning `[min_length, last max_length]`
    /// with strictly increasing bounds.
    pub ranges: Vec<PerfRange>,
    /// User threshold override, honored by the threshold builder.
    pub cfg_thresh: CfgThresh,
}

impl ProtoCaps {
    pub fn new(min_length: usize, ranges: Vec<PerfRange>, cfg_thresh: CfgThresh) -> Self {
        ProtoCaps { min_length, ranges, cfg_thresh }
    }

    /// The range containing `msg_length`, if the protocol covers it.
    pub fn range_at(&self, msg_length: usize) -> Option<&PerfRange> {
        if msg_length < self.min_length {
            return None;
        }
        self.ranges.iter().find(|r| msg_length <= r.max_length)
    }

    /// Check the plugin contract: at least one range, strictly increasing
    /// bounds starting at or after `min_length`, non-negative finite costs.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let first = match self.ranges.first() {
            Some(r) => r,
            None => return Err("capability record has no ranges".to_string()),
        };
        if first.max_length < self.min_length {
            return Err(format!(
                "first range ends at {} before min_length {}",
                first.max_length, self.min_length
            ));
        }
        let mut prev = first.max_length;
        for r in &self.ranges[1..] {
            if r.max_length <= prev {
                return Err(format!(
                    "range bounds not strictly increasing at {}",
                    r.max_length
                ));
            }
            prev = r.max_length;
        }
        for r in &self.ranges {
            if !r.perf.is_valid() {
                return Err(format!(
                    "range {} has an invalid cost model",
                    format_size(r.max_length)
                ));
            }
        }
        Ok(())
    }
}
