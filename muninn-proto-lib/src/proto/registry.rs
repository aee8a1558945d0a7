use std::fmt;

use crate::error::{InitError, SelectError};
use crate::params::SelectParam;
use crate::worker::Worker;

use super::caps::ProtoCaps;

/// Upper bound on the private configuration one protocol may write during
/// `init`. The capability collector sizes its scratch buffer with this.
pub const MAX_PRIV: usize = 1024;

/// Most protocols a registry can hold: one bit per id in a mask word.
pub const MAX_PROTOCOLS: usize = 64;

/// Index of a protocol in its registry. Small enough to live in a mask word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtoId(u8);

impl ProtoId {
    pub(crate) fn new(index: u8) -> Self {
        ProtoId(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProtoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a protocol may consult while probing support for one
/// parameter combination. The worker and the endpoint/remote-key
/// configuration indices are passed through untouched; the selection core
/// attaches no meaning to them.
pub struct InitRequest<'a> {
    pub worker: &'a Worker,
    pub ep_cfg_index: usize,
    pub rkey_cfg_index: usize,
    pub param: SelectParam,
}

/// A candidate transport strategy.
///
/// `init` probes one parameter combination: on success it reports the
/// protocol's capability record and writes whatever private configuration
/// the send path will need into `priv_buf` (at most [`MAX_PRIV`] bytes),
/// returning the number of bytes written. An error excludes the protocol
/// for these parameters and nothing else.
pub trait Protocol: Send + Sync {
    /// Short name used in logs and dumps.
    fn name(&self) -> &str;

    fn init(
        &self,
        req: &InitRequest<'_>,
        priv_buf: &mut [u8],
    ) -> std::result::Result<(ProtoCaps, usize), InitError>;

    /// Human-readable rendering of the private configuration `init` wrote.
    fn config_str(&self, priv_data: &[u8]) -> String;
}

/// Registry of candidate protocols, fixed for the lifetime of a worker.
/// Identity is the registration index.
#[derive(Default)]
pub struct ProtoRegistry {
    protocols: Vec<Box<dyn Protocol>>,
}

impl ProtoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, proto: Box<dyn Protocol>) -> crate::error::Result<ProtoId> {
        if self.protocols.len() >= MAX_PROTOCOLS {
            return Err(SelectError::Registry(format!(
                "registry is full ({MAX_PROTOCOLS} protocols)"
            )));
        }
        if self.protocols.iter().any(|p| p.name() == proto.name()) {
            return Err(SelectError::Registry(format!(
                "duplicate protocol name: {}",
                proto.name()
            )));
        }
        let id = ProtoId(self.protocols.len() as u8);
        self.protocols.push(proto);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    pub fn get(&self, id: ProtoId) -> Option<&dyn Protocol> {
        self.protocols.get(id.index()).map(Box::as_ref)
    }

    /// Protocols with their ids, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProtoId, &dyn Protocol)> {
        self.protocols
            .iter()
            .enumerate()
            .map(|(i, p)| (ProtoId(i as u8), p.as_ref()))
    }
}

impl fmt::Debug for ProtoRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.protocols.iter().map(|p| p.name()))
            .finish()
    }
}
