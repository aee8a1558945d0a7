use bytes::Bytes;

use crate::params::SelectParam;
use crate::proto::ProtoId;

use super::collect::ProtoInit;

/// The chosen protocol for one threshold interval, with everything the
/// send path needs to use it.
#[derive(Debug, Clone, Copy)]
pub struct ProtoConfig {
    pub param: SelectParam,
    pub proto_id: ProtoId,
    priv_offset: usize,
    priv_len: usize,
}

/// One interval of the threshold table: `config` services every message
/// length up to and including `max_msg_length`.
#[derive(Debug, Clone, Copy)]
pub struct ThreshEntry {
    pub max_msg_length: usize,
    pub config: ProtoConfig,
}

/// Immutable selection result for one parameter combination: the threshold
/// table plus the buffer owning every referenced private configuration.
#[derive(Debug)]
pub struct SelectElem {
    thresholds: Box<[ThreshEntry]>,
    priv_buf: Bytes,
}

impl SelectElem {
    /// Resolve collected thresholds into the owned result, mapping each
    /// winner to its private sub-slice. Consumes the collection scratch;
    /// its buffer freezes into the element.
    pub(crate) fn assemble(
        init: ProtoInit,
        param: SelectParam,
        entries: Vec<(usize, ProtoId)>,
    ) -> SelectElem {
        let thresholds = entries
            .into_iter()
            .map(|(max_msg_length, proto_id)| {
                let (priv_offset, priv_len) = init.priv_offsets[proto_id.index()];
                ThreshEntry {
                    max_msg_length,
                    config: ProtoConfig { param, proto_id, priv_offset, priv_len },
                }
            })
            .collect();
        SelectElem { thresholds, priv_buf: init.priv_buf.freeze() }
    }

    /// The parameters this element was selected for.
    pub fn param(&self) -> SelectParam {
        self.thresholds[0].config.param
    }

    pub fn thresholds(&self) -> &[ThreshEntry] {
        &self.thresholds
    }

    /// The protocol servicing `msg_length`: first entry whose bound covers
    /// it. A linear scan; tables are short, and the terminal `usize::MAX`
    /// entry always matches.
    pub fn thresholds_search(&self, msg_length: usize) -> &ProtoConfig {
        for entry in self.thresholds.iter() {
            if msg_length <= entry.max_msg_length {
                return &entry.config;
            }
        }
        unreachable!("threshold table is not terminated")
    }

    /// Private configuration written by the chosen protocol's `init`.
    pub fn config_priv(&self, config: &ProtoConfig) -> &[u8] {
        &self.priv_buf[config.priv_offset..config.priv_offset + config.priv_len]
    }
}
