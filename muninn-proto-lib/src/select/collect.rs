use bytes::BytesMut;
use tracing::debug;

use crate::error::{Result, SelectError};
use crate::params::SelectParam;
use crate::proto::{InitRequest, ProtoCaps, ProtoId, ProtoMask, MAX_PRIV};
use crate::worker::Worker;

/// Scratch state of one capability collection pass.
///
/// Owns the private buffer until threshold construction succeeds, at which
/// point the buffer moves into the `SelectElem`; on any failure the whole
/// struct is simply dropped.
pub(crate) struct ProtoInit {
    pub mask: ProtoMask,
    caps: Vec<Option<ProtoCaps>>,
    /// `(offset, len)` into `priv_buf`, indexed by protocol id. Only
    /// entries whose bit is set in `mask` are meaningful.
    pub priv_offsets: Vec<(usize, usize)>,
    pub priv_buf: BytesMut,
}

impl ProtoInit {
    pub fn caps_of(&self, id: ProtoId) -> Option<&ProtoCaps> {
        self.caps.get(id.index()).and_then(|c| c.as_ref())
    }

    pub fn priv_of(&self, id: ProtoId) -> &[u8] {
        let (offset, len) = self.priv_offsets[id.index()];
        &self.priv_buf[offset..offset + len]
    }
}

/// Ask every registered protocol whether it supports `param`, gathering the
/// capability records and packing the private configurations of the ones
/// that do into a single buffer.
pub(crate) fn collect_caps(
    worker: &Worker,
    ep_cfg_index: usize,
    rkey_cfg_index: usize,
    param: SelectParam,
) -> Result<ProtoInit> {
    let count = worker.registry().len();
    let mut priv_buf = BytesMut::zeroed(count * MAX_PRIV);
    let mut caps: Vec<Option<ProtoCaps>> = (0..count).map(|_| None).collect();
    let mut priv_offsets = vec![(0usize, 0usize); count];
    let mut mask = ProtoMask::EMPTY;
    let mut offset = 0usize;

    let req = InitRequest { worker, ep_cfg_index, rkey_cfg_index, param };
    for (id, proto) in worker.registry().iter() {
        let slot = &mut priv_buf[offset..offset + MAX_PRIV];
        match proto.init(&req, slot) {
            Ok((proto_caps, priv_size)) if priv_size <= MAX_PRIV => {
                if let Err(reason) = proto_caps.validate() {
                    debug!(proto = proto.name(), %param, %reason, "invalid capability record");
                    continue;
                }
                priv_offsets[id.index()] = (offset, priv_size);
                offset += priv_size;
                caps[id.index()] = Some(proto_caps);
                mask.set(id);
            }
            Ok((_, priv_size)) => {
                debug!(
                    proto = proto.name(),
                    %param,
                    priv_size,
                    "private config exceeds MAX_PRIV"
                );
            }
            Err(err) => {
                debug!(proto = proto.name(), %param, %err, "protocol opted out");
            }
        }
    }

    if mask.is_empty() {
        debug!(%param, "no protocol supports the selection parameters");
        return Err(SelectError::NoProtocols);
    }

    priv_buf.truncate(offset);
    Ok(ProtoInit { mask, caps, priv_offsets, priv_buf })
}
