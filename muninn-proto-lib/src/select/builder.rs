use tracing::warn;

use crate::error::{Result, SelectError};
use crate::params::SelectParam;
use crate::proto::{CfgThresh, Perf, ProtoMask, MAX_PROTOCOLS};

use super::collect::ProtoInit;
use super::elem::SelectElem;
use super::envelope::{select_best, ThreshList};

/// One step of the outer sweep: candidate masks and the widest upper bound
/// for the interval starting at `msg_length` on which they are constant.
struct NextRange {
    valid: ProtoMask,
    forced: ProtoMask,
    max_length: usize,
}

/// Narrow the candidate set at `msg_length`.
///
/// A protocol is valid when one of its capability ranges contains
/// `msg_length`. The interval's upper bound is the nearest of: any valid
/// protocol's containing-range end, and any finite user threshold still
/// ahead (below its threshold a protocol is withheld from the valid set,
/// from it upward its bit appears in `forced`). `CfgThresh::Inf` removes a
/// protocol outright. `perf` is filled with each valid protocol's affine
/// cost for its containing range.
fn select_next(
    init: &ProtoInit,
    msg_length: usize,
    perf: &mut [Perf; MAX_PROTOCOLS],
) -> NextRange {
    let mut valid = ProtoMask::EMPTY;
    let mut forced = ProtoMask::EMPTY;
    let mut max_length = usize::MAX;

    for id in init.mask.iter() {
        let caps = match init.caps_of(id) {
            Some(caps) => caps,
            None => continue,
        };
        match caps.cfg_thresh {
            CfgThresh::Inf => continue,
            CfgThresh::At(thresh) if thresh <= msg_length => forced.set(id),
            _ => {}
        }
        let range = match caps.range_at(msg_length) {
            Some(range) => range,
            None => continue,
        };
        if let CfgThresh::At(thresh) = caps.cfg_thresh {
            if thresh > msg_length {
                max_length = max_length.min(thresh - 1);
                continue;
            }
        }
        valid.set(id);
        perf[id.index()] = range.perf;
        max_length = max_length.min(range.max_length);
    }

    NextRange { valid, forced, max_length }
}

/// Smallest length any enabled protocol can service, used to place the
/// start of the sweep when nothing covers length zero.
fn first_supported_length(init: &ProtoInit) -> Option<usize> {
    init.mask
        .iter()
        .filter_map(|id| init.caps_of(id))
        .filter(|caps| caps.cfg_thresh != CfgThresh::Inf)
        .map(|caps| caps.min_length)
        .min()
}

/// Sweep message lengths from zero upward, emitting the winning protocol
/// for each interval until an interval ending at `usize::MAX` is emitted.
fn build_thresholds(init: &ProtoInit, param: &SelectParam) -> Result<ThreshList> {
    let mut list = ThreshList::new();
    let mut perf = [Perf::ZERO; MAX_PROTOCOLS];
    let mut msg_length = 0usize;

    loop {
        let next = select_next(init, msg_length, &mut perf);
        let forced_valid = next.forced & next.valid;
        let active = if forced_valid.is_empty() { next.valid } else { forced_valid };

        if active.is_empty() {
            // A table may begin past zero when every protocol needs a
            // minimum message size; a hole anywhere else is fatal.
            if msg_length == 0 {
                if let Some(first) = first_supported_length(init).filter(|&len| len > 0) {
                    msg_length = first;
                    continue;
                }
            }
            warn!(param = %param, msg_length, "no protocol available");
            return Err(SelectError::Unsupported {
                param: param.to_string(),
                msg_length,
            });
        }

        select_best(&mut list, active, &perf, msg_length, next.max_length);
        if next.max_length == usize::MAX {
            return Ok(list);
        }
        msg_length = next.max_length + 1;
    }
}

/// Run the threshold builder over collected capabilities and move the
/// results, private buffer included, into an immutable `SelectElem`.
pub(crate) fn build_elem(init: ProtoInit, param: SelectParam) -> Result<SelectElem> {
    let list = build_thresholds(&init, &param)?;
    Ok(SelectElem::assemble(init, param, list.into_entries()))
}
