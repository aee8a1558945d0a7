use std::io::{self, Write};

use crate::proto::format_size;
use crate::worker::Worker;

use super::cache::ProtoSelect;
use super::collect::collect_caps;

/// Write a human-readable report of every cached selection: the chosen
/// threshold table first, then the full candidate matrix of every protocol
/// that initialized successfully for those parameters.
///
/// The candidate matrix re-runs capability collection into a local scratch
/// rather than reaching into cached state.
pub fn dump<W: Write>(
    worker: &Worker,
    ep_cfg_index: usize,
    rkey_cfg_index: usize,
    select: &ProtoSelect,
    out: &mut W,
) -> io::Result<()> {
    if select.is_empty() {
        return writeln!(out, "(no cached selections)");
    }

    for elem in select.elems() {
        let param = elem.param();
        writeln!(out, "{param}")?;

        writeln!(out, "  selected:")?;
        let mut lower = 0usize;
        for entry in elem.thresholds() {
            let config = &entry.config;
            let (name, rendered) = match worker.registry().get(config.proto_id) {
                Some(proto) => (proto.name(), proto.config_str(elem.config_priv(config))),
                None => ("?", String::new()),
            };
            writeln!(
                out,
                "    {:>8}..{:<8} {name} {rendered}",
                format_size(lower),
                format_size(entry.max_msg_length),
            )?;
            lower = entry.max_msg_length.saturating_add(1);
        }

        writeln!(out, "  candidates:")?;
        match collect_caps(worker, ep_cfg_index, rkey_cfg_index, param) {
            Ok(init) => {
                for id in init.mask.iter() {
                    let caps = match init.caps_of(id) {
                        Some(caps) => caps,
                        None => continue,
                    };
                    let proto = match worker.registry().get(id) {
                        Some(proto) => proto,
                        None => continue,
                    };
                    writeln!(
                        out,
                        "    {} (threshold: {}) {}",
                        proto.name(),
                        caps.cfg_thresh,
                        proto.config_str(init.priv_of(id)),
                    )?;
                    let mut lower = caps.min_length;
                    for range in &caps.ranges {
                        // the unbounded tail has no end to price; probe it
                        // one gigabyte past its start instead
                        let probe = if range.max_length == usize::MAX {
                            lower.saturating_add(1 << 30)
                        } else {
                            range.max_length
                        };
                        writeln!(
                            out,
                            "      {:>8}..{:<8} {} {}",
                            format_size(lower),
                            format_size(range.max_length),
                            format_time(range.perf.estimate(probe as f64)),
                            format_bandwidth(range.perf.bandwidth()),
                        )?;
                        lower = range.max_length.saturating_add(1);
                    }
                }
            }
            Err(err) => {
                writeln!(out, "    (none: {err})")?;
            }
        }
    }

    Ok(())
}

fn format_time(seconds: f64) -> String {
    if seconds >= 1.0 {
        format!("{seconds:.2}s")
    } else if seconds >= 1e-3 {
        format!("{:.2}ms", seconds * 1e3)
    } else if seconds >= 1e-6 {
        format!("{:.2}us", seconds * 1e6)
    } else {
        format!("{:.0}ns", seconds * 1e9)
    }
}

fn format_bandwidth(bytes_per_sec: f64) -> String {
    if bytes_per_sec.is_infinite() {
        "inf".to_string()
    } else if bytes_per_sec >= 1e9 {
        format!("{:.2}GB/s", bytes_per_sec / 1e9)
    } else if bytes_per_sec >= 1e6 {
        format!("{:.2}MB/s", bytes_per_sec / 1e6)
    } else {
        format!("{:.0}B/s", bytes_per_sec)
    }
}
