use std::sync::Arc;

use muninn_proto_lib::{CfgThresh, ProtoSelect, SelectElem, Worker};

use crate::support::{param, param_with_sg, worker_of, TestProto};

/// Deterministic generator for protocol sets; a tiny LCG keeps the suite
/// reproducible without a randomness dependency.
struct Gen(u64);

impl Gen {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    /// Uniform-ish float in `[0, scale)`.
    fn float(&mut self, scale: f64) -> f64 {
        (self.next() >> 11) as f64 / (1u64 << 53) as f64 * scale
    }

    fn range(&mut self, lo: usize, hi: usize) -> usize {
        lo + (self.next() as usize) % (hi - lo)
    }
}

fn random_lines(gen: &mut Gen, count: usize) -> Vec<TestProto> {
    (0..count)
        .map(|i| {
            TestProto::line(
                &format!("proto{i}"),
                gen.float(1.0e-4),
                gen.float(1.0e-8),
            )
        })
        .collect()
}

fn build(worker: &Worker) -> Arc<SelectElem> {
    ProtoSelect::new()
        .lookup_slow(worker, 0, 0, &param())
        .unwrap_or_else(|e| panic!("selection failed: {e}"))
}

/// Message lengths worth probing in a table: interval edges and interiors.
fn sample_lengths(elem: &SelectElem) -> Vec<usize> {
    let mut lengths = vec![0];
    let mut lower = 0usize;
    for entry in elem.thresholds() {
        let hi = entry.max_msg_length;
        lengths.push(lower);
        lengths.push(lower.saturating_add(1));
        lengths.push(lower / 2 + hi / 2);
        if hi != usize::MAX {
            lengths.push(hi.saturating_sub(1));
            lengths.push(hi);
            lower = hi + 1;
        }
    }
    lengths.push(usize::MAX);
    lengths
}

#[test]
fn tables_are_monotonic_and_terminated() {
    let mut gen = Gen(7);
    for _ in 0..50 {
        let count = gen.range(1, 7);
        let worker = worker_of(random_lines(&mut gen, count));
        let elem = build(&worker);

        let thresholds = elem.thresholds();
        assert!(!thresholds.is_empty());
        for pair in thresholds.windows(2) {
            assert!(pair[0].max_msg_length < pair[1].max_msg_length);
        }
        assert_eq!(
            thresholds[thresholds.len() - 1].max_msg_length,
            usize::MAX,
            "table must be terminated"
        );
    }
}

#[test]
fn adjacent_entries_carry_distinct_protocols() {
    let mut gen = Gen(11);
    for _ in 0..50 {
        let count = gen.range(2, 7);
        let worker = worker_of(random_lines(&mut gen, count));
        let elem = build(&worker);

        for pair in elem.thresholds().windows(2) {
            assert_ne!(
                pair[0].config.proto_id, pair[1].config.proto_id,
                "coalescing left adjacent duplicates"
            );
        }
    }
}

#[test]
fn interior_lengths_select_the_cheapest_line() {
    let mut gen = Gen(13);
    for _ in 0..30 {
        let count = gen.range(2, 7);
        let lines: Vec<(f64, f64)> = (0..count)
            .map(|_| (gen.float(1.0e-4), gen.float(1.0e-8)))
            .collect();
        let worker = worker_of(
            lines
                .iter()
                .enumerate()
                .map(|(i, &(c, m))| TestProto::line(&format!("proto{i}"), c, m))
                .collect(),
        );
        let elem = build(&worker);

        let mut lower = 0usize;
        for entry in elem.thresholds() {
            let hi = entry.max_msg_length;
            // interior points: at least one byte away from the handoffs,
            // where the half-byte evaluation shift cannot flip the order
            let mut points = vec![lower];
            if hi != usize::MAX {
                points.push(hi.saturating_sub(1).max(lower));
                points.push((lower + (hi - lower) / 2).max(lower));
            } else {
                points.push(lower.saturating_mul(2).max(lower.saturating_add(1)));
            }
            for &len in &points {
                if hi != usize::MAX && len + 1 > hi {
                    continue;
                }
                let x = len as f64 + 0.5;
                let min = lines
                    .iter()
                    .map(|&(c, m)| c + m * x)
                    .fold(f64::INFINITY, f64::min);
                let chosen = elem.thresholds_search(len);
                let (c, m) = lines[chosen.proto_id.index()];
                assert!(
                    c + m * x <= min,
                    "length {len}: chosen line is not the pointwise minimum"
                );
            }
            if hi == usize::MAX {
                break;
            }
            lower = hi + 1;
        }
    }
}

#[test]
fn finite_threshold_forces_and_withholds() {
    let thresh = 4096usize;
    let worker = worker_of(vec![
        TestProto::line("eager", 1.0e-6, 1.0e-9),
        TestProto::line("mid", 3.0e-6, 5.0e-10),
        TestProto::line("forced", 1.0e-5, 1.0e-10).with_thresh(CfgThresh::At(thresh)),
    ]);
    let elem = build(&worker);

    for len in [0, 1, 1024, thresh - 1] {
        assert_ne!(
            elem.thresholds_search(len).proto_id.index(),
            2,
            "length {len} is below the forced threshold"
        );
    }
    for len in [thresh, thresh + 1, 1 << 20, usize::MAX] {
        assert_eq!(
            elem.thresholds_search(len).proto_id.index(),
            2,
            "length {len} must use the forced protocol"
        );
    }
}

#[test]
fn disabled_protocols_are_absent_from_every_table() {
    let mut gen = Gen(17);
    for _ in 0..20 {
        let count = gen.range(2, 6);
        let disabled = gen.range(0, count);
        let protos: Vec<TestProto> = (0..count)
            .map(|i| {
                let proto =
                    TestProto::line(&format!("proto{i}"), gen.float(1.0e-4), gen.float(1.0e-8));
                if i == disabled {
                    proto.with_thresh(CfgThresh::Inf)
                } else {
                    proto
                }
            })
            .collect();
        let worker = worker_of(protos);
        let elem = build(&worker);
        for len in sample_lengths(&elem) {
            assert_ne!(elem.thresholds_search(len).proto_id.index(), disabled);
        }
    }
}

#[test]
fn fast_path_stays_coherent_across_growth() {
    let worker = worker_of(vec![
        TestProto::line("eager", 1.0e-6, 1.0e-9),
        TestProto::line("rndv", 1.0e-5, 1.0e-10),
    ]);
    let mut select = ProtoSelect::new();
    let mut seen = Vec::new();

    // enough distinct keys to force several rehashes of the map
    for sg in 0..120 {
        let key = param_with_sg(sg);
        let elem = select
            .lookup_slow(&worker, 0, 0, &key)
            .unwrap_or_else(|e| panic!("selection failed: {e}"));
        seen.push((key, elem));

        for (old_key, old_elem) in &seen {
            if let Some(fast) = select.lookup_fast(old_key) {
                assert!(
                    Arc::ptr_eq(&fast, old_elem),
                    "fast path returned a stale element"
                );
            }
        }
    }
    assert_eq!(select.len(), 120);

    // every cached element is still reachable and identical via slow lookup
    for (key, elem) in &seen {
        let again = select
            .lookup_slow(&worker, 0, 0, key)
            .unwrap_or_else(|e| panic!("selection failed: {e}"));
        assert!(Arc::ptr_eq(&again, elem));
    }
}

#[test]
fn drop_releases_every_element() {
    let eager = TestProto::line("eager", 1.0e-6, 1.0e-9);
    let init_calls = eager.counter();
    let worker = worker_of(vec![eager]);

    let mut select = ProtoSelect::new();
    let mut weaks = Vec::new();
    for sg in 0..10 {
        let elem = select
            .lookup_slow(&worker, 0, 0, &param_with_sg(sg))
            .unwrap_or_else(|e| panic!("selection failed: {e}"));
        weaks.push(Arc::downgrade(&elem));
    }
    assert_eq!(init_calls.load(std::sync::atomic::Ordering::Relaxed), 10);

    // repeated lookups come from the cache, not from re-initialization
    let _ = select
        .lookup_slow(&worker, 0, 0, &param_with_sg(0))
        .unwrap_or_else(|e| panic!("selection failed: {e}"));
    assert_eq!(init_calls.load(std::sync::atomic::Ordering::Relaxed), 10);

    drop(select);
    for weak in weaks {
        assert!(weak.upgrade().is_none(), "element leaked past drop");
    }
}
