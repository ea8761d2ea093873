//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Order invariance — output is byte-identical for any worker count and chunk size
//! 2. Line count — one line per complete record
//! 3. Truncation — a trailing partial record changes nothing

mod common;

use proptest::prelude::*;
use std::num::NonZeroUsize;

use common::{archive, header, rate};
use hst2csv_core::{Pipeline, PipelineConfig, RateInfo, TimestampStyle, RECORD_SIZE};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_rate() -> impl Strategy<Value = RateInfo> {
    (
        any::<u32>(),
        -1e6..1e6_f64,
        -1e6..1e6_f64,
        -1e6..1e6_f64,
        -1e6..1e6_f64,
        0.0..1e9_f64,
    )
        .prop_map(|(t, o, l, h, c, v)| rate(t, o, l, h, c, v))
}

fn arb_rates() -> impl Strategy<Value = Vec<RateInfo>> {
    prop::collection::vec(arb_rate(), 0..200)
}

fn convert(input: &[u8], workers: usize, chunk_records: usize) -> Vec<u8> {
    let pipeline = Pipeline::new(
        PipelineConfig::default()
            .with_workers(NonZeroUsize::new(workers).unwrap())
            .with_chunk_records(chunk_records)
            .with_timestamps(TimestampStyle::Utc),
    )
    .unwrap();
    let mut out = Vec::new();
    pipeline.run(input, &mut out, |_| {}).unwrap();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn output_is_invariant_under_concurrency(
        rates in arb_rates(),
        workers in 2usize..12,
        chunk_records in 1usize..9,
    ) {
        let input = archive(&header(), &rates);
        let sequential = convert(&input, 1, chunk_records);
        let parallel = convert(&input, workers, chunk_records);
        prop_assert_eq!(parallel, sequential);
    }

    #[test]
    fn chunk_size_does_not_change_output(rates in arb_rates(), a in 1usize..20, b in 1usize..20) {
        let input = archive(&header(), &rates);
        prop_assert_eq!(convert(&input, 4, a), convert(&input, 4, b));
    }

    #[test]
    fn one_line_per_record_in_input_order(rates in arb_rates(), workers in 1usize..8) {
        let input = archive(&header(), &rates);
        let text = String::from_utf8(convert(&input, workers, 3)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        prop_assert_eq!(lines.len(), rates.len());
        for (line, r) in lines.iter().zip(&rates) {
            let fields: Vec<&str> = line.split(',').collect();
            prop_assert_eq!(fields.len(), 6);
            prop_assert_eq!(fields[0].to_string(), TimestampStyle::Utc.format(r.ctm));
            prop_assert_eq!(fields[1].parse::<f64>().unwrap(), r.open);
            prop_assert_eq!(fields[5].parse::<f64>().unwrap(), r.vol);
        }
    }

    #[test]
    fn trailing_partial_record_is_dropped(
        rates in arb_rates(),
        tail in prop::collection::vec(any::<u8>(), 1..RECORD_SIZE),
        workers in 1usize..8,
    ) {
        let whole = archive(&header(), &rates);
        let mut ragged = whole.clone();
        ragged.extend_from_slice(&tail);
        prop_assert_eq!(convert(&ragged, workers, 4), convert(&whole, workers, 4));
    }
}
