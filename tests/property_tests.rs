//! Property tests for scoring and pick invariants.
//!
//! Uses proptest to verify:
//! 1. Score bounds: the composite score stays in [0, 100] and matches its formula
//! 2. Resolver determinism: same table, same mapping; close and volume never coincide
//! 3. Target repair: buy < last < sell, both on the tick grid of `last`
//! 4. Tick rounding brackets the input price

use marketscore::domain::column_resolver::resolve_columns;
use marketscore::domain::market_strength::{
    SkipReason, SymbolOutcome, SymbolSignals, composite_score, summarize,
};
use marketscore::domain::picks::settle_targets;
use marketscore::domain::series::RawTable;
use marketscore::domain::tick::{RoundDirection, is_on_tick, round_to_tick, tick_size};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_outcome() -> impl Strategy<Value = SymbolOutcome> {
    prop_oneof![
        4 => (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(b, v, m)| {
            SymbolOutcome::Used(SymbolSignals {
                breadth: b,
                volume: v,
                momentum: m,
            })
        }),
        1 => (0usize..50).prop_map(|rows| {
            SymbolOutcome::Skipped(SkipReason::TooFewRows { rows, minimum: 51 })
        }),
    ]
}

fn arb_headers() -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(
        vec![
            "date", "Ngày", "close", "Giá đóng cửa", "open", "high", "volume", "KL",
            "Khối lượng", "ticker", "value", "misc",
        ],
        1..6,
    )
    .prop_shuffle()
    .prop_map(|headers| headers.into_iter().map(str::to_string).collect::<Vec<String>>())
}

fn arb_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        (0.0..100_000.0_f64).prop_map(|v| format!("{:.0}", v)),
        (0.0..100.0_f64).prop_map(|v| format!("{:.2}", v)),
        Just(String::new()),
        Just("-".to_string()),
        Just("n/a".to_string()),
    ]
}

fn arb_table() -> impl Strategy<Value = RawTable> {
    arb_headers().prop_flat_map(|headers| {
        let width = headers.len();
        prop::collection::vec(prop::collection::vec(arb_cell(), width), 0..15)
            .prop_map(move |rows| RawTable::new(headers.clone(), rows))
    })
}

fn arb_last() -> impl Strategy<Value = f64> {
    (100.0..200_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

// ── 1. Score bounds ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_bounded_and_matches_formula(
        outcomes in prop::collection::vec(arb_outcome(), 0..40),
    ) {
        let named: Vec<(String, SymbolOutcome)> = outcomes
            .into_iter()
            .enumerate()
            .map(|(i, o)| (format!("S{i:02}"), o))
            .collect();
        let result = summarize(&named, named.len(), 50);

        prop_assert!((0.0..=100.0).contains(&result.score));
        prop_assert!(result.counts.used <= result.counts.total_files);
        prop_assert!(result.counts.breadth <= result.counts.used);
        let used = result.counts.used;
        if used == 0 {
            prop_assert_eq!(result.score, 0.0);
        } else {
            let share = |hits: usize| 100.0 * hits as f64 / used as f64;
            prop_assert_eq!(
                result.score,
                composite_score(
                    share(result.counts.breadth),
                    share(result.counts.vol),
                    share(result.counts.mom)
                )
            );
            prop_assert!((result.breadth_pct - share(result.counts.breadth)).abs() <= 0.005 + 1e-9);
        }
        prop_assert_eq!(
            result.skipped_sample.len(),
            result.counts.total_files - result.counts.used
        );
    }

    #[test]
    fn skipped_sample_respects_cap(
        outcomes in prop::collection::vec(arb_outcome(), 0..40),
        cap in 0usize..10,
    ) {
        let named: Vec<(String, SymbolOutcome)> = outcomes
            .into_iter()
            .enumerate()
            .map(|(i, o)| (format!("S{i:02}"), o))
            .collect();
        let result = summarize(&named, named.len(), cap);
        prop_assert!(result.skipped_sample.len() <= cap);
    }
}

// ── 2. Resolver determinism ──────────────────────────────────────────

proptest! {
    #[test]
    fn resolver_is_deterministic(table in arb_table()) {
        let first = resolve_columns(&table);
        let second = resolve_columns(&table.clone());
        prop_assert_eq!(&first, &second);

        if let (Some(close), Some(volume)) = (&first.close_column, &first.volume_column) {
            prop_assert_ne!(close, volume);
        }
        for column in first.close_column.iter().chain(first.volume_column.iter()) {
            prop_assert!(table.headers.contains(column));
        }
    }
}

// ── 3. Target repair ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn settled_targets_bracket_last_on_tick(
        last in arb_last(),
        buy_factor in 0.5..1.5_f64,
        sell_factor in 0.5..1.5_f64,
    ) {
        let (buy, sell) = settle_targets(last, last * buy_factor, last * sell_factor);
        let tick = tick_size(last);

        prop_assert!((buy as f64) < last);
        prop_assert!(last < sell as f64);
        prop_assert!(buy > 0);
        prop_assert!(is_on_tick(buy, tick));
        prop_assert!(is_on_tick(sell, tick));
    }
}

// ── 4. Tick rounding ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn rounding_brackets_price(price in 1.0..500_000.0_f64) {
        let tick = tick_size(price);
        let down = round_to_tick(price, tick, RoundDirection::Down);
        let up = round_to_tick(price, tick, RoundDirection::Up);
        let nearest = round_to_tick(price, tick, RoundDirection::Nearest);

        prop_assert!(down as f64 <= price);
        prop_assert!(price <= up as f64);
        prop_assert!(up - down <= tick);
        prop_assert!(nearest == down || nearest == up);
    }
}
