//! Price tick schedule and tick rounding.
//!
//! | last price        | tick |
//! |-------------------|------|
//! | < 100             | 1    |
//! | 100 .. 500        | 2    |
//! | 500 .. 1 000      | 5    |
//! | 1 000 .. 10 000   | 10   |
//! | 10 000 .. 50 000  | 50   |
//! | >= 50 000         | 100  |

const TICK_BANDS: [(f64, i64); 5] = [
    (100.0, 1),
    (500.0, 2),
    (1_000.0, 5),
    (10_000.0, 10),
    (50_000.0, 50),
];
const TOP_TICK: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundDirection {
    Down,
    Up,
    Nearest,
}

/// Tick size for the band `price` falls in. Non-finite prices get the
/// smallest tick.
pub fn tick_size(price: f64) -> i64 {
    if !price.is_finite() {
        return 1;
    }
    TICK_BANDS
        .iter()
        .find(|(upper, _)| price < *upper)
        .map(|(_, tick)| *tick)
        .unwrap_or(TOP_TICK)
}

pub fn round_to_tick(price: f64, tick: i64, direction: RoundDirection) -> i64 {
    if tick <= 0 {
        return price.round() as i64;
    }
    let t = tick as f64;
    let steps = price / t;
    let steps = match direction {
        RoundDirection::Down => steps.floor(),
        RoundDirection::Up => steps.ceil(),
        RoundDirection::Nearest => steps.round(),
    };
    steps as i64 * tick
}

pub fn is_on_tick(price: i64, tick: i64) -> bool {
    tick > 0 && price % tick == 0
}
