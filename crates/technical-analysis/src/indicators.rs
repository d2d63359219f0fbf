//! Batch indicator functions over a close-price slice.
//!
//! Every function returns one value per input element and only looks at
//! `data[..=i]` for index `i`. Moving windows use the available-window rule:
//! before `period` samples exist, the window is whatever history there is.

use hype_core::stats::{mean, population_std_dev};

pub(crate) fn window_start(i: usize, period: usize) -> usize {
    (i + 1).saturating_sub(period.max(1))
}

pub(crate) fn ema_step(value: f64, prev: f64, k: f64) -> f64 {
    value * k + prev * (1.0 - k)
}

pub(crate) fn smoothing(period: usize) -> f64 {
    2.0 / (period.max(1) as f64 + 1.0)
}

/// Simple Moving Average over the trailing `min(period, i + 1)` values.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    (0..data.len())
        .map(|i| mean(&data[window_start(i, period)..=i]))
        .collect()
}

/// Exponential Moving Average seeded with the first value.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let k = smoothing(period);
    let mut result = Vec::with_capacity(data.len());
    for (i, &value) in data.iter().enumerate() {
        let next = if i == 0 {
            value
        } else {
            ema_step(value, result[i - 1], k)
        };
        result.push(next);
    }
    result
}

/// RSI at index `i` from the trailing `min(period, i)` deltas.
pub(crate) fn rsi_at(data: &[f64], i: usize, period: usize) -> f64 {
    let lookback = period.max(1).min(i);
    if lookback == 0 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for j in (i + 1 - lookback)..=i {
        let change = data[j] - data[j - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / lookback as f64;
    let avg_loss = losses / lookback as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Relative Strength Index (simple averages, no Wilder smoothing). 50 on the first bar.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    (0..data.len()).map(|i| rsi_at(data, i, period)).collect()
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Fast and slow EMAs are full recursive chains seeded with `data[0]`; the
/// signal line is the same EMA applied to the MACD line.
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| fast - slow)
        .collect();
    let signal_line = ema(&macd_line, signal_period);
    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// `sma ± width·σ` with the population standard deviation of the same window.
pub fn bollinger_bands(data: &[f64], period: usize, width: f64) -> BollingerBands {
    let mut upper = Vec::with_capacity(data.len());
    let mut middle = Vec::with_capacity(data.len());
    let mut lower = Vec::with_capacity(data.len());

    for i in 0..data.len() {
        let window = &data[window_start(i, period)..=i];
        let mid = mean(window);
        let sd = population_std_dev(window);
        upper.push(mid + width * sd);
        middle.push(mid);
        lower.push(mid - width * sd);
    }

    BollingerBands { upper, middle, lower }
}
