use std::iter::FusedIterator;

use hype_core::stats::{mean, population_std_dev, round2};
use hype_core::{IndicatorBar, PriceBar, PriceSeries, TimeRange};
use serde::{Deserialize, Serialize};

use crate::indicators::{ema_step, rsi_at, smoothing, window_start};

/// How indicators behave before their nominal window is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmUpPolicy {
    /// Use whatever history exists (values from the first bar).
    #[default]
    AvailableWindow,
    /// Emit `None` until the full window is available.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSettings {
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Band half-width in standard deviations around `sma_short`.
    pub band_width: f64,
    pub warm_up: WarmUpPolicy,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            ema_period: 10,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            band_width: 2.0,
            warm_up: WarmUpPolicy::AvailableWindow,
        }
    }
}

impl IndicatorSettings {
    pub fn strict() -> Self {
        Self {
            warm_up: WarmUpPolicy::Strict,
            ..Self::default()
        }
    }
}

/// Computes indicator bars for price series.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    settings: IndicatorSettings,
}

impl IndicatorEngine {
    pub fn new(settings: IndicatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    /// Lazily yields one `IndicatorBar` per bar, oldest first.
    pub fn compute<'a>(&self, series: &'a PriceSeries) -> IndicatorStream<'a> {
        IndicatorStream::new(series.bars(), self.settings.clone())
    }
}

/// Indicators with default settings.
pub fn compute_indicators(series: &PriceSeries) -> IndicatorStream<'_> {
    IndicatorStream::new(series.bars(), IndicatorSettings::default())
}

pub fn collect_indicators(series: &PriceSeries) -> Vec<IndicatorBar> {
    compute_indicators(series).collect()
}

/// Trailing `range.days()` bars, after indicators were computed on the full history.
pub fn window_bars(bars: &[IndicatorBar], range: TimeRange) -> &[IndicatorBar] {
    let start = bars.len().saturating_sub(range.days());
    &bars[start..]
}

/// Incremental indicator computation over a borrowed bar slice.
///
/// Recursive state (EMA, MACD chains) is carried unrounded; only emitted
/// values are rounded to two decimals.
pub struct IndicatorStream<'a> {
    bars: &'a [PriceBar],
    closes: Vec<f64>,
    settings: IndicatorSettings,
    next: usize,
    ema: f64,
    fast: f64,
    slow: f64,
    signal: f64,
}

impl<'a> IndicatorStream<'a> {
    pub fn new(bars: &'a [PriceBar], settings: IndicatorSettings) -> Self {
        Self {
            bars,
            closes: Vec::with_capacity(bars.len()),
            settings,
            next: 0,
            ema: 0.0,
            fast: 0.0,
            slow: 0.0,
            signal: 0.0,
        }
    }

    fn ready(&self, i: usize, needed: usize) -> bool {
        match self.settings.warm_up {
            WarmUpPolicy::AvailableWindow => true,
            WarmUpPolicy::Strict => i + 1 >= needed.max(1),
        }
    }

    fn emit(&self, i: usize, needed: usize, value: f64) -> Option<f64> {
        self.ready(i, needed).then(|| round2(value))
    }
}

impl Iterator for IndicatorStream<'_> {
    type Item = IndicatorBar;

    fn next(&mut self) -> Option<IndicatorBar> {
        let bar = *self.bars.get(self.next)?;
        let i = self.next;
        self.next += 1;
        self.closes.push(bar.close);
        let s = &self.settings;

        if i == 0 {
            self.ema = bar.close;
            self.fast = bar.close;
            self.slow = bar.close;
            self.signal = 0.0;
        } else {
            self.ema = ema_step(bar.close, self.ema, smoothing(s.ema_period));
            self.fast = ema_step(bar.close, self.fast, smoothing(s.macd_fast));
            self.slow = ema_step(bar.close, self.slow, smoothing(s.macd_slow));
            self.signal = ema_step(self.fast - self.slow, self.signal, smoothing(s.macd_signal));
        }
        let macd = self.fast - self.slow;
        let histogram = macd - self.signal;

        let short_window = &self.closes[window_start(i, s.sma_short)..];
        let sma_short = mean(short_window);
        let band = s.band_width * population_std_dev(short_window);
        let sma_long = mean(&self.closes[window_start(i, s.sma_long)..]);
        let rsi = rsi_at(&self.closes, i, s.rsi_period);

        let (short_n, long_n, ema_n) = (s.sma_short, s.sma_long, s.ema_period);
        let rsi_n = s.rsi_period + 1;
        let macd_n = s.macd_slow.max(s.macd_fast);
        let signal_n = macd_n + s.macd_signal.saturating_sub(1);

        Some(IndicatorBar {
            bar,
            sma20: self.emit(i, short_n, sma_short),
            sma50: self.emit(i, long_n, sma_long),
            ema: self.emit(i, ema_n, self.ema),
            rsi: self.emit(i, rsi_n, rsi),
            macd: self.emit(i, macd_n, macd),
            macd_signal: self.emit(i, signal_n, self.signal),
            macd_histogram: self.emit(i, signal_n, histogram),
            upper_band: self.emit(i, short_n, sma_short + band),
            lower_band: self.emit(i, short_n, sma_short - band),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bars.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndicatorStream<'_> {}

impl FusedIterator for IndicatorStream<'_> {}
