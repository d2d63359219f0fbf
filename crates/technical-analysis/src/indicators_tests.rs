#[cfg(test)]
mod tests {
    use super::super::engine::*;
    use super::super::indicators::*;
    use super::super::snapshot::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::{Duration, NaiveDate};
    use hype_core::stats::round2;
    use hype_core::{IndicatorBar, PriceBar, PriceSeries, TimeRange};

    // Helper function to create a series from closes
    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000 + i as u64,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn wavy_closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin() + i as f64 * 0.2)
            .collect()
    }

    #[test]
    fn test_sma_available_window() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 5);
        assert_relative_eq!(result[0], 1.0); // only one sample
        assert_relative_eq!(result[1], 1.5); // (1+2)/2
        assert_relative_eq!(result[2], 2.0); // (1+2+3)/3
        assert_relative_eq!(result[3], 3.0);
        assert_relative_eq!(result[4], 4.0);
    }

    #[test]
    fn test_ema_seeded_with_first_close() {
        // k = 2 / (3 + 1) = 0.5
        let result = ema(&[10.0, 20.0, 20.0], 3);
        assert_relative_eq!(result[0], 10.0);
        assert_relative_eq!(result[1], 15.0);
        assert_relative_eq!(result[2], 17.5);
    }

    #[test]
    fn test_rsi_first_bar_is_neutral() {
        let result = rsi(&[42.0], 14);
        assert_eq!(result, vec![50.0]);
    }

    #[test]
    fn test_rsi_extremes() {
        let up = rsi(&[1.0, 2.0, 3.0], 14);
        assert_relative_eq!(up[2], 100.0);

        let down = rsi(&[3.0, 2.0, 1.0], 14);
        assert_relative_eq!(down[2], 0.0);
    }

    #[test]
    fn test_rsi_uses_available_deltas() {
        // deltas +2, -1 over two bars: avg gain 1.0, avg loss 0.5, RS 2
        let result = rsi(&[10.0, 12.0, 11.0], 14);
        assert_relative_eq!(result[2], 100.0 - 100.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rsi_flat_series_reports_100() {
        let result = rsi(&[5.0, 5.0, 5.0], 14);
        assert_relative_eq!(result[2], 100.0);
    }

    #[test]
    fn test_rsi_trailing_window_drops_old_deltas() {
        // A large early drop falls out of a 2-period window
        let result = rsi(&[10.0, 1.0, 2.0, 3.0], 2);
        assert_relative_eq!(result[3], 100.0);
        assert!(result[2] < 50.0);
    }

    #[test]
    fn test_macd_constant_series_is_zero() {
        let data = vec![50.0; 40];
        let result = macd(&data, 12, 26, 9);
        assert_eq!(result.macd_line.len(), 40);
        assert!(result.macd_line.iter().all(|v| v.abs() < 1e-12));
        assert!(result.signal_line.iter().all(|v| v.abs() < 1e-12));
        assert!(result.histogram.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_macd_rising_series_is_positive() {
        let data: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let result = macd(&data, 12, 26, 9);
        assert_eq!(result.macd_line[0], 0.0);
        assert!(result.macd_line[59] > 0.0);
        // The signal lags the MACD line in a steady trend
        assert!(result.histogram[59] > 0.0);
    }

    #[test]
    fn test_bollinger_population_std_dev() {
        let bands = bollinger_bands(&[1.0, 3.0], 20, 2.0);
        // mean 2, population sd 1
        assert_relative_eq!(bands.middle[1], 2.0);
        assert_relative_eq!(bands.upper[1], 4.0);
        assert_relative_eq!(bands.lower[1], 0.0);
        // single sample has zero width
        assert_relative_eq!(bands.upper[0], bands.lower[0]);
    }

    #[test]
    fn test_stream_length_matches_input() {
        for n in [0usize, 1, 2, 19, 20, 50, 120] {
            let series = series_from_closes(&wavy_closes(n));
            let stream = compute_indicators(&series);
            assert_eq!(stream.len(), n);
            assert_eq!(stream.count(), n);
        }
    }

    #[test]
    fn test_empty_series_yields_nothing() {
        let series = PriceSeries::empty("NONE");
        assert!(collect_indicators(&series).is_empty());
    }

    #[test]
    fn test_stream_matches_batch_functions() {
        let closes = wavy_closes(80);
        let series = series_from_closes(&closes);
        let bars = collect_indicators(&series);

        let sma20 = sma(&closes, 20);
        let sma50 = sma(&closes, 50);
        let ema10 = ema(&closes, 10);
        let rsi14 = rsi(&closes, 14);
        let macd = macd(&closes, 12, 26, 9);
        let bands = bollinger_bands(&closes, 20, 2.0);

        for (i, bar) in bars.iter().enumerate() {
            assert_eq!(bar.sma20, Some(round2(sma20[i])));
            assert_eq!(bar.sma50, Some(round2(sma50[i])));
            assert_eq!(bar.ema, Some(round2(ema10[i])));
            assert_eq!(bar.rsi, Some(round2(rsi14[i])));
            assert_eq!(bar.macd, Some(round2(macd.macd_line[i])));
            assert_eq!(bar.macd_signal, Some(round2(macd.signal_line[i])));
            assert_eq!(bar.macd_histogram, Some(round2(macd.histogram[i])));
            assert_eq!(bar.upper_band, Some(round2(bands.upper[i])));
            assert_eq!(bar.lower_band, Some(round2(bands.lower[i])));
        }
    }

    #[test]
    fn test_no_look_ahead() {
        let closes = wavy_closes(90);
        let full = collect_indicators(&series_from_closes(&closes));

        for k in [1usize, 5, 20, 26, 60] {
            let prefix = collect_indicators(&series_from_closes(&closes[..k]));
            assert_eq!(prefix[..], full[..k]);
        }
    }

    #[test]
    fn test_rsi_bounds_and_band_ordering() {
        let series = series_from_closes(&wavy_closes(200));
        for bar in compute_indicators(&series) {
            let rsi = bar.rsi.unwrap();
            assert!((0.0..=100.0).contains(&rsi));
            let (upper, mid, lower) = (
                bar.upper_band.unwrap(),
                bar.sma20.unwrap(),
                bar.lower_band.unwrap(),
            );
            assert!(upper >= mid && mid >= lower);
        }
    }

    #[test]
    fn test_values_rounded_to_two_decimals() {
        let series = series_from_closes(&[10.123, 10.456, 10.789]);
        for bar in compute_indicators(&series) {
            let sma = bar.sma20.unwrap();
            assert_abs_diff_eq!(sma * 100.0, (sma * 100.0).round(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_volume_and_prices_pass_through() {
        let series = series_from_closes(&wavy_closes(10));
        for (bar, source) in compute_indicators(&series).zip(series.bars()) {
            assert_eq!(bar.bar, *source);
            assert_eq!(bar.volume(), source.volume);
        }
    }

    #[test]
    fn test_recomputation_is_identical() {
        let series = series_from_closes(&wavy_closes(70));
        let first: Vec<IndicatorBar> = compute_indicators(&series).collect();
        let second: Vec<IndicatorBar> = compute_indicators(&series).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_strict_warm_up_nulls_until_window_full() {
        let series = series_from_closes(&wavy_closes(60));
        let bars: Vec<IndicatorBar> = IndicatorEngine::new(IndicatorSettings::strict())
            .compute(&series)
            .collect();

        assert!(bars[18].sma20.is_none());
        assert!(bars[19].sma20.is_some());
        assert!(bars[19].upper_band.is_some());
        assert!(bars[48].sma50.is_none());
        assert!(bars[49].sma50.is_some());
        assert!(bars[8].ema.is_none());
        assert!(bars[9].ema.is_some());
        assert!(bars[13].rsi.is_none());
        assert!(bars[14].rsi.is_some());
        assert!(bars[24].macd.is_none());
        assert!(bars[25].macd.is_some());
        assert!(bars[32].macd_signal.is_none());
        assert!(bars[33].macd_signal.is_some());
        assert!(bars[33].macd_histogram.is_some());
    }

    #[test]
    fn test_strict_values_match_available_window_once_warm() {
        let series = series_from_closes(&wavy_closes(60));
        let relaxed = collect_indicators(&series);
        let strict: Vec<IndicatorBar> = IndicatorEngine::new(IndicatorSettings::strict())
            .compute(&series)
            .collect();
        assert_eq!(strict[55].sma50, relaxed[55].sma50);
        assert_eq!(strict[55].macd_signal, relaxed[55].macd_signal);
    }

    #[test]
    fn test_window_bars_keeps_tail() {
        let bars = collect_indicators(&series_from_closes(&wavy_closes(40)));
        let week = window_bars(&bars, TimeRange::OneWeek);
        assert_eq!(week.len(), 7);
        assert_eq!(week.last(), bars.last());
        assert_eq!(window_bars(&bars, TimeRange::OneYear).len(), 40);
    }

    #[test]
    fn test_snapshot_of_latest_bar() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
        let bars = collect_indicators(&series_from_closes(&closes));
        let snapshot = IndicatorSnapshot::from_bars(&bars).unwrap();

        assert_eq!(snapshot.close, 89.0);
        assert_eq!(snapshot.rsi_zone, Some(RsiZone::Overbought));
        assert_eq!(snapshot.macd_trend, Some(MacdTrend::Bullish));
        assert_eq!(snapshot.above_sma50, Some(true));
        assert!(IndicatorSnapshot::from_bars(&[]).is_none());
    }

    #[test]
    fn test_snapshot_of_falling_series() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 - i as f64).collect();
        let bars = collect_indicators(&series_from_closes(&closes));
        let snapshot = IndicatorSnapshot::from_bars(&bars).unwrap();

        assert_eq!(snapshot.rsi, Some(0.0));
        assert_eq!(snapshot.rsi_zone, Some(RsiZone::Oversold));
        assert_eq!(snapshot.macd_trend, Some(MacdTrend::Bearish));
        // A steady slide stays within two standard deviations.
        assert_eq!(snapshot.band_position, Some(BandPosition::Inside));
        assert_eq!(snapshot.above_sma50, Some(false));
    }

    #[test]
    fn test_snapshot_band_breakouts() {
        let mut closes = vec![100.0; 30];
        closes.push(120.0);
        let bars = collect_indicators(&series_from_closes(&closes));
        let spike = IndicatorSnapshot::from_bars(&bars).unwrap();
        assert_eq!(spike.band_position, Some(BandPosition::AboveUpper));
        assert_eq!(spike.macd_trend, Some(MacdTrend::Bullish));

        closes[30] = 80.0;
        let bars = collect_indicators(&series_from_closes(&closes));
        let drop = IndicatorSnapshot::from_bars(&bars).unwrap();
        assert_eq!(drop.band_position, Some(BandPosition::BelowLower));
        assert_eq!(drop.macd_trend, Some(MacdTrend::Bearish));
    }

    #[test]
    fn test_snapshot_of_flat_series() {
        let bars = collect_indicators(&series_from_closes(&[50.0; 30]));
        let snapshot = IndicatorSnapshot::from_bars(&bars).unwrap();
        assert_eq!(snapshot.macd_trend, Some(MacdTrend::Flat));
        assert_eq!(snapshot.band_position, Some(BandPosition::Inside));
        assert_eq!(snapshot.above_sma50, Some(false));
    }

    #[test]
    fn test_rsi_zone_thresholds() {
        assert_eq!(RsiZone::from_rsi(70.0), RsiZone::Overbought);
        assert_eq!(RsiZone::from_rsi(30.0), RsiZone::Oversold);
        assert_eq!(RsiZone::from_rsi(50.0), RsiZone::Neutral);
    }

    #[test]
    fn test_indicator_bar_serializes_flat() {
        let bars = collect_indicators(&series_from_closes(&[10.0, 11.0]));
        let json = serde_json::to_value(&bars[1]).unwrap();

        assert_eq!(json["date"], "2024-01-02");
        assert_eq!(json["close"], 11.0);
        assert_eq!(json["sma20"], 10.5);
        assert!(json.get("bar").is_none());
    }
}
