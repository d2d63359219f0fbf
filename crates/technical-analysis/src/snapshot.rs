use chrono::NaiveDate;
use hype_core::IndicatorBar;
use serde::{Deserialize, Serialize};

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi >= RSI_OVERBOUGHT {
            RsiZone::Overbought
        } else if rsi <= RSI_OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdTrend {
    Bullish,
    Bearish,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    AboveUpper,
    Inside,
    BelowLower,
}

/// Key indicator readings for the most recent bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub macd_trend: Option<MacdTrend>,
    pub band_position: Option<BandPosition>,
    pub above_sma50: Option<bool>,
}

impl IndicatorSnapshot {
    /// `None` for an empty slice.
    pub fn from_bars(bars: &[IndicatorBar]) -> Option<Self> {
        let last = bars.last()?;
        let close = last.close();

        let macd_trend = last.macd_histogram.map(|h| {
            if h > 0.0 {
                MacdTrend::Bullish
            } else if h < 0.0 {
                MacdTrend::Bearish
            } else {
                MacdTrend::Flat
            }
        });

        let band_position = match (last.upper_band, last.lower_band) {
            (Some(upper), _) if close > upper => Some(BandPosition::AboveUpper),
            (_, Some(lower)) if close < lower => Some(BandPosition::BelowLower),
            (Some(_), Some(_)) => Some(BandPosition::Inside),
            _ => None,
        };

        Some(Self {
            date: last.date(),
            close,
            rsi: last.rsi,
            rsi_zone: last.rsi.map(RsiZone::from_rsi),
            macd_trend,
            band_position,
            above_sma50: last.sma50.map(|sma| close > sma),
        })
    }
}
