//! Formatting helpers for dashboard consumers.

use serde::{Deserialize, Serialize};

use crate::sentiment::SentimentLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Direction arrow for a `[-1, 1]` sentiment score.
pub fn sentiment_trend(score: f64) -> Trend {
    match SentimentLabel::from_score(score) {
        SentimentLabel::Positive => Trend::Up,
        SentimentLabel::Negative => Trend::Down,
        SentimentLabel::Neutral => Trend::Neutral,
    }
}

/// Maps a `[-1, 1]` score onto `0..=100`.
pub fn sentiment_percentage(score: f64) -> u8 {
    ((score + 1.0) * 50.0).round().clamp(0.0, 100.0) as u8
}

/// `$2.45T`, `$310.20B`, `$45.00M`, or the plain dollar amount below a million.
pub fn format_market_cap(usd: f64) -> String {
    let abs = usd.abs();
    if abs >= 1e12 {
        format!("${:.2}T", usd / 1e12)
    } else if abs >= 1e9 {
        format!("${:.2}B", usd / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", usd / 1e6)
    } else {
        format!("${}", group_thousands(usd.round() as i64))
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

/// Percent change from `previous` to `current`; 0 when there is no base.
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trend_uses_shared_thresholds() {
        assert_eq!(sentiment_trend(0.5), Trend::Up);
        assert_eq!(sentiment_trend(0.2), Trend::Neutral);
        assert_eq!(sentiment_trend(-0.3), Trend::Down);
    }

    #[test]
    fn test_sentiment_percentage() {
        assert_eq!(sentiment_percentage(-1.0), 0);
        assert_eq!(sentiment_percentage(0.0), 50);
        assert_eq!(sentiment_percentage(0.25), 63);
        assert_eq!(sentiment_percentage(1.0), 100);
        assert_eq!(sentiment_percentage(3.0), 100);
    }

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(2.45e12), "$2.45T");
        assert_eq!(format_market_cap(310.2e9), "$310.20B");
        assert_eq!(format_market_cap(45e6), "$45.00M");
        assert_eq!(format_market_cap(1234.4), "$1,234");
        assert_eq!(format_market_cap(999.0), "$999");
    }

    #[test]
    fn test_percentage_change() {
        assert_relative_eq!(percentage_change(110.0, 100.0), 10.0);
        assert_relative_eq!(percentage_change(90.0, 100.0), -10.0);
        assert_eq!(percentage_change(5.0, 0.0), 0.0);
    }
}
