use hype_core::{CategoryStats, HypeResult, ScoredPost, SentimentLabel};
use serde::{Deserialize, Serialize};

/// Multipliers applied to each bucket's weighted score.
///
/// Negative sentiment is penalized harder than positive sentiment is
/// rewarded, and neutral chatter only nudges the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HypeWeights {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    /// Divisor applied to `log10(followers + 1)`.
    pub follower_damping: f64,
}

impl Default for HypeWeights {
    fn default() -> Self {
        Self {
            positive: 100.0,
            neutral: 20.0,
            negative: 70.0,
            follower_damping: 5.0,
        }
    }
}

/// Aggregate scored posts into a 0-100 hype score with the default weights.
pub fn aggregate(posts: &[ScoredPost]) -> HypeResult {
    aggregate_with(posts, &HypeWeights::default())
}

pub fn aggregate_with(posts: &[ScoredPost], weights: &HypeWeights) -> HypeResult {
    if posts.is_empty() {
        return HypeResult::neutral();
    }

    let [positive, neutral, negative] = SentimentLabel::ALL.map(|label| {
        let bucket: Vec<&ScoredPost> = posts
            .iter()
            .filter(|p| SentimentLabel::from_score(p.sentiment) == label)
            .collect();
        bucket_stats(label, &bucket, weights.follower_damping)
    });

    let raw = positive.weighted_score * weights.positive
        + neutral.weighted_score * weights.neutral
        - negative.weighted_score.abs() * weights.negative;
    let score = (HypeResult::NEUTRAL_SCORE + raw).clamp(0.0, 100.0);

    tracing::debug!(
        posts = posts.len(),
        positive = positive.post_count,
        neutral = neutral.post_count,
        negative = negative.post_count,
        score,
        "aggregated hype"
    );

    HypeResult {
        score,
        breakdown: [positive, neutral, negative],
    }
}

fn bucket_stats(label: SentimentLabel, bucket: &[&ScoredPost], damping: f64) -> CategoryStats {
    if bucket.is_empty() {
        return CategoryStats::empty(label);
    }

    // Summing in sorted order makes the mean independent of input order.
    let mut sentiments: Vec<f64> = bucket.iter().map(|p| p.sentiment).collect();
    sentiments.sort_by(f64::total_cmp);
    let avg_sentiment = sentiments.iter().sum::<f64>() / sentiments.len() as f64;

    let total_followers = bucket
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(p.post.author_followers));
    let weight = (total_followers as f64 + 1.0).log10() / damping;

    CategoryStats {
        category: label,
        avg_sentiment,
        weight,
        weighted_score: avg_sentiment * weight,
        total_followers,
        post_count: bucket.len(),
    }
}
