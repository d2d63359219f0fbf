use hype_core::{Post, ScoredPost, SentimentLabel};

pub const POSITIVE_TERMS: &[&str] = &[
    "bullish", "buy", "up", "gain", "profit", "positive", "good", "great", "excellent", "grow",
    "growth", "increase", "beat", "strong", "outperform", "opportunity", "potential", "upside",
];

pub const NEGATIVE_TERMS: &[&str] = &[
    "bearish", "sell", "down", "loss", "negative", "bad", "poor", "decline", "decrease", "drop",
    "fall", "miss", "weak", "underperform", "risk", "overvalued", "downside",
];

/// Hits needed to move the score by 1.0, so one hit is worth 0.1.
const HITS_PER_UNIT: f64 = 10.0;

/// Keyword-counting sentiment scorer.
///
/// Terms match as case-insensitive substrings, so "upside" also counts as
/// "up" and "growth" as "grow". Every occurrence counts.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    positive_words: Vec<String>,
    negative_words: Vec<String>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new(POSITIVE_TERMS, NEGATIVE_TERMS)
    }
}

impl LexiconScorer {
    pub fn new(positive: &[&str], negative: &[&str]) -> Self {
        let normalize = |terms: &[&str]| -> Vec<String> {
            terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            positive_words: normalize(positive),
            negative_words: normalize(negative),
        }
    }

    /// Net hit count: positive occurrences minus negative occurrences.
    pub fn net_hits(&self, text: &str) -> i64 {
        let lowered = text.to_lowercase();
        let count = |terms: &[String]| -> i64 {
            terms.iter().map(|t| lowered.matches(t.as_str()).count() as i64).sum()
        };
        count(&self.positive_words) - count(&self.negative_words)
    }

    /// Score in `[-1, 1]`, 0.1 per hit.
    pub fn score(&self, text: &str) -> f64 {
        let score = self.net_hits(text) as f64 / HITS_PER_UNIT;
        score.clamp(-1.0, 1.0)
    }

    pub fn score_post(&self, post: Post) -> ScoredPost {
        let sentiment = self.score(&post.text);
        ScoredPost {
            post,
            sentiment,
            sentiment_label: SentimentLabel::from_score(sentiment),
        }
    }

    pub fn score_posts(&self, posts: Vec<Post>) -> Vec<ScoredPost> {
        posts.into_iter().map(|p| self.score_post(p)).collect()
    }
}

/// Scores `text` with the default lexicons.
pub fn score_text(text: &str) -> f64 {
    LexiconScorer::default().score(text)
}
