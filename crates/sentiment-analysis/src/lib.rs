pub mod hype;
pub mod lexicon;

pub use hype::{aggregate, HypeWeights};
pub use lexicon::{score_text, LexiconScorer, NEGATIVE_TERMS, POSITIVE_TERMS};
