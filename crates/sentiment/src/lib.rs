//! Sentiment scoring and alert rules.
//!
//! Everything in this crate is pure: no I/O, no clocks, no randomness. The
//! same text always produces the same score, label and alert drafts.
//!
//! # Example
//!
//! ```rust
//! use sentiment::{score, AlertRules, SentimentLabel};
//!
//! let sentiment = score(Some("the delay is terrible"));
//! assert_eq!(sentiment.label, SentimentLabel::Negative);
//!
//! let drafts = AlertRules::default().evaluate(Some("the delay is terrible"), &sentiment);
//! assert_eq!(drafts.len(), 2);
//! ```

mod rules;
mod scorer;

pub use rules::{AlertDraft, AlertKind, AlertRules};
pub use scorer::{
    score, ParseLabelError, Sentiment, SentimentLabel, NEGATIVE_KEYWORDS, NEGATIVE_THRESHOLD,
    NEGATIVE_WEIGHT, NEUTRAL_SCORE, POSITIVE_KEYWORDS, POSITIVE_THRESHOLD, POSITIVE_WEIGHT,
};
