//! Keyword sentiment scorer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score for empty text and the starting point for every scan.
pub const NEUTRAL_SCORE: u8 = 50;

/// Points added per positive keyword found.
pub const POSITIVE_WEIGHT: i32 = 10;

/// Points subtracted per negative keyword found.
pub const NEGATIVE_WEIGHT: i32 = 20;

/// Scores strictly above this are POSITIVE.
pub const POSITIVE_THRESHOLD: u8 = 65;

/// Scores strictly below this are NEGATIVE.
pub const NEGATIVE_THRESHOLD: u8 = 35;

/// Keywords that raise the score. Matched as lowercase substrings.
pub const POSITIVE_KEYWORDS: &[&str] = &[
    "thank",
    "great",
    "excellent",
    "awesome",
    "amazing",
    "love",
    "perfect",
    "happy",
    "appreciate",
    "wonderful",
    "fantastic",
    "helpful",
];

/// Keywords that lower the score. Matched as lowercase substrings.
pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "terrible",
    "awful",
    "horrible",
    "angry",
    "disappointed",
    "unacceptable",
    "refund",
    "worst",
    "broken",
    "cancel",
    "complaint",
    "frustrated",
    "useless",
    "problem",
];

/// Sentiment label derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Label for a score in 0..=100.
    pub fn from_score(score: u8) -> Self {
        if score > POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if score < NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Storage form ("POSITIVE", "NEUTRAL", "NEGATIVE").
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::Negative => "NEGATIVE",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored label string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sentiment label: {0}")]
pub struct ParseLabelError(pub String);

impl FromStr for SentimentLabel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POSITIVE" => Ok(SentimentLabel::Positive),
            "NEUTRAL" => Ok(SentimentLabel::Neutral),
            "NEGATIVE" => Ok(SentimentLabel::Negative),
            other => Err(ParseLabelError(other.to_string())),
        }
    }
}

/// A sentiment score with its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Score in 0..=100; 50 is neutral.
    pub score: u8,
    /// Label derived from `score`.
    pub label: SentimentLabel,
}

impl Sentiment {
    /// The result for absent or empty text.
    pub const NEUTRAL: Sentiment = Sentiment {
        score: NEUTRAL_SCORE,
        label: SentimentLabel::Neutral,
    };

    fn from_raw(raw: i32) -> Self {
        let score = raw.clamp(0, 100) as u8;
        Self {
            score,
            label: SentimentLabel::from_score(score),
        }
    }
}

impl Default for Sentiment {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Score a message body.
///
/// Each keyword counts once, however often it occurs.
pub fn score(text: Option<&str>) -> Sentiment {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Sentiment::NEUTRAL;
    };

    let lower = text.to_lowercase();
    let positives = POSITIVE_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .count() as i32;
    let negatives = NEGATIVE_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .count() as i32;

    Sentiment::from_raw(
        i32::from(NEUTRAL_SCORE) + positives * POSITIVE_WEIGHT - negatives * NEGATIVE_WEIGHT,
    )
}
