//! Alert rules applied to scored messages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scorer::{Sentiment, SentimentLabel};

/// Kind of alert surfaced to a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    Positive,
    Negative,
    Warning,
}

impl AlertKind {
    /// Storage form ("POSITIVE", "NEGATIVE", "WARNING").
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Positive => "POSITIVE",
            AlertKind::Negative => "NEGATIVE",
            AlertKind::Warning => "WARNING",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert produced by a rule, before it is tied to a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertDraft {
    pub kind: AlertKind,
    pub message: String,
    pub action_label: String,
}

/// The alert rule set.
///
/// Rules are independent: a single message can trigger any combination.
#[derive(Debug, Clone)]
pub struct AlertRules {
    /// Keywords that raise a WARNING alert (lowercase).
    pub escalation_keywords: Vec<String>,
    /// Scores strictly above this raise a POSITIVE alert.
    pub upsell_threshold: u8,
    /// Characters of message text quoted in a NEGATIVE alert.
    pub quote_chars: usize,
    pub negative_action: String,
    pub escalation_action: String,
    pub upsell_action: String,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            escalation_keywords: vec!["delay".to_string()],
            upsell_threshold: 90,
            quote_chars: 50,
            negative_action: "Reply now".to_string(),
            escalation_action: "Escalate to manager".to_string(),
            upsell_action: "Offer upgrade".to_string(),
        }
    }
}

impl AlertRules {
    /// Set the escalation keywords.
    pub fn with_escalation_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.escalation_keywords = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .collect();
        self
    }

    /// Set the score above which a POSITIVE alert is raised.
    pub fn with_upsell_threshold(mut self, threshold: u8) -> Self {
        self.upsell_threshold = threshold;
        self
    }

    /// Apply every rule to a scored message.
    pub fn evaluate(&self, text: Option<&str>, sentiment: &Sentiment) -> Vec<AlertDraft> {
        let text = text.unwrap_or("");
        let mut drafts = Vec::new();

        if sentiment.label == SentimentLabel::Negative {
            drafts.push(AlertDraft {
                kind: AlertKind::Negative,
                message: format!("Negative sentiment detected: \"{}\"", self.quote(text)),
                action_label: self.negative_action.clone(),
            });
        }

        let lower = text.to_lowercase();
        if let Some(keyword) = self
            .escalation_keywords
            .iter()
            .find(|k| !k.is_empty() && lower.contains(k.as_str()))
        {
            drafts.push(AlertDraft {
                kind: AlertKind::Warning,
                message: format!("Customer mentioned \"{}\": \"{}\"", keyword, self.quote(text)),
                action_label: self.escalation_action.clone(),
            });
        }

        if sentiment.score > self.upsell_threshold {
            drafts.push(AlertDraft {
                kind: AlertKind::Positive,
                message: format!("Very positive customer: \"{}\"", self.quote(text)),
                action_label: self.upsell_action.clone(),
            });
        }

        drafts
    }

    fn quote(&self, text: &str) -> String {
        let mut chars = text.chars();
        let prefix: String = chars.by_ref().take(self.quote_chars).collect();
        if chars.next().is_some() {
            format!("{}...", prefix)
        } else {
            prefix
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score;

    fn kinds(drafts: &[AlertDraft]) -> Vec<AlertKind> {
        drafts.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_neutral_message_raises_nothing() {
        let rules = AlertRules::default();
        let text = Some("When does the store open?");
        assert!(rules.evaluate(text, &score(text)).is_empty());
    }

    #[test]
    fn test_negative_message_raises_one_alert() {
        let rules = AlertRules::default();
        let text = Some("This service is terrible");
        let drafts = rules.evaluate(text, &score(text));
        assert_eq!(kinds(&drafts), [AlertKind::Negative]);
        assert_eq!(drafts[0].action_label, "Reply now");
        assert!(drafts[0].message.contains("This service is terrible"));
    }

    #[test]
    fn test_negative_with_escalation_keyword_raises_two() {
        let rules = AlertRules::default();
        let text = Some("Another DELAY? This is unacceptable");
        let drafts = rules.evaluate(text, &score(text));
        assert_eq!(kinds(&drafts), [AlertKind::Negative, AlertKind::Warning]);
        assert_eq!(drafts[1].action_label, "Escalate to manager");
    }

    #[test]
    fn test_escalation_keyword_alone() {
        let rules = AlertRules::default();
        let text = Some("Is there a delay on my order?");
        let drafts = rules.evaluate(text, &score(text));
        assert_eq!(kinds(&drafts), [AlertKind::Warning]);
    }

    #[test]
    fn test_very_positive_raises_upsell() {
        let rules = AlertRules::default();
        let text = Some("Thank you! Great, excellent, amazing, perfect service");
        let sentiment = score(text);
        assert!(sentiment.score > 90);
        let drafts = rules.evaluate(text, &sentiment);
        assert_eq!(kinds(&drafts), [AlertKind::Positive]);
        assert_eq!(drafts[0].action_label, "Offer upgrade");
    }

    #[test]
    fn test_positive_label_below_upsell_threshold() {
        let rules = AlertRules::default();
        let text = Some("Thanks, great job");
        let sentiment = score(text);
        assert_eq!(sentiment.label, SentimentLabel::Positive);
        assert!(rules.evaluate(text, &sentiment).is_empty());
    }

    #[test]
    fn test_quote_truncates_long_text() {
        let rules = AlertRules::default();
        let text = format!("terrible {}", "x".repeat(100));
        let drafts = rules.evaluate(Some(&text), &score(Some(&text)));
        let quoted = drafts[0]
            .message
            .trim_start_matches("Negative sentiment detected: \"")
            .trim_end_matches('"');
        assert_eq!(quoted.chars().count(), 53);
        assert!(quoted.ends_with("..."));
    }

    #[test]
    fn test_custom_rules() {
        let rules = AlertRules::default()
            .with_escalation_keywords(["Lawyer"])
            .with_upsell_threshold(60);
        let text = Some("my lawyer says thanks, great work");
        let drafts = rules.evaluate(text, &score(text));
        assert_eq!(kinds(&drafts), [AlertKind::Warning, AlertKind::Positive]);
    }
}
