//! Scoring and alert evaluation for ingested messages.

use database::NewAlert;
use sentiment::{score, AlertRules, Sentiment};

/// The outcome of scoring one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub sentiment: Sentiment,
    pub alerts: Vec<NewAlert>,
}

/// Scores message text and turns rule hits into workspace alerts.
#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    rules: AlertRules,
}

impl AlertEvaluator {
    /// Create an evaluator with the given rules.
    pub fn new(rules: AlertRules) -> Self {
        Self { rules }
    }

    /// Get the rules.
    pub fn rules(&self) -> &AlertRules {
        &self.rules
    }

    /// Score `text` and build the alerts it raises.
    pub fn evaluate(
        &self,
        workspace_id: &str,
        chat_id: i64,
        message_external_id: &str,
        text: Option<&str>,
    ) -> Evaluation {
        let sentiment = score(text);
        let alerts = self
            .rules
            .evaluate(text, &sentiment)
            .into_iter()
            .map(|draft| NewAlert {
                workspace_id: workspace_id.to_string(),
                kind: draft.kind.as_str().to_string(),
                message: draft.message,
                chat_id: Some(chat_id),
                source_message_id: Some(message_external_id.to_string()),
                action_label: draft.action_label,
            })
            .collect();

        Evaluation { sentiment, alerts }
    }
}
