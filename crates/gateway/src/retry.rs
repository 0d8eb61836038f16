//! Bounded retries with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::types::{RemoteAccount, RemoteChat, RemoteMessage, SendRequest, SentMessage};

/// Configuration for retrying transient gateway failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
    /// Fraction of the delay randomized in both directions (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set the retry bound.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Calculate the un-jittered delay for a given retry number (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// The delay for a retry with jitter applied.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return base;
        }
        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        base.mul_f64(factor).min(self.max_delay)
    }

    /// Longest time an operation can take through this policy when each
    /// attempt is bounded by `per_attempt`: every attempt plus the largest
    /// jittered delay between them.
    pub fn operation_budget(&self, per_attempt: Duration) -> Duration {
        let jitter = 1.0 + self.jitter.clamp(0.0, 1.0);
        let backoff: Duration = (0..self.max_retries)
            .map(|attempt| {
                self.delay_for_attempt(attempt)
                    .mul_f64(jitter)
                    .min(self.max_delay)
            })
            .sum();
        per_attempt * (self.max_retries + 1) + backoff
    }

    /// Check if we should retry after the given number of retries.
    pub fn should_retry(&self, retries: u32) -> bool {
        retries < self.max_retries
    }
}

/// A gateway wrapper that retries transient failures.
///
/// Reads and edits are retried on any transient error. Sends are retried
/// only when the request never reached the provider, so a retry cannot
/// create a second provider-side message.
pub struct RetryingGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: Gateway> RetryingGateway<G> {
    /// Wrap a gateway with the given policy.
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Get the wrapped gateway.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    async fn retry<T, F, Fut>(
        &self,
        operation: &str,
        retryable: fn(&GatewayError) -> bool,
        mut call: F,
    ) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, GatewayError>> + Send,
        T: Send,
    {
        let mut retries = 0u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if retryable(&e) && self.policy.should_retry(retries) => {
                    let delay = self.policy.jittered_delay(retries);
                    retries += 1;
                    warn!(
                        operation,
                        retry = retries,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient gateway failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<G: Gateway> Gateway for RetryingGateway<G> {
    async fn get_account(&self, external_id: &str) -> Result<RemoteAccount, GatewayError> {
        self.retry("get_account", GatewayError::is_transient, move || {
            self.inner.get_account(external_id)
        })
        .await
    }

    async fn list_chats(&self, account_external_id: &str) -> Result<Vec<RemoteChat>, GatewayError> {
        self.retry("list_chats", GatewayError::is_transient, move || {
            self.inner.list_chats(account_external_id)
        })
        .await
    }

    async fn list_messages(
        &self,
        chat_external_id: &str,
        page_size: u32,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        self.retry("list_messages", GatewayError::is_transient, move || {
            self.inner.list_messages(chat_external_id, page_size)
        })
        .await
    }

    async fn send_message(&self, request: &SendRequest) -> Result<SentMessage, GatewayError> {
        self.retry("send_message", GatewayError::is_unsent, move || {
            self.inner.send_message(request)
        })
        .await
    }

    async fn edit_message(
        &self,
        message_external_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.retry("edit_message", GatewayError::is_transient, move || {
            self.inner.edit_message(message_external_id, text)
        })
        .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
