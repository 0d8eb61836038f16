//! Pipeline configuration.

use std::time::Duration;

use sentiment::AlertRules;

/// Default number of messages fetched per chat sync.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default timeout for a single gateway call.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when a sync names an account with no local record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProvisioningPolicy {
    /// Fail with `UnboundAccount`; accounts must be bound explicitly first.
    #[default]
    RequireBinding,
    /// Create the account in the first workspace found.
    FirstAvailableWorkspace,
}

/// Configuration for the sync engine and outbound coordinator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of messages requested per chat sync.
    pub message_page_size: u32,

    /// Timeout applied to every gateway call.
    pub gateway_timeout: Duration,

    /// How unknown accounts are handled during sync.
    pub provisioning: ProvisioningPolicy,

    /// Rules applied to every ingested message.
    pub alert_rules: AlertRules,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            message_page_size: DEFAULT_PAGE_SIZE,
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            provisioning: ProvisioningPolicy::default(),
            alert_rules: AlertRules::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the message page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.message_page_size = page_size;
        self
    }

    /// Set the gateway timeout.
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Set the provisioning policy.
    pub fn with_provisioning(mut self, policy: ProvisioningPolicy) -> Self {
        self.provisioning = policy;
        self
    }

    /// Set the alert rules.
    pub fn with_alert_rules(mut self, rules: AlertRules) -> Self {
        self.alert_rules = rules;
        self
    }
}
