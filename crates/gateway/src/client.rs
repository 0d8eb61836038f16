//! JSON-RPC HTTP client for a provider's messaging API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::types::{RemoteAccount, RemoteChat, RemoteMessage, SendRequest, SentMessage};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Serialize)]
struct RpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<T>,
    id: u64,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<RpcError>,
    #[allow(dead_code)]
    id: u64,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountParams<'a> {
    account_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesParams<'a> {
    chat_id: &'a str,
    limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EditMessageParams<'a> {
    message_id: &'a str,
    text: &'a str,
}

/// Gateway implementation that talks JSON-RPC over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    config: GatewayConfig,
    request_id: Arc<AtomicU64>,
}

impl HttpGateway {
    /// Create a client without contacting the provider.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        if config.base_url.is_empty() {
            return Err(GatewayError::Config("base URL is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self {
            http,
            config,
            request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Create a client and verify the provider answers its health check.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Self::new(config)?;

        if !client.health_check().await? {
            return Err(GatewayError::Unreachable(format!(
                "health check failed for {}",
                client.config.base_url
            )));
        }

        info!("Connected to messaging provider at {}", client.config.base_url);
        Ok(client)
    }

    /// Perform a health check against the provider.
    pub async fn health_check(&self) -> Result<bool, GatewayError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        let resp = self.authorized(self.http.get(&url)).send().await?;
        Ok(resp.status().is_success())
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Make a JSON-RPC call to the provider.
    async fn rpc_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, GatewayError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let url = self.config.rpc_url();

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("RPC call: {} (id={})", method, id);

        let response = self
            .authorized(self.http.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Unreachable(e.to_string())
                } else if e.is_timeout() {
                    GatewayError::Timeout(self.config.timeout)
                } else {
                    GatewayError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rpc_response: RpcResponse<R> = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(GatewayError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| GatewayError::Rpc {
            code: -1,
            message: "No result in response".to_string(),
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_account(&self, external_id: &str) -> Result<RemoteAccount, GatewayError> {
        self.rpc_call(
            "getAccount",
            Some(AccountParams {
                account_id: external_id,
            }),
        )
        .await
    }

    async fn list_chats(&self, account_external_id: &str) -> Result<Vec<RemoteChat>, GatewayError> {
        self.rpc_call(
            "listChats",
            Some(AccountParams {
                account_id: account_external_id,
            }),
        )
        .await
    }

    async fn list_messages(
        &self,
        chat_external_id: &str,
        page_size: u32,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        self.rpc_call(
            "listMessages",
            Some(ListMessagesParams {
                chat_id: chat_external_id,
                limit: page_size,
            }),
        )
        .await
    }

    async fn send_message(&self, request: &SendRequest) -> Result<SentMessage, GatewayError> {
        self.rpc_call("sendMessage", Some(request)).await
    }

    async fn edit_message(
        &self,
        message_external_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        // editMessage answers with an empty object on success
        let _: serde_json::Value = self
            .rpc_call(
                "editMessage",
                Some(EditMessageParams {
                    message_id: message_external_id,
                    text,
                }),
            )
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}
