//! HTTP gateway to the remote datastore
//!
//! One endpoint, discriminated by an `action` field. Mutations are
//! ordinary POST round-trips; the read path is answered out-of-band
//! through [`CallbackRegistry`] because the remote cannot deliver the
//! order list as a directly consumable response.

use reqwest::Client;
use shared::Order;
use shared::cloud::{FetchResponse, MutationResponse, ProbeResponse, RemoteAction};
use std::error::Error as StdError;
use std::time::Duration;

use crate::cloud::channel::CallbackRegistry;
use crate::cloud::{ProbeOutcome, RemoteChannel, RemoteError};
use crate::core::config::Config;

/// HTTP implementation of [`RemoteChannel`]
pub struct RemoteGateway {
    client: Client,
    base_url: String,
    fetch_timeout: Duration,
    permissive_success: bool,
    registry: CallbackRegistry,
}

impl RemoteGateway {
    /// Build a gateway for the configured endpoint
    pub fn new(base_url: impl Into<String>, config: &Config) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            permissive_success: config.permissive_success,
            registry: CallbackRegistry::new(),
        })
    }

    /// Walk the reqwest error chain into one message, the way a log
    /// reader needs it
    fn transport_message(context: &str, e: &reqwest::Error) -> String {
        let mut msg = format!("{context}: {e}");
        let mut source: Option<&dyn StdError> = StdError::source(e);
        while let Some(s) = source {
            msg.push_str(&format!(": {s}"));
            source = s.source();
        }
        msg
    }
}

#[async_trait::async_trait]
impl RemoteChannel for RemoteGateway {
    /// Issue the `ping` action.
    ///
    /// Any 2xx counts as reachable even when the decoded payload lacks
    /// an explicit success indicator — the deployed remote's ping
    /// handler predates the envelope.
    async fn probe(&self) -> ProbeOutcome {
        let url = format!("{}?action=ping", self.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                return ProbeOutcome {
                    reachable: false,
                    message: Self::transport_message("ping failed", &e),
                };
            }
        };

        if !response.status().is_success() {
            return ProbeOutcome {
                reachable: false,
                message: format!("ping returned HTTP {}", response.status()),
            };
        }

        let parsed: Option<ProbeResponse> = response.json().await.ok();
        let reachable = parsed
            .as_ref()
            .and_then(|p| p.success)
            .unwrap_or(self.permissive_success);
        let message = parsed
            .and_then(|p| p.message)
            .unwrap_or_else(|| "remote reachable".to_string());

        ProbeOutcome { reachable, message }
    }

    async fn submit(&self, action: RemoteAction) -> Result<(), RemoteError> {
        let name = action.name();

        let response = self
            .client
            .post(&self.base_url)
            .json(&action)
            .send()
            .await
            .map_err(|e| {
                RemoteError::Transport(Self::transport_message(
                    &format!("{name} request failed"),
                    &e,
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected(format!(
                "{name} failed with status {status}: {body}"
            )));
        }

        let envelope: MutationResponse = response.json().await.map_err(|e| {
            RemoteError::Rejected(format!("{name}: unreadable response: {e}"))
        })?;

        // Mutations must report success explicitly; an absent flag is
        // as bad as a false one.
        if envelope.success != Some(true) {
            return Err(RemoteError::Rejected(envelope.error.unwrap_or_else(|| {
                format!("{name}: remote reported failure")
            })));
        }

        tracing::debug!(action = name, "Remote mutation confirmed");
        Ok(())
    }

    /// Issue `getOrders` and wait for its out-of-band reply.
    ///
    /// The registry entry is cleaned up on every path (delivery,
    /// transport error, timeout), and the wait is bounded by the
    /// configured fetch timeout.
    async fn fetch_all(&self) -> Vec<Order> {
        let subscription = self.registry.subscribe();
        let token = subscription.token().to_string();
        let url = format!(
            "{}?action=getOrders&callback={}",
            self.base_url, token
        );

        // The request task delivers whatever the remote hands back;
        // the reply reaches us through the registry, not this task.
        let client = self.client.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            match client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.json::<serde_json::Value>().await {
                        Ok(value) => {
                            registry.deliver(&token, value);
                        }
                        Err(e) => {
                            tracing::warn!("getOrders reply unreadable: {e}");
                            registry.fail(&token);
                        }
                    }
                }
                Ok(response) => {
                    tracing::warn!("getOrders returned HTTP {}", response.status());
                    registry.fail(&token);
                }
                Err(e) => {
                    tracing::warn!("{}", Self::transport_message("getOrders failed", &e));
                    registry.fail(&token);
                }
            }
        });

        let Some(value) = subscription.wait(self.fetch_timeout).await else {
            tracing::warn!("getOrders produced no reply within the fetch timeout");
            return Vec::new();
        };

        let parsed: FetchResponse = match serde_json::from_value(value) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("getOrders payload did not decode: {e}");
                return Vec::new();
            }
        };

        if !parsed.success.unwrap_or(self.permissive_success) {
            tracing::warn!(
                "getOrders reported failure: {}",
                parsed.error.as_deref().unwrap_or("no error message")
            );
            return Vec::new();
        }

        parsed.data.unwrap_or_default()
    }
}
