//! Scriptable payment gateway.
//!
//! Stands in for the hosted card widget in tests, the CLI simulator and the
//! interactive shop. Responses are queued up front and consumed one per
//! tokenize call; once the queue is empty every call is approved.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use boutique_commerce::checkout::{
    CardInput, GatewayCredentials, GatewayError, GatewayLoader, PaymentGateway, TokenizeResult,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the sandbox answers to the next tokenize call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SandboxResponse {
    /// Accept the card. Without an explicit token one is generated.
    Approve {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    /// Reject the card with validation messages.
    Decline {
        #[serde(default)]
        messages: Vec<String>,
    },
    /// Fail the call itself, as a network error would.
    Fault { reason: String },
}

impl SandboxResponse {
    pub fn approve() -> Self {
        Self::Approve { token: None }
    }

    pub fn decline(message: impl Into<String>) -> Self {
        Self::Decline {
            messages: vec![message.into()],
        }
    }

    pub fn fault(reason: impl Into<String>) -> Self {
        Self::Fault {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Default)]
struct SandboxState {
    responses: Mutex<VecDeque<SandboxResponse>>,
    attach_failure: Mutex<Option<String>>,
    latency: Duration,
    cards_created: AtomicUsize,
    attach_count: AtomicUsize,
    tokenize_calls: AtomicUsize,
    tokens_issued: AtomicU64,
}

impl SandboxState {
    fn next_response(&self) -> SandboxResponse {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(SandboxResponse::approve)
    }

    fn attach_failure(&self) -> Option<String> {
        self.attach_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// In-process payment gateway. Clones share the same queue and counters.
#[derive(Debug, Clone, Default)]
pub struct SandboxGateway {
    state: Arc<SandboxState>,
}

impl SandboxGateway {
    /// A gateway that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that waits `latency` before each attach and tokenize.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            state: Arc::new(SandboxState {
                latency,
                ..SandboxState::default()
            }),
        }
    }

    /// Queue a response for a future tokenize call.
    pub fn push_response(&self, response: SandboxResponse) {
        self.state
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Queue several responses in order.
    pub fn extend_responses(&self, responses: impl IntoIterator<Item = SandboxResponse>) {
        self.state
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(responses);
    }

    /// Make every subsequent attach fail with `reason`.
    pub fn fail_attach(&self, reason: impl Into<String>) {
        *self
            .state
            .attach_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }

    /// Responses still queued.
    pub fn pending_responses(&self) -> usize {
        self.state
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of card inputs created.
    pub fn cards_created(&self) -> usize {
        self.state.cards_created.load(Ordering::Relaxed)
    }

    /// Number of successful attaches.
    pub fn attach_count(&self) -> usize {
        self.state.attach_count.load(Ordering::Relaxed)
    }

    /// Number of tokenize calls received.
    pub fn tokenize_calls(&self) -> usize {
        self.state.tokenize_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn card(&self) -> Result<Box<dyn CardInput>, GatewayError> {
        self.state.cards_created.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(SandboxCard {
            state: Arc::clone(&self.state),
            mounted_at: None,
        }))
    }
}

/// Card input created by a [`SandboxGateway`].
#[derive(Debug)]
pub struct SandboxCard {
    state: Arc<SandboxState>,
    mounted_at: Option<String>,
}

impl SandboxCard {
    async fn simulate_latency(&self) {
        if !self.state.latency.is_zero() {
            tokio::time::sleep(self.state.latency).await;
        }
    }
}

#[async_trait]
impl CardInput for SandboxCard {
    async fn attach(&mut self, mount_point: &str) -> Result<(), GatewayError> {
        if let Some(existing) = &self.mounted_at {
            return Err(GatewayError::Attach(format!(
                "card input already attached at {existing}"
            )));
        }
        if mount_point.trim().is_empty() {
            return Err(GatewayError::Attach("mount point is empty".to_string()));
        }
        if let Some(reason) = self.state.attach_failure() {
            return Err(GatewayError::Attach(reason));
        }

        self.simulate_latency().await;
        self.mounted_at = Some(mount_point.to_string());
        self.state.attach_count.fetch_add(1, Ordering::Relaxed);
        debug!(mount_point, "sandbox card attached");
        Ok(())
    }

    async fn tokenize(&self) -> Result<TokenizeResult, GatewayError> {
        if self.mounted_at.is_none() {
            return Err(GatewayError::Tokenize(
                "card input is not attached".to_string(),
            ));
        }
        self.state.tokenize_calls.fetch_add(1, Ordering::Relaxed);

        let response = self.state.next_response();
        self.simulate_latency().await;
        debug!(?response, "sandbox tokenize");

        match response {
            SandboxResponse::Approve { token } => {
                let token = token.unwrap_or_else(|| {
                    let n = self.state.tokens_issued.fetch_add(1, Ordering::Relaxed) + 1;
                    format!("tok_sandbox_{n}")
                });
                Ok(TokenizeResult::ok(token))
            }
            SandboxResponse::Decline { messages } => Ok(TokenizeResult::failed(messages)),
            SandboxResponse::Fault { reason } => Err(GatewayError::Tokenize(reason)),
        }
    }
}

/// Gateway loader backed by the sandbox.
#[derive(Debug, Clone)]
pub enum SandboxLoader {
    /// The client loads and hands out the given gateway.
    Available(SandboxGateway),
    /// The client never loaded, as when its script is blocked.
    Missing,
}

impl GatewayLoader for SandboxLoader {
    fn load(
        &self,
        credentials: &GatewayCredentials,
    ) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        match self {
            Self::Available(gateway) => {
                debug!(
                    application_id = %credentials.application_id,
                    location_id = %credentials.location_id,
                    "sandbox gateway loaded"
                );
                Ok(Arc::new(gateway.clone()))
            }
            Self::Missing => Err(GatewayError::Unavailable(
                "payment client library is not loaded".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boutique_commerce::checkout::{initialize_card, TokenStatus};

    fn credentials() -> GatewayCredentials {
        GatewayCredentials {
            application_id: "sandbox-app".to_string(),
            location_id: "sandbox-location".to_string(),
        }
    }

    #[tokio::test]
    async fn test_initialize_and_tokenize() {
        let gateway = SandboxGateway::new();
        gateway.push_response(SandboxResponse::decline("Invalid card number"));
        let loader = SandboxLoader::Available(gateway.clone());

        let card = initialize_card(&loader, &credentials(), "#card-container")
            .await
            .unwrap();
        assert_eq!(gateway.cards_created(), 1);
        assert_eq!(gateway.attach_count(), 1);

        let declined = card.tokenize().await.unwrap();
        assert_eq!(declined.status, TokenStatus::Other("FAILED".to_string()));
        assert_eq!(
            declined.joined_messages().as_deref(),
            Some("Invalid card number")
        );

        let approved = card.tokenize().await.unwrap();
        assert!(approved.status.is_ok());
        assert_eq!(approved.token.as_deref(), Some("tok_sandbox_1"));
        assert_eq!(gateway.tokenize_calls(), 2);
        assert_eq!(gateway.pending_responses(), 0);
    }

    #[tokio::test]
    async fn test_fault_response() {
        let gateway = SandboxGateway::new();
        gateway.push_response(SandboxResponse::fault("connection reset"));
        let card = initialize_card(
            &SandboxLoader::Available(gateway),
            &credentials(),
            "#card-container",
        )
        .await
        .unwrap();

        assert_eq!(
            card.tokenize().await.unwrap_err(),
            GatewayError::Tokenize("connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_loader() {
        let result =
            initialize_card(&SandboxLoader::Missing, &credentials(), "#card-container").await;
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_attach_failures() {
        let gateway = SandboxGateway::new();
        let loader = SandboxLoader::Available(gateway.clone());
        assert!(matches!(
            initialize_card(&loader, &credentials(), "").await,
            Err(GatewayError::Attach(_))
        ));

        gateway.fail_attach("container not found");
        assert_eq!(
            initialize_card(&loader, &credentials(), "#card-container")
                .await
                .err(),
            Some(GatewayError::Attach("container not found".to_string()))
        );
        assert_eq!(gateway.attach_count(), 0);
    }

    #[tokio::test]
    async fn test_tokenize_before_attach() {
        let gateway = SandboxGateway::new();
        let card = gateway.card().await.unwrap();
        assert!(matches!(
            card.tokenize().await,
            Err(GatewayError::Tokenize(_))
        ));
        assert_eq!(gateway.tokenize_calls(), 0);
    }

    #[test]
    fn test_response_serde() {
        let responses: Vec<SandboxResponse> = serde_json::from_str(
            r#"[
                {"outcome": "approve"},
                {"outcome": "approve", "token": "tok_fixed"},
                {"outcome": "decline", "messages": ["Invalid card number"]},
                {"outcome": "fault", "reason": "timeout"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            responses,
            vec![
                SandboxResponse::approve(),
                SandboxResponse::Approve {
                    token: Some("tok_fixed".to_string())
                },
                SandboxResponse::decline("Invalid card number"),
                SandboxResponse::fault("timeout"),
            ]
        );
    }
}
