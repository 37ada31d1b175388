//! Card payment capability.
//!
//! The backend creates the payment intent; confirming it with card data is
//! delegated to the external processor.

use agora_core::{AgoraResult, PaymentError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Backend response to `POST /create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentSecret {
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl PaymentIntentSecret {
    pub fn require_secret(&self) -> Result<&str, PaymentError> {
        self.client_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(PaymentError::MissingClientSecret)
    }
}

/// Opaque reference to card data collected by the processor's own input
/// element. The client never sees card numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardHandle(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub id: String,
    pub status: String,
}

impl PaymentConfirmation {
    pub const SUCCEEDED: &'static str = "succeeded";

    pub fn ensure_succeeded(&self) -> Result<(), PaymentError> {
        if self.status == Self::SUCCEEDED {
            Ok(())
        } else {
            Err(PaymentError::NotSucceeded {
                status: self.status.clone(),
            })
        }
    }
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync + 'static {
    /// Confirm the intent identified by `client_secret`. A decline is
    /// reported as `PaymentError::Declined`.
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardHandle,
        billing_email: Option<&str>,
    ) -> AgoraResult<PaymentConfirmation>;
}

/// Processor for builds without card support; every payment is declined.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentsUnavailable;

#[async_trait]
impl PaymentProcessor for PaymentsUnavailable {
    async fn confirm_card_payment(
        &self,
        _client_secret: &str,
        _card: &CardHandle,
        _billing_email: Option<&str>,
    ) -> AgoraResult<PaymentConfirmation> {
        Err(PaymentError::Declined {
            message: "card payments are not available in this client".to_string(),
        }
        .into())
    }
}
