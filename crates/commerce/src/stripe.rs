//! Stripe-backed payment gateway.
//!
//! Captures go through a confirmed PaymentIntent. Redirect-based payment
//! methods are disabled so confirmation is synchronous.

use async_trait::async_trait;
use domain::PaymentStatus;
use reqwest::Client;
use serde::Deserialize;

use crate::payment::{PaymentConfirmation, PaymentError, PaymentGateway, PaymentRequest};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Deserialize)]
struct PaymentIntent {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

/// HTTP client for the Stripe API.
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    async fn decline_reason(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => PaymentError::Declined(
                envelope
                    .error
                    .message
                    .or(envelope.error.code)
                    .unwrap_or_else(|| status.to_string()),
            ),
            Err(_) => PaymentError::InvalidResponse(format!("status {status}")),
        }
    }
}

/// Maps a PaymentIntent status onto the order's payment status.
fn intent_status(status: &str) -> PaymentStatus {
    match status {
        "succeeded" => PaymentStatus::Succeeded,
        "processing" | "requires_action" | "requires_capture" | "requires_confirmation" => {
            PaymentStatus::Pending
        }
        _ => PaymentStatus::Failed,
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn name(&self) -> &'static str {
        "stripe"
    }

    #[tracing::instrument(skip(self, request), fields(amount = request.amount_minor()))]
    async fn capture(&self, request: &PaymentRequest) -> Result<PaymentConfirmation, PaymentError> {
        let params = [
            ("amount", request.amount_minor().to_string()),
            ("currency", request.currency.clone()),
            ("payment_method", request.payment_method_id.clone()),
            ("description", request.description.clone()),
            ("confirm", "true".to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("automatic_payment_methods[allow_redirects]", "never".to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::decline_reason(response).await);
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        Ok(PaymentConfirmation {
            status: intent_status(&intent.status),
            id: intent.id,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn refund(&self, payment_id: &str) -> Result<(), PaymentError> {
        let response = self
            .client
            .post(format!("{}/v1/refunds", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", format!("refund-{payment_id}"))
            .form(&[("payment_intent", payment_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::decline_reason(response).await);
        }
        Ok(())
    }
}
