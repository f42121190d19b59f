//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use common::Money;
use domain::PaymentStatus;
use thiserror::Error;

/// Errors reported by a payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway refused the request.
    #[error("declined: {0}")]
    Declined(String),

    /// The gateway could not be reached.
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with something we could not interpret.
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

/// A single capture request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub amount: Money,
    /// ISO currency code, lower case.
    pub currency: String,
    /// Opaque payment method token supplied by the client.
    pub payment_method_id: String,
    /// Deduplicates retried submissions at the gateway.
    pub idempotency_key: String,
    pub description: String,
}

impl PaymentRequest {
    /// Amount in minor currency units.
    pub fn amount_minor(&self) -> i64 {
        self.amount.cents()
    }
}

/// Synchronous gateway answer to a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub id: String,
    pub status: PaymentStatus,
}

/// Trait for payment capture operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Name recorded as the order's payment method.
    fn name(&self) -> &'static str;

    /// Captures `request.amount` against the payment method.
    async fn capture(&self, request: &PaymentRequest) -> Result<PaymentConfirmation, PaymentError>;

    /// Refunds a previously captured payment in full.
    async fn refund(&self, payment_id: &str) -> Result<(), PaymentError>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn capture(&self, request: &PaymentRequest) -> Result<PaymentConfirmation, PaymentError> {
        (**self).capture(request).await
    }

    async fn refund(&self, payment_id: &str) -> Result<(), PaymentError> {
        (**self).refund(payment_id).await
    }
}

#[derive(Debug)]
struct InMemoryPaymentState {
    captures: HashMap<String, Money>,
    refunded: Vec<String>,
    next_id: u32,
    decline: bool,
    status: PaymentStatus,
    fail_on_refund: bool,
}

impl Default for InMemoryPaymentState {
    fn default() -> Self {
        Self {
            captures: HashMap::new(),
            refunded: Vec::new(),
            next_id: 0,
            decline: false,
            status: PaymentStatus::Succeeded,
            fail_on_refund: false,
        }
    }
}

/// In-memory payment gateway for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway that approves every capture.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryPaymentState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes subsequent captures fail with `Declined`.
    pub fn set_decline(&self, decline: bool) {
        self.state().decline = decline;
    }

    /// Sets the status reported by subsequent captures.
    pub fn set_status(&self, status: PaymentStatus) {
        self.state().status = status;
    }

    /// Makes subsequent refunds fail.
    pub fn set_fail_on_refund(&self, fail: bool) {
        self.state().fail_on_refund = fail;
    }

    /// Number of captured, unrefunded payments.
    pub fn capture_count(&self) -> usize {
        self.state().captures.len()
    }

    /// Number of refunds issued.
    pub fn refund_count(&self) -> usize {
        self.state().refunded.len()
    }

    /// Amount held by a captured payment.
    pub fn captured_amount(&self, payment_id: &str) -> Option<Money> {
        self.state().captures.get(payment_id).copied()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn capture(&self, request: &PaymentRequest) -> Result<PaymentConfirmation, PaymentError> {
        let mut state = self.state();

        if state.decline {
            return Err(PaymentError::Declined("card declined".to_string()));
        }

        state.next_id += 1;
        let id = format!("PAY-{:04}", state.next_id);
        let status = state.status;
        if status == PaymentStatus::Succeeded {
            state.captures.insert(id.clone(), request.amount);
        }

        Ok(PaymentConfirmation { id, status })
    }

    async fn refund(&self, payment_id: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if state.fail_on_refund {
            return Err(PaymentError::Declined("refund rejected".to_string()));
        }
        if state.captures.remove(payment_id).is_none() {
            return Err(PaymentError::InvalidResponse(format!(
                "no captured payment {payment_id}"
            )));
        }
        state.refunded.push(payment_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cents: i64) -> PaymentRequest {
        PaymentRequest {
            amount: Money::from_cents(cents),
            currency: "usd".to_string(),
            payment_method_id: "pm_card_visa".to_string(),
            idempotency_key: "key-1".to_string(),
            description: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_capture_and_refund() {
        let gateway = InMemoryPaymentGateway::new();

        let confirmation = gateway.capture(&request(5000)).await.unwrap();
        assert_eq!(confirmation.id, "PAY-0001");
        assert_eq!(confirmation.status, PaymentStatus::Succeeded);
        assert_eq!(
            gateway.captured_amount(&confirmation.id),
            Some(Money::from_cents(5000))
        );

        gateway.refund(&confirmation.id).await.unwrap();
        assert_eq!(gateway.capture_count(), 0);
        assert_eq!(gateway.refund_count(), 1);
    }

    #[tokio::test]
    async fn test_declined_capture() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_decline(true);

        let result = gateway.capture(&request(5000)).await;
        assert!(matches!(result, Err(PaymentError::Declined(_))));
        assert_eq!(gateway.capture_count(), 0);
    }

    #[tokio::test]
    async fn test_non_success_status_holds_nothing() {
        let gateway = InMemoryPaymentGateway::new();
        gateway.set_status(PaymentStatus::Pending);

        let confirmation = gateway.capture(&request(5000)).await.unwrap();
        assert_eq!(confirmation.status, PaymentStatus::Pending);
        assert_eq!(gateway.capture_count(), 0);
    }

    #[tokio::test]
    async fn test_refund_of_unknown_payment_fails() {
        let gateway = InMemoryPaymentGateway::new();
        assert!(gateway.refund("PAY-9999").await.is_err());
    }

    #[tokio::test]
    async fn test_shared_through_arc() {
        let gateway = Arc::new(InMemoryPaymentGateway::new());
        let shared: Arc<dyn PaymentGateway> = gateway.clone();

        assert_eq!(shared.name(), "memory");
        shared.capture(&request(100)).await.unwrap();
        assert_eq!(gateway.capture_count(), 1);
    }
}
