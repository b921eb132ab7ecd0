//! Payment gateway interface.
//!
//! The gateway hosts the checkout page and later reports the outcome through
//! a webhook, which lands in `WalletService::reconcile_payment`. Signature
//! verification of webhook deliveries belongs to the gateway integration.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::backend::domain::models::parent::WalletEntryType;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub parent_id: String,
    pub entry_type: WalletEntryType,
    pub amount_cents: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;
}

/// Issues local session ids; outcomes are posted to the webhook by hand or by tests
#[derive(Debug, Clone)]
pub struct LocalPaymentGateway {
    checkout_base_url: String,
}

impl LocalPaymentGateway {
    pub fn new(checkout_base_url: impl Into<String>) -> Self {
        Self { checkout_base_url: checkout_base_url.into() }
    }
}

impl Default for LocalPaymentGateway {
    fn default() -> Self {
        Self::new("http://localhost:3000/checkout")
    }
}

#[async_trait]
impl PaymentGateway for LocalPaymentGateway {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        if request.amount_cents <= 0 {
            return Err(anyhow::anyhow!("Checkout amount must be positive"));
        }

        let session_id = format!("cs_local_{}", Uuid::new_v4().simple());
        let checkout_url = format!("{}/{}", self.checkout_base_url.trim_end_matches('/'), session_id);

        info!(
            "Created local checkout session {} for {} ({} cents)",
            session_id, request.parent_id, request.amount_cents
        );

        Ok(CheckoutSession { session_id, checkout_url })
    }
}
