//! Parent wallet: card checkouts through the payment gateway and their
//! reconciliation when the gateway reports the outcome.
//!
//! - TOP_UP adds to the wallet balance once it succeeds
//! - DONATION credits a child's neighbor balance once it succeeds
//! - WELCOME_PACKET flags the child once it succeeds
//!
//! Webhook deliveries may repeat; only the first one for a session settles it.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::backend::adapters::{CheckoutRequest, PaymentGateway};
use crate::backend::domain::child_service::ChildService;
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::wallet::{CheckoutStarted, ReconcileResult, WalletSummary};
use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::parent::{PaymentStatus, WalletEntry, WalletEntryType};
use crate::backend::domain::parent_service::ParentService;
use crate::backend::storage::csv::{CsvConnection, ParentRepository};
use crate::backend::storage::ParentStorage;

/// Largest single card payment accepted, in cents
const MAX_PAYMENT_CENTS: i64 = 100_000;

#[derive(Clone)]
pub struct WalletService {
    parent_repository: ParentRepository,
    parent_service: ParentService,
    child_service: ChildService,
    payment_gateway: Arc<dyn PaymentGateway>,
    ledger_lock: Arc<Mutex<()>>,
    welcome_packet_cents: i64,
    clock: Arc<dyn Clock>,
}

impl WalletService {
    pub fn new(
        csv_conn: Arc<CsvConnection>,
        parent_service: ParentService,
        child_service: ChildService,
        payment_gateway: Arc<dyn PaymentGateway>,
        welcome_packet_cents: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            parent_repository: ParentRepository::new((*csv_conn).clone()),
            parent_service,
            child_service,
            payment_gateway,
            ledger_lock: csv_conn.ledger_lock(),
            welcome_packet_cents,
            clock,
        }
    }

    pub async fn start_top_up(&self, parent_id: &str, amount_cents: i64) -> LedgerResult<CheckoutStarted> {
        info!("Starting wallet top-up of {} cents for parent {}", amount_cents, parent_id);
        validate_amount(amount_cents)?;

        self.start_checkout(parent_id, WalletEntryType::TopUp, amount_cents, None, "Wallet top-up".to_string())
            .await
    }

    pub async fn start_donation(&self, parent_id: &str, child_id: &str, amount_cents: i64) -> LedgerResult<CheckoutStarted> {
        info!("Starting donation of {} cents for child {}", amount_cents, child_id);
        validate_amount(amount_cents)?;

        let child = self.child_service.get_owned_child(parent_id, child_id).await?;
        let description = format!("Neighbor donation for {}", child.name);
        self.start_checkout(parent_id, WalletEntryType::Donation, amount_cents, Some(child.id), description)
            .await
    }

    pub async fn start_welcome_packet(&self, parent_id: &str, child_id: &str) -> LedgerResult<CheckoutStarted> {
        info!("Starting welcome packet purchase for child {}", child_id);

        let child = self.child_service.get_owned_child(parent_id, child_id).await?;
        if child.welcome_packet_purchased {
            return Err(LedgerError::Conflict(format!(
                "{} already has a welcome packet",
                child.name
            )));
        }

        let description = format!("Welcome packet for {}", child.name);
        self.start_checkout(
            parent_id,
            WalletEntryType::WelcomePacket,
            self.welcome_packet_cents,
            Some(child.id),
            description,
        )
        .await
    }

    /// Apply the gateway's verdict on a checkout session
    pub async fn reconcile_payment(&self, session_id: &str, succeeded: bool) -> LedgerResult<ReconcileResult> {
        info!("Reconciling checkout session {} (succeeded: {})", session_id, succeeded);

        let _ledger = self.ledger_lock.lock().await;
        let original = self
            .parent_repository
            .find_parent_by_checkout_session(session_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Checkout session", session_id))?;

        let now = self.clock.now();
        let mut parent = original.clone();
        let entry = parent
            .entry_by_session_mut(session_id)
            .ok_or_else(|| LedgerError::not_found("Checkout session", session_id))?;

        if !entry.settle(succeeded, now) {
            warn!("Checkout session {} already settled as {:?}", session_id, entry.status);
            return Ok(ReconcileResult {
                entry: entry.clone(),
                applied: false,
            });
        }
        let entry = entry.clone();
        parent.updated_at = now;
        self.parent_service.update_parent(&parent).await?;

        if entry.status == PaymentStatus::Succeeded {
            if let Err(e) = self.apply_child_effect(&entry, now).await {
                error!("Failed to apply {:?} for session {}: {}", entry.entry_type, session_id, e);
                if let Err(revert) = self.parent_service.update_parent(&original).await {
                    error!("Failed to restore wallet of parent {}: {}", original.id, revert);
                }
                return Err(e);
            }
        }

        info!(
            "Settled {:?} entry {} as {:?}; wallet balance {} cents",
            entry.entry_type,
            entry.id,
            entry.status,
            parent.wallet_balance_cents()
        );
        Ok(ReconcileResult { entry, applied: true })
    }

    pub async fn get_wallet(&self, parent_id: &str) -> LedgerResult<WalletSummary> {
        info!("Getting wallet for parent {}", parent_id);

        let _ledger = self.ledger_lock.lock().await;
        let parent = self.parent_service.get_parent(parent_id).await?;
        let balance_cents = parent.wallet_balance_cents();

        let mut entries = parent.wallet_ledger;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(WalletSummary {
            parent_id: parent.id,
            balance_cents,
            entries,
        })
    }

    async fn start_checkout(
        &self,
        parent_id: &str,
        entry_type: WalletEntryType,
        amount_cents: i64,
        child_id: Option<String>,
        description: String,
    ) -> LedgerResult<CheckoutStarted> {
        self.parent_service.get_parent(parent_id).await?;

        let session = self
            .payment_gateway
            .create_checkout_session(&CheckoutRequest {
                parent_id: parent_id.to_string(),
                entry_type,
                amount_cents,
                description: description.clone(),
            })
            .await?;

        let now = self.clock.now();
        let entry = WalletEntry {
            id: WalletEntry::generate_id(),
            entry_type,
            amount_cents,
            status: PaymentStatus::Pending,
            checkout_session_id: Some(session.session_id.clone()),
            child_id,
            description,
            created_at: now,
            settled_at: None,
        };

        let _ledger = self.ledger_lock.lock().await;
        let mut parent = self.parent_service.get_parent(parent_id).await?;
        parent.wallet_ledger.push(entry.clone());
        parent.updated_at = now;
        self.parent_service.update_parent(&parent).await?;

        info!("Created pending {:?} entry {} (session {})", entry_type, entry.id, session.session_id);
        Ok(CheckoutStarted {
            entry,
            checkout_url: session.checkout_url,
        })
    }

    async fn apply_child_effect(&self, entry: &WalletEntry, now: chrono::NaiveDateTime) -> LedgerResult<()> {
        let Some(child_id) = entry.child_id.as_deref() else {
            return Ok(());
        };

        match entry.entry_type {
            WalletEntryType::Donation => {
                let mut child = self.child_service.get_child(child_id).await?;
                child.credit_donation(entry.amount_cents, &entry.id, now);
                self.child_service.update_child(&child).await?;
                info!(
                    "Credited {} neighbor cents to child {} (balance {})",
                    entry.amount_cents, child.id, child.neighbor_balance_cents
                );
            }
            WalletEntryType::WelcomePacket => {
                let mut child = self.child_service.get_child(child_id).await?;
                child.welcome_packet_purchased = true;
                child.updated_at = now;
                self.child_service.update_child(&child).await?;
            }
            WalletEntryType::TopUp | WalletEntryType::GiftPurchase => {}
        }
        Ok(())
    }
}

fn validate_amount(amount_cents: i64) -> LedgerResult<()> {
    if amount_cents <= 0 {
        return Err(LedgerError::Validation("Payment amount must be positive".to_string()));
    }
    if amount_cents > MAX_PAYMENT_CENTS {
        return Err(LedgerError::Validation(format!(
            "Payment amount cannot exceed {} cents",
            MAX_PAYMENT_CENTS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::TestBackend;

    #[tokio::test]
    async fn test_top_up_counts_only_after_success() {
        let backend = TestBackend::new(0).await;
        let service = &backend.state.wallet_service;

        let started = service.start_top_up(&backend.parent_id, 2_000).await.unwrap();
        assert_eq!(started.entry.status, PaymentStatus::Pending);
        assert!(started.checkout_url.contains("cs_local_"));
        assert_eq!(service.get_wallet(&backend.parent_id).await.unwrap().balance_cents, 0);

        let session = started.entry.checkout_session_id.clone().unwrap();
        let settled = service.reconcile_payment(&session, true).await.unwrap();
        assert!(settled.applied);
        assert_eq!(settled.entry.status, PaymentStatus::Succeeded);

        let wallet = service.get_wallet(&backend.parent_id).await.unwrap();
        assert_eq!(wallet.balance_cents, 2_000);
        assert_eq!(wallet.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_replayed_webhook_is_a_no_op() {
        let backend = TestBackend::new(0).await;
        let service = &backend.state.wallet_service;

        let started = service.start_donation(&backend.parent_id, &backend.child_id, 450).await.unwrap();
        let session = started.entry.checkout_session_id.clone().unwrap();

        assert!(service.reconcile_payment(&session, true).await.unwrap().applied);
        let replay = service.reconcile_payment(&session, false).await.unwrap();
        assert!(!replay.applied);
        assert_eq!(replay.entry.status, PaymentStatus::Succeeded);

        let child = backend.child().await;
        assert_eq!(child.neighbor_balance_cents, 450);
        assert_eq!(child.available_points(), 4);
        assert_eq!(child.neighbor_ledger.len(), 1);
        // Donations are paid by card and leave the wallet untouched
        assert_eq!(service.get_wallet(&backend.parent_id).await.unwrap().balance_cents, 0);
    }

    #[tokio::test]
    async fn test_failed_payment_has_no_effect() {
        let backend = TestBackend::new(0).await;
        let service = &backend.state.wallet_service;

        let started = service.start_donation(&backend.parent_id, &backend.child_id, 800).await.unwrap();
        let session = started.entry.checkout_session_id.unwrap();
        let result = service.reconcile_payment(&session, false).await.unwrap();

        assert_eq!(result.entry.status, PaymentStatus::Failed);
        assert_eq!(backend.child().await.neighbor_balance_cents, 0);
    }

    #[tokio::test]
    async fn test_welcome_packet_flags_child_once() {
        let backend = TestBackend::new(0).await;
        let service = &backend.state.wallet_service;

        let started = service.start_welcome_packet(&backend.parent_id, &backend.child_id).await.unwrap();
        assert_eq!(started.entry.amount_cents, 1_999);
        let session = started.entry.checkout_session_id.unwrap();
        service.reconcile_payment(&session, true).await.unwrap();

        assert!(backend.child().await.welcome_packet_purchased);
        assert!(matches!(
            service.start_welcome_packet(&backend.parent_id, &backend.child_id).await,
            Err(LedgerError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_checkout_validation() {
        let backend = TestBackend::new(0).await;
        let service = &backend.state.wallet_service;

        assert!(matches!(service.start_top_up(&backend.parent_id, 0).await, Err(LedgerError::Validation(_))));
        assert!(matches!(
            service.start_donation("parent::stranger", &backend.child_id, 100).await,
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            service.reconcile_payment("cs_local_unknown", true).await,
            Err(LedgerError::NotFound { .. })
        ));
    }
}
