//! Gift fulfilment: ordering, shipping and delivery of approved gifts, plus
//! cancellation and failure with point refunds.
//!
//! Placing an order pays the item price out of the parent's wallet. The
//! wallet debit and the status change happen under the ledger lock.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::backend::adapters::{Notification, Notifier};
use crate::backend::domain::approval_service::ApprovalService;
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::fulfillment::{MarkOrderedCommand, MarkShippedCommand, ReleaseOrderCommand};
use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::gift_order::{GiftOrder, GiftOrderStatus, OrderEvent};
use crate::backend::domain::models::parent::{PaymentStatus, WalletEntry, WalletEntryType};
use crate::backend::domain::parent_service::ParentService;
use crate::backend::domain::points_ledger::PointsLedger;
use crate::backend::storage::csv::{CsvConnection, GiftOrderRepository};
use crate::backend::storage::GiftOrderStorage;

#[derive(Clone)]
pub struct FulfillmentService {
    gift_order_repository: GiftOrderRepository,
    approval_service: ApprovalService,
    parent_service: ParentService,
    points_ledger: PointsLedger,
    notifier: Arc<dyn Notifier>,
    ledger_lock: Arc<Mutex<()>>,
    clock: Arc<dyn Clock>,
}

impl FulfillmentService {
    pub fn new(
        csv_conn: Arc<CsvConnection>,
        approval_service: ApprovalService,
        parent_service: ParentService,
        points_ledger: PointsLedger,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gift_order_repository: GiftOrderRepository::new((*csv_conn).clone()),
            approval_service,
            parent_service,
            points_ledger,
            notifier,
            ledger_lock: csv_conn.ledger_lock(),
            clock,
        }
    }

    /// APPROVED -> ORDERED, paying for the gift from the wallet
    pub async fn mark_ordered(&self, parent_id: &str, command: MarkOrderedCommand) -> LedgerResult<GiftOrder> {
        info!("Marking gift order {} as ordered", command.gift_order_id);

        let _ledger = self.ledger_lock.lock().await;
        let original = self.approval_service.get_owned_order(parent_id, &command.gift_order_id).await?;
        let mut parent = self.parent_service.get_parent(parent_id).await?;
        let now = self.clock.now();

        let mut order = original.clone();
        order.apply(OrderEvent::PlaceOrder, now)?;

        let available_cents = parent.wallet_balance_cents();
        if available_cents < order.price_cents {
            return Err(LedgerError::InsufficientFunds {
                required_cents: order.price_cents,
                available_cents,
            });
        }

        order.vendor_reference = trimmed(command.vendor_reference);
        if order.shipping_address.is_none() {
            order.shipping_address = parent.shipping_address.clone();
        }

        parent.wallet_ledger.push(WalletEntry {
            id: WalletEntry::generate_id(),
            entry_type: WalletEntryType::GiftPurchase,
            amount_cents: order.price_cents,
            status: PaymentStatus::Succeeded,
            checkout_session_id: None,
            child_id: Some(order.child_id.clone()),
            description: format!("Gift purchase: {} ({})", order.title, order.id),
            created_at: now,
            settled_at: Some(now),
        });
        parent.updated_at = now;

        self.move_order(&order, original.status).await?;
        if let Err(e) = self.parent_service.update_parent(&parent).await {
            error!("Failed to debit wallet for gift order {}: {}", order.id, e);
            if let Err(revert) = self.gift_order_repository.compare_and_set_gift_order(&original, order.status).await {
                error!("Failed to revert gift order {}: {}", order.id, revert);
            }
            return Err(e);
        }

        info!(
            "Gift order {} ordered; wallet balance now {} cents",
            order.id,
            parent.wallet_balance_cents()
        );
        self.notify_status(&order).await;
        Ok(order)
    }

    /// ORDERED -> SHIPPED
    pub async fn mark_shipped(&self, parent_id: &str, command: MarkShippedCommand) -> LedgerResult<GiftOrder> {
        info!("Marking gift order {} as shipped", command.gift_order_id);

        let original = self.approval_service.get_owned_order(parent_id, &command.gift_order_id).await?;
        let mut order = original.clone();
        order.apply(OrderEvent::Ship, self.clock.now())?;
        order.tracking_number = trimmed(command.tracking_number);

        self.move_order(&order, original.status).await?;
        self.notify_status(&order).await;
        Ok(order)
    }

    /// SHIPPED -> DELIVERED
    pub async fn mark_delivered(&self, parent_id: &str, gift_order_id: &str) -> LedgerResult<GiftOrder> {
        info!("Marking gift order {} as delivered", gift_order_id);

        let original = self.approval_service.get_owned_order(parent_id, gift_order_id).await?;
        let mut order = original.clone();
        order.apply(OrderEvent::Deliver, self.clock.now())?;

        self.move_order(&order, original.status).await?;
        self.notify_status(&order).await;
        Ok(order)
    }

    /// Cancel a pending or approved order; approved orders get their points back
    pub async fn cancel_order(&self, parent_id: &str, command: ReleaseOrderCommand) -> LedgerResult<GiftOrder> {
        info!("Cancelling gift order {}", command.gift_order_id);
        self.release(parent_id, command, OrderEvent::Cancel).await
    }

    /// Record that a pending or approved order could not be fulfilled
    pub async fn fail_order(&self, parent_id: &str, command: ReleaseOrderCommand) -> LedgerResult<GiftOrder> {
        info!("Failing gift order {}", command.gift_order_id);
        if trimmed(command.reason.clone()).is_none() {
            return Err(LedgerError::Validation("A failure reason is required".to_string()));
        }
        self.release(parent_id, command, OrderEvent::Fail).await
    }

    pub async fn get_order(&self, parent_id: &str, gift_order_id: &str) -> LedgerResult<GiftOrder> {
        self.approval_service.get_owned_order(parent_id, gift_order_id).await
    }

    /// Orders across the parent's children, most recent first
    pub async fn list_orders(&self, parent_id: &str, status: Option<GiftOrderStatus>) -> LedgerResult<Vec<GiftOrder>> {
        info!("Listing gift orders for parent {} (status {:?})", parent_id, status);
        Ok(self.gift_order_repository.list_gift_orders_for_parent(parent_id, status).await?)
    }

    async fn release(&self, parent_id: &str, command: ReleaseOrderCommand, event: OrderEvent) -> LedgerResult<GiftOrder> {
        let order = self.approval_service.get_owned_order(parent_id, &command.gift_order_id).await?;
        let outcome = self
            .points_ledger
            .release(&order.id, event, trimmed(command.reason), self.clock.now())
            .await?;

        self.notify_status(&outcome.gift_order).await;
        Ok(outcome.gift_order)
    }

    async fn move_order(&self, order: &GiftOrder, expected: GiftOrderStatus) -> LedgerResult<()> {
        if !self.gift_order_repository.compare_and_set_gift_order(order, expected).await? {
            return Err(LedgerError::InvalidState(format!(
                "Gift order {} is no longer {}",
                order.id, expected
            )));
        }
        Ok(())
    }

    async fn notify_status(&self, order: &GiftOrder) {
        let notification = Notification::OrderStatusChanged {
            parent_id: order.parent_id.clone(),
            gift_order_id: order.id.clone(),
            title: order.title.clone(),
            status: order.status.to_string(),
        };
        if let Err(e) = self.notifier.notify(notification).await {
            warn!("Failed to send status notification for {}: {}", order.id, e);
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
