//! # Points Ledger
//!
//! The only place where gift orders change status together with a child's
//! points. Every method holds the connection-wide ledger lock for its whole
//! read-modify-write cycle and moves the order with a compare-and-set on its
//! stored status, so an order is approved (and its points deducted) at most
//! once no matter how many callers race.
//!
//! Reward orders are checked against the parent's yearly reward quota inside
//! the same lock, so racing approvals cannot push a child past the cap.
//!
//! Write order is always gift order first, then child. If the child write
//! fails after an approval was recorded, the order is moved to `FAILED` so it
//! never claims points that were not taken.

use chrono::NaiveDateTime;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::child::Child;
use crate::backend::domain::models::gift_order::{GiftOrder, GiftOrderStatus, OrderEvent, OrderType};
use crate::backend::domain::points::{self, PointsDeduction};
use crate::backend::domain::policy_service::count_reward_gifts;
use crate::backend::domain::window_policy::reward_year;
use crate::backend::storage::csv::{ApprovalSettingsRepository, ChildRepository, CsvConnection, GiftOrderRepository};
use crate::backend::storage::{ApprovalSettingsStorage, ChildStorage, GiftOrderStorage};

/// An order together with the child as it stands after the change
#[derive(Debug, Clone)]
pub struct LedgerOutcome {
    pub gift_order: GiftOrder,
    pub child: Child,
}

#[derive(Clone)]
pub struct PointsLedger {
    gift_order_repository: GiftOrderRepository,
    child_repository: ChildRepository,
    settings_repository: ApprovalSettingsRepository,
    ledger_lock: Arc<Mutex<()>>,
}

impl PointsLedger {
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        Self {
            gift_order_repository: GiftOrderRepository::new((*csv_conn).clone()),
            child_repository: ChildRepository::new((*csv_conn).clone()),
            settings_repository: ApprovalSettingsRepository::new((*csv_conn).clone()),
            ledger_lock: csv_conn.ledger_lock(),
        }
    }

    /// Persist a brand-new order that the approval policy approves on the spot
    pub async fn store_auto_approved(&self, order: GiftOrder, now: NaiveDateTime) -> LedgerResult<LedgerOutcome> {
        let _ledger = self.ledger_lock.lock().await;

        self.ensure_reward_quota(&order, now).await?;
        let mut child = self.load_child(&order.child_id).await?;
        let mut order = order;
        let deduction = plan_deduction(&child, order.cost_points)?;

        order.apply(OrderEvent::Approve, now)?;
        order.auto_approved = true;
        order.record_deduction(&deduction);
        child.apply_deduction(&deduction, &order.id, now);

        self.gift_order_repository.store_gift_order(&order).await?;
        self.commit_child_or_fail_order(&mut order, &child, now).await?;

        info!(
            "Auto-approved gift order {}: {} points ({} from score, {} neighbor cents)",
            order.id, deduction.points, deduction.from_score, deduction.neighbor_cents
        );
        Ok(LedgerOutcome { gift_order: order, child })
    }

    /// Persist a new pending order together with the child document that
    /// records it (early and friend requests)
    pub async fn store_pending_with_child(
        &self,
        order: &GiftOrder,
        child: &Child,
        now: NaiveDateTime,
    ) -> LedgerResult<()> {
        let _ledger = self.ledger_lock.lock().await;

        self.gift_order_repository.store_gift_order(order).await?;
        if let Err(e) = self.child_repository.update_child(child).await {
            error!("Failed to record request for gift order {} on child: {}", order.id, e);
            let mut failed = order.clone();
            if failed.apply(OrderEvent::Fail, now).is_ok() {
                failed.status_reason = Some("Request could not be recorded".to_string());
                self.restore_order(&failed, GiftOrderStatus::PendingApproval).await;
            }
            return Err(LedgerError::Storage(e));
        }
        Ok(())
    }

    /// Approve a pending order and deduct its points
    pub async fn approve(
        &self,
        order_id: &str,
        note: Option<String>,
        now: NaiveDateTime,
    ) -> LedgerResult<LedgerOutcome> {
        let _ledger = self.ledger_lock.lock().await;

        let mut order = self.load_order(order_id).await?;
        let expected = order.status;
        order.apply(OrderEvent::Approve, now)?;
        self.ensure_reward_quota(&order, now).await?;

        let mut child = self.load_child(&order.child_id).await?;
        let deduction = plan_deduction(&child, order.cost_points)?;
        order.record_deduction(&deduction);
        order.parent_note = note;

        child.apply_deduction(&deduction, &order.id, now);
        if let Some(record) = child.request_for_order_mut(&order.id) {
            record.decide(true, now);
        }

        self.move_order(&order, expected).await?;
        self.commit_child_or_fail_order(&mut order, &child, now).await?;

        info!(
            "Approved gift order {}: {} points ({} from score, {} neighbor cents)",
            order.id, deduction.points, deduction.from_score, deduction.neighbor_cents
        );
        Ok(LedgerOutcome { gift_order: order, child })
    }

    /// Deny a pending order; no points move
    pub async fn deny(&self, order_id: &str, note: Option<String>, now: NaiveDateTime) -> LedgerResult<LedgerOutcome> {
        let _ledger = self.ledger_lock.lock().await;

        let mut order = self.load_order(order_id).await?;
        let expected = order.status;
        order.apply(OrderEvent::Deny, now)?;
        order.parent_note = note;

        let mut child = self.load_child(&order.child_id).await?;
        let has_record = child
            .request_for_order_mut(&order.id)
            .map(|record| record.decide(false, now))
            .unwrap_or(false);

        self.move_order(&order, expected).await?;
        if has_record {
            child.updated_at = now;
            self.child_repository.update_child(&child).await?;
        }

        info!("Denied gift order {}", order.id);
        Ok(LedgerOutcome { gift_order: order, child })
    }

    /// Cancel or fail an order, refunding exactly what it held
    pub async fn release(
        &self,
        order_id: &str,
        event: OrderEvent,
        reason: Option<String>,
        now: NaiveDateTime,
    ) -> LedgerResult<LedgerOutcome> {
        let _ledger = self.ledger_lock.lock().await;

        let original = self.load_order(order_id).await?;
        let held = original.held_deduction();

        let mut order = original.clone();
        order.apply(event, now)?;
        order.status_reason = reason;

        let mut child = self.load_child(&order.child_id).await?;
        let mut child_changed = false;
        if let Some(deduction) = held {
            child.apply_refund(&deduction, &order.id, now);
            child_changed = true;
        }
        if let Some(record) = child.request_for_order_mut(&order.id) {
            child_changed |= record.decide(false, now);
        }

        self.move_order(&order, original.status).await?;
        if child_changed {
            if let Err(e) = self.child_repository.update_child(&child).await {
                error!("Failed to refund points for gift order {}: {}", order.id, e);
                self.restore_order(&original, order.status).await;
                return Err(LedgerError::Storage(e));
            }
        }

        match held {
            Some(d) => info!(
                "Released gift order {} as {}: refunded {} points ({} to score, {} neighbor cents)",
                order.id, order.status, d.points, d.from_score, d.neighbor_cents
            ),
            None => info!("Released gift order {} as {}", order.id, order.status),
        }
        Ok(LedgerOutcome { gift_order: order, child })
    }

    async fn load_order(&self, order_id: &str) -> LedgerResult<GiftOrder> {
        self.gift_order_repository
            .get_gift_order(order_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Gift order", order_id))
    }

    async fn load_child(&self, child_id: &str) -> LedgerResult<Child> {
        self.child_repository
            .get_child(child_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Child", child_id))
    }

    /// Reject a reward approval once the child's yearly quota is used up.
    /// Must be called with the ledger lock held.
    async fn ensure_reward_quota(&self, order: &GiftOrder, now: NaiveDateTime) -> LedgerResult<()> {
        if order.order_type != OrderType::Reward {
            return Ok(());
        }

        let settings = self
            .settings_repository
            .get_approval_settings(&order.parent_id)
            .await?
            .unwrap_or_default();
        let year = reward_year(now);
        let orders = self.gift_order_repository.list_gift_orders_for_child(&order.child_id).await?;
        let used = count_reward_gifts(&orders, year);

        if used >= settings.max_reward_gifts_per_year {
            return Err(LedgerError::LimitExceeded(format!(
                "Reward gift limit reached: {} of {} used in {}",
                used, settings.max_reward_gifts_per_year, year
            )));
        }
        Ok(())
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

    /// Write the child after an approval; on failure mark the order FAILED
    async fn commit_child_or_fail_order(
        &self,
        order: &mut GiftOrder,
        child: &Child,
        now: NaiveDateTime,
    ) -> LedgerResult<()> {
        let Err(e) = self.child_repository.update_child(child).await else {
            return Ok(());
        };

        error!("Failed to deduct points for gift order {}: {}", order.id, e);
        let approved = order.status;
        if order.apply(OrderEvent::Fail, now).is_ok() {
            order.record_deduction(&PointsDeduction::default());
            order.status_reason = Some("Points could not be deducted".to_string());
            self.restore_order(order, approved).await;
        }
        Err(LedgerError::Storage(e))
    }

    /// Best-effort compensation write; failures are logged only
    async fn restore_order(&self, order: &GiftOrder, expected: GiftOrderStatus) {
        match self.gift_order_repository.compare_and_set_gift_order(order, expected).await {
            Ok(true) => debug!("Compensated gift order {} to {}", order.id, order.status),
            Ok(false) => error!("Gift order {} changed before it could be compensated", order.id),
            Err(e) => error!("Failed to compensate gift order {}: {}", order.id, e),
        }
    }
}

fn plan_deduction(child: &Child, cost: u32) -> LedgerResult<PointsDeduction> {
    points::plan_deduction(child.score365, child.neighbor_balance_cents, cost).ok_or(
        LedgerError::InsufficientPoints {
            required: cost,
            available: child.available_points(),
        },
    )
}
