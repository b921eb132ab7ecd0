//! End-of-season reset.
//!
//! Once Christmas has passed and the parent has finalized the lists, the
//! parent can start a new season: gift lists, request records and behavior
//! scores are cleared, orders still waiting for a decision are cancelled, and
//! the lists are unlocked again. Wallet and neighbor balances, approval
//! settings and the shipping address carry over. There is no undo.
//!
//! Approved orders that were not placed yet stay approved. The score part of
//! the points they hold is moved to neighbor cents, so cancelling one later
//! refunds the neighbor balance and never the new season's score.
//!
//! The whole reset runs under the ledger lock. `lists_finalized` is cleared
//! last, so a reset that stops on a storage error can simply be run again:
//! every step skips work that is already done.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::backend::domain::child_service::ChildService;
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::family::YearlyResetResult;
use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::child::Child;
use crate::backend::domain::models::gift_order::{GiftOrder, GiftOrderStatus, OrderEvent};
use crate::backend::domain::parent_service::ParentService;
use crate::backend::domain::window_policy::is_yearly_reset_open;
use crate::backend::storage::csv::{CsvConnection, GiftOrderRepository};
use crate::backend::storage::GiftOrderStorage;
use chrono::NaiveDateTime;

const SEASON_RESET_REASON: &str = "Season reset";

#[derive(Clone)]
pub struct YearlyResetService {
    gift_order_repository: GiftOrderRepository,
    parent_service: ParentService,
    child_service: ChildService,
    ledger_lock: Arc<Mutex<()>>,
    clock: Arc<dyn Clock>,
}

/// What a reset has written so far
#[derive(Debug, Default)]
struct ResetProgress {
    cancelled_orders: Vec<String>,
    carried_over_orders: Vec<String>,
    children_reset: Vec<String>,
}

impl YearlyResetService {
    pub fn new(
        csv_conn: Arc<CsvConnection>,
        parent_service: ParentService,
        child_service: ChildService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gift_order_repository: GiftOrderRepository::new((*csv_conn).clone()),
            parent_service,
            child_service,
            ledger_lock: csv_conn.ledger_lock(),
            clock,
        }
    }

    pub async fn reset(&self, parent_id: &str) -> LedgerResult<YearlyResetResult> {
        info!("Yearly reset requested by parent {}", parent_id);

        let _ledger = self.ledger_lock.lock().await;
        let parent = self.parent_service.get_parent(parent_id).await?;
        let now = self.clock.now();
        if !is_yearly_reset_open(now) {
            return Err(LedgerError::WindowClosed(
                "The yearly reset is only available from December 26 through December 31".to_string(),
            ));
        }
        if !parent.lists_finalized {
            return Err(LedgerError::InvalidState(
                "Finalize the gift lists before starting a new season".to_string(),
            ));
        }

        let orders = self.gift_order_repository.list_gift_orders_for_parent(parent_id, None).await?;
        let children = self.child_service.list_children(parent_id).await?;

        let mut progress = ResetProgress::default();
        if let Err(e) = self.apply_reset(&orders, children, now, &mut progress).await {
            error!(
                "Yearly reset for parent {} stopped: {}. Already written: cancelled orders {:?}, \
                 carried-over orders {:?}, reset children {:?}. Lists stay finalized; run the reset again to finish.",
                parent_id, e, progress.cancelled_orders, progress.carried_over_orders, progress.children_reset
            );
            return Err(e);
        }

        self.parent_service.set_lists_finalized(parent_id, false).await?;

        info!(
            "Yearly reset for parent {}: {} children reset, {} pending orders cancelled, {} approved orders carried over",
            parent_id,
            progress.children_reset.len(),
            progress.cancelled_orders.len(),
            progress.carried_over_orders.len()
        );
        Ok(YearlyResetResult {
            children_reset: progress.children_reset.len(),
            cancelled_orders: progress.cancelled_orders.len(),
        })
    }

    async fn apply_reset(
        &self,
        orders: &[GiftOrder],
        children: Vec<Child>,
        now: NaiveDateTime,
        progress: &mut ResetProgress,
    ) -> LedgerResult<()> {
        for original in orders {
            let mut order = original.clone();
            match original.status {
                // Pending orders hold no points; their request records go with the reset
                GiftOrderStatus::PendingApproval => {
                    order.apply(OrderEvent::Cancel, now)?;
                    order.status_reason = Some(SEASON_RESET_REASON.to_string());
                    self.move_order(&order, original.status).await?;
                    progress.cancelled_orders.push(order.id);
                }
                GiftOrderStatus::Approved => {
                    if order.carry_over_season(now) {
                        self.move_order(&order, original.status).await?;
                        progress.carried_over_orders.push(order.id);
                    }
                }
                _ => {}
            }
        }

        for mut child in children {
            child.reset_for_new_season(now);
            self.child_service.update_child(&child).await?;
            progress.children_reset.push(child.id);
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
}
