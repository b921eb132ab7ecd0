//! Parent decisions on pending gift orders.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::adapters::{Notification, Notifier};
use crate::backend::domain::child_service::ChildService;
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::approvals::{ApprovalResult, ApproveGiftCommand, PendingApprovalView};
use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::gift_order::{GiftOrder, GiftOrderStatus};
use crate::backend::domain::points_ledger::PointsLedger;
use crate::backend::storage::csv::{CsvConnection, GiftOrderRepository};
use crate::backend::storage::GiftOrderStorage;

#[derive(Clone)]
pub struct ApprovalService {
    gift_order_repository: GiftOrderRepository,
    child_service: ChildService,
    points_ledger: PointsLedger,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl ApprovalService {
    pub fn new(
        csv_conn: Arc<CsvConnection>,
        child_service: ChildService,
        points_ledger: PointsLedger,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gift_order_repository: GiftOrderRepository::new((*csv_conn).clone()),
            child_service,
            points_ledger,
            notifier,
            clock,
        }
    }

    /// Approve or deny a pending gift order. Only the owning parent may decide,
    /// and only once.
    pub async fn approve_gift_request(&self, parent_id: &str, command: ApproveGiftCommand) -> LedgerResult<ApprovalResult> {
        info!(
            "Parent {} {} gift order {}",
            parent_id,
            if command.approved { "approving" } else { "denying" },
            command.gift_order_id
        );

        let order = self.get_owned_order(parent_id, &command.gift_order_id).await?;
        let note = command.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let now = self.clock.now();

        let outcome = if command.approved {
            self.points_ledger.approve(&order.id, note, now).await?
        } else {
            self.points_ledger.deny(&order.id, note, now).await?
        };

        if let Err(e) = self
            .notifier
            .notify(Notification::DecisionMade {
                parent_id: parent_id.to_string(),
                child_id: outcome.child.id.clone(),
                gift_order_id: outcome.gift_order.id.clone(),
                title: outcome.gift_order.title.clone(),
                approved: command.approved,
            })
            .await
        {
            warn!("Failed to send decision notification: {}", e);
        }

        Ok(ApprovalResult {
            remaining_points: outcome.child.available_points(),
            gift_order: outcome.gift_order,
        })
    }

    /// Every order of the parent's children still waiting for a decision
    pub async fn get_pending_approvals(&self, parent_id: &str) -> LedgerResult<Vec<PendingApprovalView>> {
        info!("Getting pending approvals for parent {}", parent_id);

        let orders = self
            .gift_order_repository
            .list_gift_orders_for_parent(parent_id, Some(GiftOrderStatus::PendingApproval))
            .await?;
        let children: HashMap<String, _> = self
            .child_service
            .list_children(parent_id)
            .await?
            .into_iter()
            .map(|child| (child.id.clone(), child))
            .collect();

        let mut pending = Vec::with_capacity(orders.len());
        for order in orders {
            let Some(child) = children.get(&order.child_id) else {
                warn!("Pending gift order {} refers to unknown child {}", order.id, order.child_id);
                continue;
            };
            pending.push(PendingApprovalView {
                affordable: child.available_points() >= order.cost_points,
                child_name: child.name.clone(),
                gift_order: order,
            });
        }
        Ok(pending)
    }

    /// Load an order the caller is allowed to act on
    pub async fn get_owned_order(&self, parent_id: &str, order_id: &str) -> LedgerResult<GiftOrder> {
        let order = self
            .gift_order_repository
            .get_gift_order(order_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Gift order", order_id))?;

        if order.parent_id != parent_id {
            warn!("Parent {} tried to act on gift order {} of {}", parent_id, order_id, order.parent_id);
            return Err(LedgerError::Forbidden(format!(
                "Gift order {} does not belong to this parent",
                order_id
            )));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::commands::gift_requests::{RequestGiftCommand, SpecialGiftCommand};
    use crate::backend::domain::models::approval_settings::GiftApprovalSettings;
    use crate::backend::domain::models::child::RequestStatus;
    use crate::backend::domain::models::gift_order::OrderType;
    use crate::backend::test_support::TestBackend;

    async fn pending_reward(backend: &TestBackend, price_cents: i64) -> GiftOrder {
        let item = backend.add_catalog_item("Yo-yo", price_cents).await;
        backend
            .state
            .gift_request_service
            .request_gift(
                &backend.parent_id,
                RequestGiftCommand {
                    child_id: backend.child_id.clone(),
                    catalog_item_id: item.id,
                    order_type: OrderType::Reward,
                    behavior_reason: None,
                    shipping_address: None,
                },
            )
            .await
            .unwrap()
            .gift_order
    }

    fn decide(order: &GiftOrder, approved: bool) -> ApproveGiftCommand {
        ApproveGiftCommand {
            gift_order_id: order.id.clone(),
            approved,
            note: Some("Well earned".to_string()),
        }
    }

    #[tokio::test]
    async fn test_approval_deducts_score_then_neighbor_balance() {
        let backend = TestBackend::new(5).await;
        backend.credit_neighbor_cents(300).await;
        let order = pending_reward(&backend, 600).await;

        let result = backend
            .state
            .approval_service
            .approve_gift_request(&backend.parent_id, decide(&order, true))
            .await
            .unwrap();

        assert_eq!(result.gift_order.status, GiftOrderStatus::Approved);
        assert_eq!(result.gift_order.parent_note.as_deref(), Some("Well earned"));
        assert!(result.gift_order.approved_at.is_some());
        assert_eq!(result.remaining_points, 2);

        let child = backend.child().await;
        assert_eq!(child.score365, 0);
        assert_eq!(child.neighbor_balance_cents, 200);
    }

    #[tokio::test]
    async fn test_reapproval_and_denial_after_decision_fail() {
        let backend = TestBackend::new(50).await;
        let order = pending_reward(&backend, 500).await;
        let service = &backend.state.approval_service;

        service.approve_gift_request(&backend.parent_id, decide(&order, true)).await.unwrap();

        for approved in [true, false] {
            let again = service.approve_gift_request(&backend.parent_id, decide(&order, approved)).await;
            assert!(matches!(again, Err(LedgerError::InvalidState(_))));
        }
        assert_eq!(backend.child().await.score365, 45);
    }

    #[tokio::test]
    async fn test_concurrent_approvals_deduct_once() {
        let backend = TestBackend::new(100).await;
        let order = pending_reward(&backend, 1_000).await;
        let service = backend.state.approval_service.clone();

        let (first, second) = tokio::join!(
            service.approve_gift_request(&backend.parent_id, decide(&order, true)),
            service.approve_gift_request(&backend.parent_id, decide(&order, true)),
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(matches!(
            [first, second].into_iter().find(|r| r.is_err()),
            Some(Err(LedgerError::InvalidState(_)))
        ));
        assert_eq!(backend.child().await.score365, 90);
    }

    #[tokio::test]
    async fn test_deny_cancels_without_moving_points() {
        let backend = TestBackend::new(20).await;
        let order = pending_reward(&backend, 900).await;

        let result = backend
            .state
            .approval_service
            .approve_gift_request(&backend.parent_id, decide(&order, false))
            .await
            .unwrap();

        assert_eq!(result.gift_order.status, GiftOrderStatus::Cancelled);
        assert_eq!(result.remaining_points, 20);
    }

    #[tokio::test]
    async fn test_only_owning_parent_may_decide() {
        let backend = TestBackend::new(20).await;
        let order = pending_reward(&backend, 900).await;

        let result = backend
            .state
            .approval_service
            .approve_gift_request("parent::stranger", decide(&order, true))
            .await;
        assert!(matches!(result, Err(LedgerError::Forbidden(_))));

        let missing = backend
            .state
            .approval_service
            .approve_gift_request(
                &backend.parent_id,
                ApproveGiftCommand {
                    gift_order_id: "gift_order::missing".to_string(),
                    approved: true,
                    note: None,
                },
            )
            .await;
        assert!(matches!(missing, Err(LedgerError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_decision_settles_friend_request_record() {
        let backend = TestBackend::new(40).await;
        let item = backend.add_catalog_item("Comic", 700).await;
        let request = backend
            .state
            .gift_request_service
            .request_friend_gift(
                &backend.parent_id,
                SpecialGiftCommand {
                    child_id: backend.child_id.clone(),
                    gift_id: item.id,
                    friend_name: Some("Liam".to_string()),
                },
            )
            .await
            .unwrap();

        backend
            .state
            .approval_service
            .approve_gift_request(&backend.parent_id, decide(&request.gift_order, true))
            .await
            .unwrap();

        let child = backend.child().await;
        assert_eq!(child.friend_gift_requests[0].status, RequestStatus::Approved);
        assert!(child.friend_gift_requests[0].decided_at.is_some());
        assert_eq!(child.score365, 33);
    }

    #[tokio::test]
    async fn test_parent_approval_respects_yearly_reward_limit() {
        let backend = TestBackend::new(50).await;
        backend
            .state
            .parent_service
            .update_approval_settings(
                &backend.parent_id,
                GiftApprovalSettings {
                    max_reward_gifts_per_year: 1,
                    auto_approve_rewards: false,
                    ..GiftApprovalSettings::default()
                },
            )
            .await
            .unwrap();
        let first = pending_reward(&backend, 300).await;
        let second = pending_reward(&backend, 300).await;
        let third = pending_reward(&backend, 300).await;
        let service = &backend.state.approval_service;

        service.approve_gift_request(&backend.parent_id, decide(&first, true)).await.unwrap();
        let over = service.approve_gift_request(&backend.parent_id, decide(&second, true)).await;
        assert!(matches!(over, Err(LedgerError::LimitExceeded(_))));

        let still_pending = service.get_owned_order(&backend.parent_id, &second.id).await.unwrap();
        assert_eq!(still_pending.status, GiftOrderStatus::PendingApproval);
        assert_eq!(backend.child().await.score365, 47);

        let denied = service.approve_gift_request(&backend.parent_id, decide(&third, false)).await.unwrap();
        assert_eq!(denied.gift_order.status, GiftOrderStatus::Cancelled);

        let stats = backend
            .state
            .policy_service
            .get_reward_gift_stats(&backend.parent_id, &backend.child_id)
            .await
            .unwrap();
        assert_eq!(stats.used_reward_gifts, 1);
        assert!(stats.used_reward_gifts <= stats.max_reward_gifts_per_year);
    }

    #[tokio::test]
    async fn test_pending_approvals_report_affordability() {
        let backend = TestBackend::new(8).await;
        let cheap = pending_reward(&backend, 500).await;
        let pricey = pending_reward(&backend, 800).await;
        backend
            .state
            .child_service
            .adjust_score(
                &backend.parent_id,
                crate::backend::domain::commands::family::AdjustScoreCommand {
                    child_id: backend.child_id.clone(),
                    delta: -2,
                    reason: None,
                },
            )
            .await
            .unwrap();

        let pending = backend.state.approval_service.get_pending_approvals(&backend.parent_id).await.unwrap();
        assert_eq!(pending.len(), 2);
        let by_id = |id: &str| pending.iter().find(|p| p.gift_order.id == id).unwrap();
        assert!(by_id(&cheap.id).affordable);
        assert!(!by_id(&pricey.id).affordable);
        assert_eq!(by_id(&cheap.id).child_name, "Ava");
    }
}
