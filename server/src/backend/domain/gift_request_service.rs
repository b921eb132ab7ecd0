//! Gift request creation.
//!
//! ## Business Rules
//!
//! - The child must exist and belong to the calling parent
//! - A gift costs its price rounded up to whole dollars, in magic points
//! - CHRISTMAS requests are only accepted inside the Christmas window
//! - REWARD requests respect the parent's yearly quota and price cap
//! - Early and friend requests always wait for the parent
//! - Creating a request only checks affordability; points move when the
//!   order is approved, whether by policy or by the parent

use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::adapters::{Notification, Notifier};
use crate::backend::domain::child_service::ChildService;
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::gift_requests::{
    RequestGiftCommand, RequestGiftResult, SpecialGiftCommand, SpecialGiftResult,
};
use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::approval_settings::GiftApprovalSettings;
use crate::backend::domain::models::catalog_item::CatalogItem;
use crate::backend::domain::models::child::{Child, GiftRequestRecord, RequestKind, RequestStatus};
use crate::backend::domain::models::gift_order::{GiftOrder, OrderType};
use crate::backend::domain::parent_service::ParentService;
use crate::backend::domain::points_ledger::PointsLedger;
use crate::backend::domain::policy_service::PolicyService;
use crate::backend::domain::window_policy::{is_christmas_window, ChristmasWindow};
use crate::backend::storage::csv::{CatalogRepository, CsvConnection, GiftOrderRepository};
use crate::backend::storage::{CatalogStorage, GiftOrderStorage};
use chrono::{Datelike, NaiveDateTime};

const MAX_FRIEND_NAME_LENGTH: usize = 100;

#[derive(Clone)]
pub struct GiftRequestService {
    gift_order_repository: GiftOrderRepository,
    catalog_repository: CatalogRepository,
    child_service: ChildService,
    parent_service: ParentService,
    policy_service: PolicyService,
    points_ledger: PointsLedger,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl GiftRequestService {
    pub fn new(
        csv_conn: Arc<CsvConnection>,
        child_service: ChildService,
        parent_service: ParentService,
        policy_service: PolicyService,
        points_ledger: PointsLedger,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gift_order_repository: GiftOrderRepository::new((*csv_conn).clone()),
            catalog_repository: CatalogRepository::new((*csv_conn).clone()),
            child_service,
            parent_service,
            policy_service,
            points_ledger,
            notifier,
            clock,
        }
    }

    /// Create a CHRISTMAS or REWARD gift order, approving it immediately when
    /// the parent's policy allows
    pub async fn request_gift(&self, parent_id: &str, command: RequestGiftCommand) -> LedgerResult<RequestGiftResult> {
        info!(
            "Gift request from child {}: {} ({})",
            command.child_id, command.catalog_item_id, command.order_type
        );

        let child = self.child_service.get_owned_child(parent_id, &command.child_id).await?;
        let item = self.load_catalog_item(&command.catalog_item_id).await?;
        ensure_affordable(&child, &item)?;

        let now = self.clock.now();
        let settings = self.parent_service.get_approval_settings(parent_id).await?;

        let auto_approve = match command.order_type {
            OrderType::Christmas => {
                if !is_christmas_window(now) {
                    let window = ChristmasWindow::for_year(now.year())?;
                    return Err(LedgerError::WindowClosed(window.describe()));
                }
                settings.auto_approve_christmas
            }
            OrderType::Reward => {
                self.check_reward_limits(&child, &item, &settings, now).await?;
                settings.auto_approves_reward(item.cost_points())
            }
            OrderType::SpecialOccasion => {
                return Err(LedgerError::Validation(
                    "Special occasion gifts are requested as early or friend gifts".to_string(),
                ));
            }
        };

        let mut order = GiftOrder::new_pending(parent_id, &child.id, &item, command.order_type, now);
        order.behavior_reason = trimmed(command.behavior_reason);
        order.shipping_address = trimmed(command.shipping_address);

        if auto_approve {
            let outcome = self.points_ledger.store_auto_approved(order, now).await?;
            self.send(Notification::DecisionMade {
                parent_id: parent_id.to_string(),
                child_id: child.id.clone(),
                gift_order_id: outcome.gift_order.id.clone(),
                title: outcome.gift_order.title.clone(),
                approved: true,
            })
            .await;

            let points_deducted = outcome.gift_order.cost_points;
            return Ok(RequestGiftResult {
                gift_order: outcome.gift_order,
                points_deducted,
            });
        }

        self.gift_order_repository.store_gift_order(&order).await?;
        info!("Gift order {} is waiting for approval", order.id);
        self.notify_approval_needed(&child, &order).await;

        Ok(RequestGiftResult {
            gift_order: order,
            points_deducted: 0,
        })
    }

    /// Ask for a gift from the child's list before Christmas
    pub async fn request_early_gift(&self, parent_id: &str, command: SpecialGiftCommand) -> LedgerResult<SpecialGiftResult> {
        info!("Early gift request from child {}: {}", command.child_id, command.gift_id);

        let child = self.child_service.get_owned_child(parent_id, &command.child_id).await?;
        if !child.has_gift_on_list(&command.gift_id) {
            return Err(LedgerError::Validation(format!(
                "{} is not on {}'s gift list",
                command.gift_id, child.name
            )));
        }
        self.create_special_request(parent_id, child, &command.gift_id, RequestKind::Early, None)
            .await
    }

    /// Ask for a gift to give to a friend
    pub async fn request_friend_gift(&self, parent_id: &str, command: SpecialGiftCommand) -> LedgerResult<SpecialGiftResult> {
        info!("Friend gift request from child {}: {}", command.child_id, command.gift_id);

        let friend_name = trimmed(command.friend_name)
            .ok_or_else(|| LedgerError::Validation("Friend name cannot be empty".to_string()))?;
        if friend_name.len() > MAX_FRIEND_NAME_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Friend name cannot exceed {} characters",
                MAX_FRIEND_NAME_LENGTH
            )));
        }

        let child = self.child_service.get_owned_child(parent_id, &command.child_id).await?;
        self.create_special_request(parent_id, child, &command.gift_id, RequestKind::Friend, Some(friend_name))
            .await
    }

    async fn create_special_request(
        &self,
        parent_id: &str,
        mut child: Child,
        gift_id: &str,
        kind: RequestKind,
        friend_name: Option<String>,
    ) -> LedgerResult<SpecialGiftResult> {
        let item = self.load_catalog_item(gift_id).await?;
        if child.has_pending_request(kind, gift_id) {
            return Err(LedgerError::Conflict(format!(
                "There is already a pending request for {}",
                item.title
            )));
        }
        ensure_affordable(&child, &item)?;

        let now = self.clock.now();
        let order = GiftOrder::new_pending(parent_id, &child.id, &item, OrderType::SpecialOccasion, now);
        let record = GiftRequestRecord {
            gift_order_id: order.id.clone(),
            gift_id: item.id.clone(),
            friend_name,
            price_cents: item.price_cents,
            requested_points: order.cost_points,
            status: RequestStatus::Pending,
            requested_at: now,
            decided_at: None,
        };
        child.push_request(kind, record.clone(), now);

        self.points_ledger.store_pending_with_child(&order, &child, now).await?;
        info!("Recorded {:?} request {} for child {}", kind, order.id, child.id);
        self.notify_approval_needed(&child, &order).await;

        Ok(SpecialGiftResult {
            gift_order: order,
            request: record,
        })
    }

    async fn check_reward_limits(
        &self,
        child: &Child,
        item: &CatalogItem,
        settings: &GiftApprovalSettings,
        now: NaiveDateTime,
    ) -> LedgerResult<()> {
        if item.price_cents > settings.max_reward_price_cents {
            return Err(LedgerError::LimitExceeded(format!(
                "{} costs {} cents, above the reward gift limit of {} cents",
                item.title, item.price_cents, settings.max_reward_price_cents
            )));
        }

        let stats = self.policy_service.reward_stats(&child.id, settings, now).await?;
        if stats.limit_reached() {
            return Err(LedgerError::LimitExceeded(format!(
                "{} has already received {} of {} reward gifts in {}",
                child.name, stats.used_reward_gifts, stats.max_reward_gifts_per_year, stats.year
            )));
        }
        Ok(())
    }

    async fn load_catalog_item(&self, item_id: &str) -> LedgerResult<CatalogItem> {
        self.catalog_repository
            .get_catalog_item(item_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Catalog item", item_id))
    }

    async fn notify_approval_needed(&self, child: &Child, order: &GiftOrder) {
        self.send(Notification::ApprovalNeeded {
            parent_id: order.parent_id.clone(),
            child_name: child.name.clone(),
            gift_order_id: order.id.clone(),
            title: order.title.clone(),
            cost_points: order.cost_points,
        })
        .await;
    }

    async fn send(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            warn!("Failed to send notification: {}", e);
        }
    }
}

fn ensure_affordable(child: &Child, item: &CatalogItem) -> LedgerResult<()> {
    let required = item.cost_points();
    let available = child.available_points();
    if required > available {
        return Err(LedgerError::InsufficientPoints { required, available });
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
