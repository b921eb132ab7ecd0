//! Read-only policy queries: the Christmas window and the yearly reward quota.

use std::sync::Arc;
use tracing::info;

use crate::backend::domain::child_service::ChildService;
use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::policy::{ChristmasWindowView, RewardGiftStats};
use crate::backend::domain::errors::LedgerResult;
use crate::backend::domain::models::approval_settings::GiftApprovalSettings;
use crate::backend::domain::models::gift_order::{GiftOrder, OrderType};
use crate::backend::domain::parent_service::ParentService;
use crate::backend::domain::window_policy::{reward_year, ChristmasWindow};
use crate::backend::storage::csv::{CsvConnection, GiftOrderRepository};
use crate::backend::storage::GiftOrderStorage;
use chrono::{Datelike, NaiveDateTime};

#[derive(Clone)]
pub struct PolicyService {
    gift_order_repository: GiftOrderRepository,
    child_service: ChildService,
    parent_service: ParentService,
    clock: Arc<dyn Clock>,
}

impl PolicyService {
    pub fn new(
        csv_conn: Arc<CsvConnection>,
        child_service: ChildService,
        parent_service: ParentService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gift_order_repository = GiftOrderRepository::new((*csv_conn).clone());
        Self {
            gift_order_repository,
            child_service,
            parent_service,
            clock,
        }
    }

    /// Window bounds for `year` (default: the current year) and whether it is open now
    pub fn get_christmas_window(&self, year: Option<i32>) -> LedgerResult<ChristmasWindowView> {
        let now = self.clock.now();
        let window = ChristmasWindow::for_year(year.unwrap_or_else(|| now.year()))?;

        Ok(ChristmasWindowView {
            year: window.year,
            starts_at: window.starts_at,
            ends_at: window.ends_at,
            is_open: window.contains(now),
        })
    }

    pub async fn get_reward_gift_stats(&self, parent_id: &str, child_id: &str) -> LedgerResult<RewardGiftStats> {
        info!("Getting reward gift stats for child {}", child_id);

        self.child_service.get_owned_child(parent_id, child_id).await?;
        let settings = self.parent_service.get_approval_settings(parent_id).await?;
        self.reward_stats(child_id, &settings, self.clock.now()).await
    }

    /// Counted reward orders for the child in the reward year of `now`
    pub async fn reward_stats(
        &self,
        child_id: &str,
        settings: &GiftApprovalSettings,
        now: NaiveDateTime,
    ) -> LedgerResult<RewardGiftStats> {
        let year = reward_year(now);
        let orders = self.gift_order_repository.list_gift_orders_for_child(child_id).await?;

        Ok(RewardGiftStats {
            child_id: child_id.to_string(),
            year,
            used_reward_gifts: count_reward_gifts(&orders, year),
            max_reward_gifts_per_year: settings.max_reward_gifts_per_year,
            max_reward_price_cents: settings.max_reward_price_cents,
        })
    }
}

/// Reward orders that hold points and were created in `year`
pub fn count_reward_gifts(orders: &[GiftOrder], year: i32) -> u32 {
    let used = orders
        .iter()
        .filter(|o| o.order_type == OrderType::Reward)
        .filter(|o| o.status.holds_points())
        .filter(|o| o.created_at.year() == year)
        .count();
    u32::try_from(used).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::clock::FixedClock;
    use crate::backend::domain::models::gift_order::GiftOrderStatus;
    use crate::backend::storage::csv::test_utils::{sample_child, sample_order, TestEnvironment};
    use crate::backend::storage::csv::ChildRepository;
    use crate::backend::storage::ChildStorage;
    use chrono::{Duration, NaiveDate};

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn service(env: &TestEnvironment, clock: FixedClock) -> PolicyService {
        let conn = Arc::new(env.connection.clone());
        let clock: Arc<dyn Clock> = Arc::new(clock);
        let parent_service = ParentService::new(conn.clone(), clock.clone());
        let child_service = ChildService::new(conn.clone(), parent_service.clone(), clock.clone());
        PolicyService::new(conn, child_service, parent_service, clock)
    }

    #[tokio::test]
    async fn test_christmas_window_defaults_to_current_year() {
        let env = TestEnvironment::new().await.unwrap();
        let policy = service(&env, FixedClock::new(at(2026, 12, 20)));

        let current = policy.get_christmas_window(None).unwrap();
        assert_eq!(current.year, 2026);
        assert!(current.is_open);

        let past = policy.get_christmas_window(Some(2024)).unwrap();
        assert_eq!(past.ends_at.to_string(), "2024-12-25 23:59:59");
        assert!(!past.is_open);
    }

    #[tokio::test]
    async fn test_reward_stats_count_only_held_orders_this_year() {
        let env = TestEnvironment::new().await.unwrap();
        let policy = service(&env, FixedClock::new(at(2025, 12, 1)));
        let child = sample_child("parent::1", "Ava", 10);
        ChildRepository::new(env.connection.clone()).store_child(&child).await.unwrap();

        let repo = GiftOrderRepository::new(env.connection.clone());
        let statuses = [
            GiftOrderStatus::Approved,
            GiftOrderStatus::Delivered,
            GiftOrderStatus::PendingApproval,
            GiftOrderStatus::Cancelled,
        ];
        for status in statuses {
            let mut order = sample_order("parent::1", &child.id, OrderType::Reward);
            order.status = status;
            repo.store_gift_order(&order).await.unwrap();
        }
        let mut last_year = sample_order("parent::1", &child.id, OrderType::Reward);
        last_year.status = GiftOrderStatus::Delivered;
        last_year.created_at -= Duration::days(365);
        repo.store_gift_order(&last_year).await.unwrap();
        let mut christmas = sample_order("parent::1", &child.id, OrderType::Christmas);
        christmas.status = GiftOrderStatus::Approved;
        repo.store_gift_order(&christmas).await.unwrap();

        let stats = policy.get_reward_gift_stats("parent::1", &child.id).await.unwrap();
        assert_eq!(stats.year, 2025);
        assert_eq!(stats.used_reward_gifts, 2);
        assert_eq!(stats.remaining(), 2);
        assert!(!stats.limit_reached());
    }
}
