//! # Gift Order Repository
//!
//! All gift orders live in a single `gift_orders.csv` collection. Every
//! read-modify-write cycle holds the connection's write lock, which is what
//! makes `compare_and_set_gift_order` atomic.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use super::connection::CsvConnection;
use crate::backend::domain::models::gift_order::{GiftOrder, GiftOrderStatus};
use crate::backend::storage::traits::GiftOrderStorage;

const GIFT_ORDERS_FILE_NAME: &str = "gift_orders.csv";

/// CSV record structure for gift orders
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GiftOrderRecord {
    id: String,
    parent_id: String,
    child_id: String,
    catalog_item_id: String,
    title: String,
    order_type: String,
    status: String,
    price_cents: i64,
    cost_points: u32,
    points_from_score: u32,
    neighbor_cents_deducted: i64,
    behavior_reason: Option<String>,
    shipping_address: Option<String>,
    parent_note: Option<String>,
    vendor_reference: Option<String>,
    tracking_number: Option<String>,
    status_reason: Option<String>,
    auto_approved: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    approved_at: Option<NaiveDateTime>,
}

impl From<&GiftOrder> for GiftOrderRecord {
    fn from(order: &GiftOrder) -> Self {
        GiftOrderRecord {
            id: order.id.clone(),
            parent_id: order.parent_id.clone(),
            child_id: order.child_id.clone(),
            catalog_item_id: order.catalog_item_id.clone(),
            title: order.title.clone(),
            order_type: order.order_type.as_str().to_string(),
            status: order.status.as_str().to_string(),
            price_cents: order.price_cents,
            cost_points: order.cost_points,
            points_from_score: order.points_from_score,
            neighbor_cents_deducted: order.neighbor_cents_deducted,
            behavior_reason: order.behavior_reason.clone(),
            shipping_address: order.shipping_address.clone(),
            parent_note: order.parent_note.clone(),
            vendor_reference: order.vendor_reference.clone(),
            tracking_number: order.tracking_number.clone(),
            status_reason: order.status_reason.clone(),
            auto_approved: order.auto_approved,
            created_at: order.created_at,
            updated_at: order.updated_at,
            approved_at: order.approved_at,
        }
    }
}

impl TryFrom<GiftOrderRecord> for GiftOrder {
    type Error = anyhow::Error;

    fn try_from(record: GiftOrderRecord) -> Result<Self> {
        Ok(GiftOrder {
            order_type: record.order_type.parse()?,
            status: record.status.parse()?,
            id: record.id,
            parent_id: record.parent_id,
            child_id: record.child_id,
            catalog_item_id: record.catalog_item_id,
            title: record.title,
            price_cents: record.price_cents,
            cost_points: record.cost_points,
            points_from_score: record.points_from_score,
            neighbor_cents_deducted: record.neighbor_cents_deducted,
            behavior_reason: record.behavior_reason,
            shipping_address: record.shipping_address,
            parent_note: record.parent_note,
            vendor_reference: record.vendor_reference,
            tracking_number: record.tracking_number,
            status_reason: record.status_reason,
            auto_approved: record.auto_approved,
            created_at: record.created_at,
            updated_at: record.updated_at,
            approved_at: record.approved_at,
        })
    }
}

#[derive(Clone)]
pub struct GiftOrderRepository {
    connection: CsvConnection,
}

impl GiftOrderRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn orders_file_path(&self) -> PathBuf {
        self.connection.collection_path(GIFT_ORDERS_FILE_NAME)
    }

    fn read_all(&self) -> Result<Vec<GiftOrder>> {
        let records: Vec<GiftOrderRecord> = self.connection.read_csv(&self.orders_file_path())?;
        records.into_iter().map(GiftOrder::try_from).collect()
    }

    fn write_all(&self, orders: &[GiftOrder]) -> Result<()> {
        let records: Vec<GiftOrderRecord> = orders.iter().map(GiftOrderRecord::from).collect();
        self.connection.write_csv(&self.orders_file_path(), &records)
    }

    fn most_recent_first(mut orders: Vec<GiftOrder>) -> Vec<GiftOrder> {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}

#[async_trait]
impl GiftOrderStorage for GiftOrderRepository {
    async fn store_gift_order(&self, order: &GiftOrder) -> Result<()> {
        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;

        let mut orders = self.read_all()?;
        if orders.iter().any(|existing| existing.id == order.id) {
            return Err(anyhow::anyhow!("Gift order already exists: {}", order.id));
        }
        orders.push(order.clone());
        self.write_all(&orders)?;

        info!("Stored gift order {} ({})", order.id, order.status);
        Ok(())
    }

    async fn get_gift_order(&self, order_id: &str) -> Result<Option<GiftOrder>> {
        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;

        Ok(self.read_all()?.into_iter().find(|order| order.id == order_id))
    }

    async fn list_gift_orders_for_child(&self, child_id: &str) -> Result<Vec<GiftOrder>> {
        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;

        let orders = self.read_all()?.into_iter().filter(|o| o.child_id == child_id).collect();
        Ok(Self::most_recent_first(orders))
    }

    async fn list_gift_orders_for_parent(
        &self,
        parent_id: &str,
        status: Option<GiftOrderStatus>,
    ) -> Result<Vec<GiftOrder>> {
        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;

        let orders = self
            .read_all()?
            .into_iter()
            .filter(|o| o.parent_id == parent_id)
            .filter(|o| status.map_or(true, |s| o.status == s))
            .collect();
        Ok(Self::most_recent_first(orders))
    }

    async fn compare_and_set_gift_order(&self, order: &GiftOrder, expected: GiftOrderStatus) -> Result<bool> {
        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;

        let mut orders = self.read_all()?;
        let Some(stored) = orders.iter_mut().find(|o| o.id == order.id) else {
            return Err(anyhow::anyhow!("Gift order not found: {}", order.id));
        };

        if stored.status != expected {
            debug!(
                "Gift order {} is {} (expected {}), not updating",
                order.id, stored.status, expected
            );
            return Ok(false);
        }

        *stored = order.clone();
        self.write_all(&orders)?;

        debug!("Gift order {} moved {} -> {}", order.id, expected, order.status);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::gift_order::OrderType;
    use crate::backend::storage::csv::test_utils::{sample_catalog_item, sample_order, TestEnvironment};
    use chrono::Duration;

    #[tokio::test]
    async fn test_store_and_reload_preserves_every_field() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = GiftOrderRepository::new(env.connection.clone());

        let mut order = sample_order("parent::1", "child::1", OrderType::Reward);
        order.behavior_reason = Some("Cleaned room, twice".to_string());
        order.parent_note = Some("Proud of you".to_string());
        order.approved_at = Some(order.created_at);
        repo.store_gift_order(&order).await.unwrap();

        let loaded = repo.get_gift_order(&order.id).await.unwrap().expect("order exists");
        assert_eq!(loaded, order);
        assert!(repo.store_gift_order(&order).await.is_err());
    }

    #[tokio::test]
    async fn test_compare_and_set_only_moves_expected_status() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = GiftOrderRepository::new(env.connection.clone());

        let order = sample_order("parent::1", "child::1", OrderType::Christmas);
        repo.store_gift_order(&order).await.unwrap();

        let mut approved = order.clone();
        approved.status = GiftOrderStatus::Approved;
        assert!(repo
            .compare_and_set_gift_order(&approved, GiftOrderStatus::PendingApproval)
            .await
            .unwrap());

        let mut denied = order.clone();
        denied.status = GiftOrderStatus::Cancelled;
        assert!(!repo
            .compare_and_set_gift_order(&denied, GiftOrderStatus::PendingApproval)
            .await
            .unwrap());

        let stored = repo.get_gift_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GiftOrderStatus::Approved);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_most_recent_first() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = GiftOrderRepository::new(env.connection.clone());

        let older = sample_order("parent::1", "child::1", OrderType::Reward);
        let mut newer = GiftOrder::new_pending(
            "parent::1",
            "child::2",
            &sample_catalog_item("Puzzle", 1_200),
            OrderType::Christmas,
            older.created_at + Duration::hours(1),
        );
        newer.status = GiftOrderStatus::Approved;
        let other_family = sample_order("parent::2", "child::9", OrderType::Reward);

        for order in [&older, &newer, &other_family] {
            repo.store_gift_order(order).await.unwrap();
        }

        let all: Vec<String> = repo
            .list_gift_orders_for_parent("parent::1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(all, vec![newer.id.clone(), older.id.clone()]);

        let pending = repo
            .list_gift_orders_for_parent("parent::1", Some(GiftOrderStatus::PendingApproval))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, older.id);

        assert_eq!(repo.list_gift_orders_for_child("child::2").await.unwrap().len(), 1);
    }
}
