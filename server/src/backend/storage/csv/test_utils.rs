//! Test utilities: an isolated data directory per test plus sample documents.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::connection::CsvConnection;
use crate::backend::domain::models::catalog_item::CatalogItem;
use crate::backend::domain::models::child::Child;
use crate::backend::domain::models::gift_order::{GiftOrder, OrderType};
use crate::backend::domain::models::parent::Parent;

/// Test environment whose data directory is removed when it goes out of scope,
/// even if the test panics.
pub struct TestEnvironment {
    _temp_dir: TempDir,
    pub connection: CsvConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_path
    }
}

/// Noon on Dec 1 2025, before the Christmas window opens
pub fn sample_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 12, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

pub fn sample_parent(name: &str) -> Parent {
    Parent {
        id: Parent::generate_id(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        shipping_address: None,
        lists_finalized: false,
        child_ids: Vec::new(),
        wallet_ledger: Vec::new(),
        created_at: sample_time(),
        updated_at: sample_time(),
    }
}

pub fn sample_child(parent_id: &str, name: &str, score: u32) -> Child {
    Child::new(parent_id, name, score, sample_time())
}

pub fn sample_catalog_item(title: &str, price_cents: i64) -> CatalogItem {
    CatalogItem {
        id: CatalogItem::generate_id(),
        title: title.to_string(),
        price_cents,
        image_url: None,
        retailer: None,
        created_at: sample_time(),
    }
}

pub fn sample_order(parent_id: &str, child_id: &str, order_type: OrderType) -> GiftOrder {
    GiftOrder::new_pending(
        parent_id,
        child_id,
        &sample_catalog_item("Kite", 650),
        order_type,
        sample_time(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_environment_directory_removed_on_drop() {
        let path = {
            let env = TestEnvironment::new().await.unwrap();
            assert!(env.base_directory().exists());
            env.base_path.clone()
        };
        assert!(!path.exists());
    }
}
