//! # Catalog Repository
//!
//! Catalog items are stored in `catalog.csv`, one row per item.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::connection::CsvConnection;
use crate::backend::domain::models::catalog_item::CatalogItem;
use crate::backend::storage::traits::CatalogStorage;

const CATALOG_FILE_NAME: &str = "catalog.csv";

#[derive(Clone)]
pub struct CatalogRepository {
    connection: CsvConnection,
}

impl CatalogRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn catalog_file_path(&self) -> PathBuf {
        self.connection.collection_path(CATALOG_FILE_NAME)
    }
}

#[async_trait]
impl CatalogStorage for CatalogRepository {
    async fn store_catalog_item(&self, item: &CatalogItem) -> Result<()> {
        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;

        let mut items: Vec<CatalogItem> = self.connection.read_csv(&self.catalog_file_path())?;
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(anyhow::anyhow!("Catalog item already exists: {}", item.id));
        }
        items.push(item.clone());
        self.connection.write_csv(&self.catalog_file_path(), &items)?;

        info!("Stored catalog item {} ({})", item.title, item.id);
        Ok(())
    }

    async fn get_catalog_item(&self, item_id: &str) -> Result<Option<CatalogItem>> {
        let items: Vec<CatalogItem> = self.connection.read_csv(&self.catalog_file_path())?;
        Ok(items.into_iter().find(|item| item.id == item_id))
    }

    async fn list_catalog_items(&self) -> Result<Vec<CatalogItem>> {
        let mut items: Vec<CatalogItem> = self.connection.read_csv(&self.catalog_file_path())?;
        items.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::csv::test_utils::{sample_catalog_item, TestEnvironment};

    #[tokio::test]
    async fn test_catalog_items_listed_by_title() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = CatalogRepository::new(env.connection.clone());

        let mut kite = sample_catalog_item("kite", 650);
        kite.retailer = Some("Toy Barn".to_string());
        repo.store_catalog_item(&sample_catalog_item("Puzzle", 1_200)).await.unwrap();
        repo.store_catalog_item(&kite).await.unwrap();

        let titles: Vec<String> = repo
            .list_catalog_items()
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.title)
            .collect();
        assert_eq!(titles, vec!["kite".to_string(), "Puzzle".to_string()]);

        let loaded = repo.get_catalog_item(&kite.id).await.unwrap();
        assert_eq!(loaded, Some(kite));
        assert!(repo.get_catalog_item("catalog::missing").await.unwrap().is_none());
    }
}
