//! Gift catalog: the items children can put on lists and request.

use std::sync::Arc;
use tracing::info;

use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::catalog::CreateCatalogItemCommand;
use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::catalog_item::CatalogItem;
use crate::backend::storage::csv::{CatalogRepository, CsvConnection};
use crate::backend::storage::CatalogStorage;

const MAX_TITLE_LENGTH: usize = 200;

#[derive(Clone)]
pub struct CatalogService {
    catalog_repository: CatalogRepository,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(csv_conn: Arc<CsvConnection>, clock: Arc<dyn Clock>) -> Self {
        let catalog_repository = CatalogRepository::new((*csv_conn).clone());
        Self { catalog_repository, clock }
    }

    pub async fn add_item(&self, command: CreateCatalogItemCommand) -> LedgerResult<CatalogItem> {
        info!("Adding catalog item: {:?}", command);

        let title = command.title.trim();
        if title.is_empty() {
            return Err(LedgerError::Validation("Gift title cannot be empty".to_string()));
        }
        if title.len() > MAX_TITLE_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Gift title cannot exceed {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        if command.price_cents <= 0 {
            return Err(LedgerError::Validation("Gift price must be positive".to_string()));
        }

        let item = CatalogItem {
            id: CatalogItem::generate_id(),
            title: title.to_string(),
            price_cents: command.price_cents,
            image_url: command.image_url.filter(|url| !url.trim().is_empty()),
            retailer: command.retailer.filter(|r| !r.trim().is_empty()),
            created_at: self.clock.now(),
        };
        self.catalog_repository.store_catalog_item(&item).await?;

        info!("Added catalog item {} costing {} points", item.id, item.cost_points());
        Ok(item)
    }

    pub async fn get_item(&self, item_id: &str) -> LedgerResult<CatalogItem> {
        self.catalog_repository
            .get_catalog_item(item_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Catalog item", item_id))
    }

    pub async fn list_items(&self) -> LedgerResult<Vec<CatalogItem>> {
        Ok(self.catalog_repository.list_catalog_items().await?)
    }
}
