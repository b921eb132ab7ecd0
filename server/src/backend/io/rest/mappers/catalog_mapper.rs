use shared::CatalogItem;

use super::format_timestamp;
use crate::backend::domain::models::catalog_item::CatalogItem as DomainCatalogItem;

pub struct CatalogMapper;

impl CatalogMapper {
    pub fn to_dto(domain: DomainCatalogItem) -> CatalogItem {
        CatalogItem {
            id: domain.id,
            title: domain.title,
            price_cents: domain.price_cents,
            image_url: domain.image_url,
            retailer: domain.retailer,
            created_at: format_timestamp(domain.created_at),
        }
    }

    pub fn to_dto_list(items: Vec<DomainCatalogItem>) -> Vec<CatalogItem> {
        items.into_iter().map(Self::to_dto).collect()
    }
}
