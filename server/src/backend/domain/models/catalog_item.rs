//! Domain model for a gift in the catalog.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::domain::points::cost_in_points;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub retailer: Option<String>,
    pub created_at: NaiveDateTime,
}

impl CatalogItem {
    pub fn generate_id() -> String {
        format!("catalog::{}", Uuid::new_v4())
    }

    pub fn cost_points(&self) -> u32 {
        cost_in_points(self.price_cents)
    }
}
