//! # Storage Traits
//!
//! This module defines the document-store abstraction the domain layer works
//! against. One trait per collection: parents, children, gift orders, catalog
//! items and approval settings.

use anyhow::Result;
use async_trait::async_trait;

use crate::backend::domain::models::approval_settings::GiftApprovalSettings;
use crate::backend::domain::models::catalog_item::CatalogItem;
use crate::backend::domain::models::child::Child;
use crate::backend::domain::models::gift_order::{GiftOrder, GiftOrderStatus};
use crate::backend::domain::models::parent::Parent;

/// Parent documents, including their wallet ledger
#[async_trait]
pub trait ParentStorage: Send + Sync {
    /// Store a new parent
    async fn store_parent(&self, parent: &Parent) -> Result<()>;

    /// Retrieve a parent by ID
    async fn get_parent(&self, parent_id: &str) -> Result<Option<Parent>>;

    /// Replace an existing parent document
    async fn update_parent(&self, parent: &Parent) -> Result<()>;

    /// List every parent, ordered by creation time
    async fn list_parents(&self) -> Result<Vec<Parent>>;

    /// Find the parent whose wallet ledger holds the given checkout session
    async fn find_parent_by_checkout_session(&self, session_id: &str) -> Result<Option<Parent>>;
}

/// Child documents, including request lists and the neighbor ledger
#[async_trait]
pub trait ChildStorage: Send + Sync {
    async fn store_child(&self, child: &Child) -> Result<()>;

    async fn get_child(&self, child_id: &str) -> Result<Option<Child>>;

    async fn update_child(&self, child: &Child) -> Result<()>;

    /// Children belonging to a parent, ordered by name
    async fn list_children_for_parent(&self, parent_id: &str) -> Result<Vec<Child>>;
}

/// Gift order collection
#[async_trait]
pub trait GiftOrderStorage: Send + Sync {
    async fn store_gift_order(&self, order: &GiftOrder) -> Result<()>;

    async fn get_gift_order(&self, order_id: &str) -> Result<Option<GiftOrder>>;

    /// Orders for one child, most recent first
    async fn list_gift_orders_for_child(&self, child_id: &str) -> Result<Vec<GiftOrder>>;

    /// Orders for all of a parent's children, optionally filtered by status, most recent first
    async fn list_gift_orders_for_parent(
        &self,
        parent_id: &str,
        status: Option<GiftOrderStatus>,
    ) -> Result<Vec<GiftOrder>>;

    /// Replace the stored order only if its stored status is still `expected`.
    /// Returns false (and writes nothing) when the status has moved on.
    async fn compare_and_set_gift_order(&self, order: &GiftOrder, expected: GiftOrderStatus) -> Result<bool>;
}

/// Gift catalog
#[async_trait]
pub trait CatalogStorage: Send + Sync {
    async fn store_catalog_item(&self, item: &CatalogItem) -> Result<()>;

    async fn get_catalog_item(&self, item_id: &str) -> Result<Option<CatalogItem>>;

    /// All items ordered by title
    async fn list_catalog_items(&self) -> Result<Vec<CatalogItem>>;
}

/// Per-parent approval policy
#[async_trait]
pub trait ApprovalSettingsStorage: Send + Sync {
    /// Stored settings, or `None` if the parent never changed the defaults
    async fn get_approval_settings(&self, parent_id: &str) -> Result<Option<GiftApprovalSettings>>;

    async fn store_approval_settings(&self, parent_id: &str, settings: &GiftApprovalSettings) -> Result<()>;
}
