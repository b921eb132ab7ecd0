//! Domain models. These are the shapes persisted by the storage layer and
//! mapped to `shared` DTOs by the REST layer.

pub mod approval_settings;
pub mod catalog_item;
pub mod child;
pub mod gift_order;
pub mod parent;
