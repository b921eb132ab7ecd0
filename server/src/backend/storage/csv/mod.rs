pub mod approval_settings_repository;
pub mod catalog_repository;
pub mod child_repository;
pub mod connection;
pub mod gift_order_repository;
pub mod parent_repository;

#[cfg(test)]
pub mod test_utils;

pub use approval_settings_repository::ApprovalSettingsRepository;
pub use catalog_repository::CatalogRepository;
pub use child_repository::ChildRepository;
pub use connection::CsvConnection;
pub use gift_order_repository::GiftOrderRepository;
pub use parent_repository::ParentRepository;
