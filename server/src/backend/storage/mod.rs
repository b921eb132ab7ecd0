pub mod csv;
pub mod traits;

pub use traits::{ApprovalSettingsStorage, CatalogStorage, ChildStorage, GiftOrderStorage, ParentStorage};
