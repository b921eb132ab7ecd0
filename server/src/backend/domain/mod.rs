//! # Domain Module
//!
//! Business rules of the gift ledger: who may ask for which gift and when,
//! how a gift's cost is split between behavior points and the neighbor
//! balance, and how gift orders move from request to delivery.
//!
//! ## Module Organization
//!
//! - **models**: Children, parents, gift orders, catalog items, approval policy
//! - **points** / **window_policy**: Pure arithmetic and calendar rules
//! - **points_ledger**: Locked status changes that move points
//! - **\*_service**: One service per workflow, called by the REST layer
//!
//! Services work against the storage traits and read the time from a `Clock`.

pub mod approval_service;
pub mod catalog_service;
pub mod child_service;
pub mod clock;
pub mod commands;
pub mod errors;
pub mod fulfillment_service;
pub mod gift_request_service;
pub mod models;
pub mod parent_service;
pub mod points;
pub mod points_ledger;
pub mod policy_service;
pub mod wallet_service;
pub mod window_policy;
pub mod yearly_reset_service;

pub use approval_service::ApprovalService;
pub use catalog_service::CatalogService;
pub use child_service::ChildService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{LedgerError, LedgerResult};
pub use fulfillment_service::FulfillmentService;
pub use gift_request_service::GiftRequestService;
pub use parent_service::ParentService;
pub use points_ledger::PointsLedger;
pub use policy_service::PolicyService;
pub use wallet_service::WalletService;
pub use yearly_reset_service::YearlyResetService;
