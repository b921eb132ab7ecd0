//! # Adapters
//!
//! Interfaces to services the ledger does not own: the payment gateway that
//! hosts checkout pages and the channel that tells families about gift
//! decisions. Each interface ships with a local implementation used in
//! development and tests.

pub mod notifier;
pub mod payment_gateway;

pub use notifier::{LoggingNotifier, Notification, Notifier};
pub use payment_gateway::{CheckoutRequest, CheckoutSession, LocalPaymentGateway, PaymentGateway};
