//! Family notifications.
//!
//! Delivery is best effort: services log a failed notification and carry on,
//! the gift workflow never fails because a message could not be sent.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A child asked for a gift that needs the parent's decision
    ApprovalNeeded {
        parent_id: String,
        child_name: String,
        gift_order_id: String,
        title: String,
        cost_points: u32,
    },
    /// A parent (or the auto-approval policy) decided on a gift
    DecisionMade {
        parent_id: String,
        child_id: String,
        gift_order_id: String,
        title: String,
        approved: bool,
    },
    /// A gift moved along fulfilment
    OrderStatusChanged {
        parent_id: String,
        gift_order_id: String,
        title: String,
        status: String,
    },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<()>;
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        match notification {
            Notification::ApprovalNeeded { parent_id, child_name, gift_order_id, title, cost_points } => {
                info!(
                    parent_id = %parent_id,
                    gift_order_id = %gift_order_id,
                    "{} asked for '{}' ({} points), waiting for approval",
                    child_name, title, cost_points
                );
            }
            Notification::DecisionMade { parent_id, child_id, gift_order_id, title, approved } => {
                info!(
                    parent_id = %parent_id,
                    child_id = %child_id,
                    gift_order_id = %gift_order_id,
                    "'{}' was {}",
                    title,
                    if approved { "approved" } else { "denied" }
                );
            }
            Notification::OrderStatusChanged { parent_id, gift_order_id, title, status } => {
                info!(
                    parent_id = %parent_id,
                    gift_order_id = %gift_order_id,
                    "'{}' is now {}",
                    title, status
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Collects notifications so tests can assert on them
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        pub sent: Arc<Mutex<Vec<Notification>>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) -> Result<()> {
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }
}
