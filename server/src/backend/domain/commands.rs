//! Domain-level command and query types.
//!
//! Services inside the domain layer take and return these. The REST layer maps
//! the public DTOs from the `shared` crate to and from them.

pub mod gift_requests {
    use crate::backend::domain::models::child::GiftRequestRecord;
    use crate::backend::domain::models::gift_order::{GiftOrder, OrderType};

    /// Input for `request_gift`
    #[derive(Debug, Clone)]
    pub struct RequestGiftCommand {
        pub child_id: String,
        pub catalog_item_id: String,
        pub order_type: OrderType,
        pub behavior_reason: Option<String>,
        pub shipping_address: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct RequestGiftResult {
        pub gift_order: GiftOrder,
        /// Zero unless the order was auto-approved
        pub points_deducted: u32,
    }

    /// Input for early and friend gift requests
    #[derive(Debug, Clone)]
    pub struct SpecialGiftCommand {
        pub child_id: String,
        pub gift_id: String,
        /// Required for friend gifts, ignored for early gifts
        pub friend_name: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct SpecialGiftResult {
        pub gift_order: GiftOrder,
        pub request: GiftRequestRecord,
    }
}

pub mod approvals {
    use crate::backend::domain::models::gift_order::GiftOrder;

    #[derive(Debug, Clone)]
    pub struct ApproveGiftCommand {
        pub gift_order_id: String,
        pub approved: bool,
        pub note: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct ApprovalResult {
        pub gift_order: GiftOrder,
        /// The child's spendable points after the decision
        pub remaining_points: u32,
    }

    /// A pending order as the parent sees it
    #[derive(Debug, Clone)]
    pub struct PendingApprovalView {
        pub gift_order: GiftOrder,
        pub child_name: String,
        pub affordable: bool,
    }
}

pub mod policy {
    use chrono::NaiveDateTime;

    #[derive(Debug, Clone, PartialEq)]
    pub struct RewardGiftStats {
        pub child_id: String,
        pub year: i32,
        pub used_reward_gifts: u32,
        pub max_reward_gifts_per_year: u32,
        pub max_reward_price_cents: i64,
    }

    impl RewardGiftStats {
        pub fn remaining(&self) -> u32 {
            self.max_reward_gifts_per_year.saturating_sub(self.used_reward_gifts)
        }

        pub fn limit_reached(&self) -> bool {
            self.used_reward_gifts >= self.max_reward_gifts_per_year
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct ChristmasWindowView {
        pub year: i32,
        pub starts_at: NaiveDateTime,
        pub ends_at: NaiveDateTime,
        pub is_open: bool,
    }
}

pub mod fulfillment {
    #[derive(Debug, Clone, Default)]
    pub struct MarkOrderedCommand {
        pub gift_order_id: String,
        pub vendor_reference: Option<String>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct MarkShippedCommand {
        pub gift_order_id: String,
        pub tracking_number: Option<String>,
    }

    /// Cancel or fail an order; the reason is stored on the order
    #[derive(Debug, Clone, Default)]
    pub struct ReleaseOrderCommand {
        pub gift_order_id: String,
        pub reason: Option<String>,
    }
}

pub mod family {
    #[derive(Debug, Clone)]
    pub struct CreateParentCommand {
        pub name: String,
        pub email: String,
        pub shipping_address: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct CreateChildCommand {
        pub name: String,
        pub starting_score: u32,
    }

    #[derive(Debug, Clone)]
    pub struct AdjustScoreCommand {
        pub child_id: String,
        pub delta: i32,
        pub reason: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct SetScoreCommand {
        pub child_id: String,
        pub score: u32,
        pub reason: Option<String>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct YearlyResetResult {
        pub children_reset: usize,
        pub cancelled_orders: usize,
    }
}

pub mod catalog {
    #[derive(Debug, Clone)]
    pub struct CreateCatalogItemCommand {
        pub title: String,
        pub price_cents: i64,
        pub image_url: Option<String>,
        pub retailer: Option<String>,
    }
}

pub mod wallet {
    use crate::backend::domain::models::parent::WalletEntry;

    #[derive(Debug, Clone)]
    pub struct CheckoutStarted {
        pub entry: WalletEntry,
        pub checkout_url: String,
    }

    #[derive(Debug, Clone)]
    pub struct ReconcileResult {
        pub entry: WalletEntry,
        /// False when this delivery found the entry already settled
        pub applied: bool,
    }

    #[derive(Debug, Clone)]
    pub struct WalletSummary {
        pub parent_id: String,
        pub balance_cents: i64,
        pub entries: Vec<WalletEntry>,
    }
}
