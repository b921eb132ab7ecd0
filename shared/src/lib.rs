use serde::{Deserialize, Serialize};

/// Kind of gift order; decides which eligibility rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Christmas list gift, only requestable inside the Christmas window
    Christmas,
    /// Gift earned through behavior, limited by the yearly reward quota
    Reward,
    /// Early or friend gift, always needs a parent decision
    SpecialOccasion,
}

/// Lifecycle status of a gift order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GiftOrderStatus {
    PendingApproval,
    Approved,
    Ordered,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
}

/// Status of an early or friend gift request record on a child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

/// Settlement status of a wallet ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

/// What a wallet ledger entry paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletEntryType {
    TopUp,
    GiftPurchase,
    Donation,
    WelcomePacket,
}

/// Outcome reported by the payment gateway webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// Gift order ID in format: "gift_order::<uuid>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftOrder {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
    pub catalog_item_id: String,
    /// Catalog title captured when the order was created
    pub title: String,
    pub order_type: OrderType,
    pub status: GiftOrderStatus,
    /// Catalog price in cents captured when the order was created
    pub price_cents: i64,
    /// Magic points this gift costs (price rounded up to whole dollars)
    pub cost_points: u32,
    /// Points taken from score365 when the order was approved
    pub points_from_score: u32,
    /// Neighbor balance cents taken when the order was approved
    pub neighbor_cents_deducted: i64,
    pub behavior_reason: Option<String>,
    pub shipping_address: Option<String>,
    pub parent_note: Option<String>,
    pub vendor_reference: Option<String>,
    pub tracking_number: Option<String>,
    pub status_reason: Option<String>,
    pub auto_approved: bool,
    pub created_at: String,
    pub updated_at: String,
    pub approved_at: Option<String>,
}

/// An early or friend gift request recorded on a child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftRequestRecord {
    pub gift_order_id: String,
    pub gift_id: String,
    /// Present only for friend gift requests
    pub friend_name: Option<String>,
    pub price_cents: i64,
    pub requested_points: u32,
    pub status: RequestStatus,
    pub requested_at: String,
    pub decided_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    /// Behavior points, always within 0..=365
    pub score365: u32,
    pub neighbor_balance_cents: i64,
    /// score365 plus whole points held in the neighbor balance
    pub available_points: u32,
    pub gift_list: Vec<String>,
    pub early_gift_requests: Vec<GiftRequestRecord>,
    pub friend_gift_requests: Vec<GiftRequestRecord>,
    pub welcome_packet_purchased: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    pub id: String,
    pub name: String,
    pub email: String,
    pub shipping_address: Option<String>,
    pub lists_finalized: bool,
    /// Folded from the succeeded wallet ledger entries on every read
    pub wallet_balance_cents: i64,
    pub child_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: String,
    pub entry_type: WalletEntryType,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub checkout_session_id: Option<String>,
    pub child_id: Option<String>,
    pub description: String,
    pub created_at: String,
    pub settled_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub retailer: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftApprovalSettings {
    pub max_reward_gifts_per_year: u32,
    pub max_reward_price_cents: i64,
    pub auto_approve_christmas: bool,
    pub auto_approve_rewards: bool,
    /// Reward gifts costing at most this many points are auto-approved
    pub auto_approve_max_points: u32,
}

// ---------------------------------------------------------------------------
// Gift requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestGiftRequest {
    pub catalog_item_id: String,
    pub order_type: OrderType,
    pub behavior_reason: Option<String>,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestGiftResponse {
    pub gift_order: GiftOrder,
    pub status: GiftOrderStatus,
    pub points_deducted: u32,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyGiftRequest {
    pub gift_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendGiftRequest {
    pub gift_id: String,
    pub friend_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftRequestResponse {
    pub gift_order: GiftOrder,
    pub request: GiftRequestRecord,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveGiftRequest {
    pub approved: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveGiftResponse {
    pub gift_order: GiftOrder,
    pub status: GiftOrderStatus,
    pub remaining_points: u32,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub gift_order: GiftOrder,
    pub child_name: String,
    /// Whether the child can currently afford the gift
    pub affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApprovalsResponse {
    pub pending: Vec<PendingApproval>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardGiftStats {
    pub child_id: String,
    pub year: i32,
    pub used_reward_gifts: u32,
    pub max_reward_gifts_per_year: u32,
    pub remaining_reward_gifts: u32,
    pub max_reward_price_cents: i64,
    pub limit_reached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChristmasWindowQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChristmasWindow {
    pub year: i32,
    pub starts_at: String,
    pub ends_at: String,
    pub is_open: bool,
}

// ---------------------------------------------------------------------------
// Fulfilment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkOrderedRequest {
    pub vendor_reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkShippedRequest {
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailOrderRequest {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftOrderResponse {
    pub gift_order: GiftOrder,
    pub success_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GiftOrderListQuery {
    pub status: Option<GiftOrderStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftOrderListResponse {
    pub gift_orders: Vec<GiftOrder>,
}

// ---------------------------------------------------------------------------
// Family management
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateParentRequest {
    pub name: String,
    pub email: String,
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentResponse {
    pub parent: Parent,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateShippingAddressRequest {
    pub shipping_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeListsRequest {
    pub finalized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    /// Starting behavior points, clamped to 0..=365
    pub starting_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustScoreRequest {
    /// Points to add (positive) or remove (negative)
    pub delta: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetScoreRequest {
    /// New behavior points, clamped to 0..=365
    pub score: u32,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftListRequest {
    pub catalog_item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalSettingsResponse {
    pub parent_id: String,
    pub settings: GiftApprovalSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyResetResponse {
    pub children_reset: usize,
    pub cancelled_orders: usize,
    pub success_message: String,
}

// ---------------------------------------------------------------------------
// Wallet and payments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUpRequest {
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRequest {
    pub child_id: String,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomePacketRequest {
    pub child_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub entry: WalletEntry,
    pub checkout_url: String,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentWebhookRequest {
    pub session_id: String,
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentWebhookResponse {
    pub entry: WalletEntry,
    /// False when the entry had already been settled by an earlier delivery
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletResponse {
    pub parent_id: String,
    pub balance_cents: i64,
    pub entries: Vec<WalletEntry>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCatalogItemRequest {
    pub title: String,
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub retailer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemResponse {
    pub item: CatalogItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogListResponse {
    pub items: Vec<CatalogItem>,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable kind, e.g. "INSUFFICIENT_POINTS"
    pub code: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&GiftOrderStatus::PendingApproval).unwrap();
        assert_eq!(json, "\"PENDING_APPROVAL\"");

        let parsed: OrderType = serde_json::from_str("\"SPECIAL_OCCASION\"").unwrap();
        assert_eq!(parsed, OrderType::SpecialOccasion);

        let json = serde_json::to_string(&RequestStatus::Denied).unwrap();
        assert_eq!(json, "\"denied\"");
    }

    #[test]
    fn test_request_gift_request_optional_fields() {
        let body = r#"{"catalog_item_id":"catalog::1","order_type":"REWARD","behavior_reason":null,"shipping_address":null}"#;
        let request: RequestGiftRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.order_type, OrderType::Reward);
        assert!(request.behavior_reason.is_none());
    }
}
