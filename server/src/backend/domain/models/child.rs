//! Domain model representing a child, their magic points and gift requests.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::domain::points::{self, PointsDeduction, CENTS_PER_POINT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

/// Which request list a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Early,
    Friend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftRequestRecord {
    pub gift_order_id: String,
    pub gift_id: String,
    pub friend_name: Option<String>,
    pub price_cents: i64,
    pub requested_points: u32,
    pub status: RequestStatus,
    pub requested_at: NaiveDateTime,
    pub decided_at: Option<NaiveDateTime>,
}

impl GiftRequestRecord {
    /// Settle a pending request. Returns false if it was already decided.
    pub fn decide(&mut self, approved: bool, now: NaiveDateTime) -> bool {
        if self.status != RequestStatus::Pending {
            return false;
        }
        self.status = if approved { RequestStatus::Approved } else { RequestStatus::Denied };
        self.decided_at = Some(now);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeighborEntryKind {
    DonationCredit,
    GiftDeduction,
    GiftRefund,
    ScoreOverflow,
}

/// Audit record for every change to the neighbor balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborLedgerEntry {
    pub kind: NeighborEntryKind,
    pub amount_cents: i64,
    pub balance_after_cents: i64,
    /// Gift order or wallet entry that caused the change
    pub reference: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub score365: u32,
    pub neighbor_balance_cents: i64,
    #[serde(default)]
    pub gift_list: Vec<String>,
    #[serde(default)]
    pub early_gift_requests: Vec<GiftRequestRecord>,
    #[serde(default)]
    pub friend_gift_requests: Vec<GiftRequestRecord>,
    #[serde(default)]
    pub neighbor_ledger: Vec<NeighborLedgerEntry>,
    #[serde(default)]
    pub welcome_packet_purchased: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Child {
    pub fn generate_id() -> String {
        format!("child::{}", Uuid::new_v4())
    }

    pub fn new(parent_id: &str, name: &str, starting_score: u32, now: NaiveDateTime) -> Self {
        Child {
            id: Self::generate_id(),
            parent_id: parent_id.to_string(),
            name: name.trim().to_string(),
            score365: points::clamp_score(i64::from(starting_score)),
            neighbor_balance_cents: 0,
            gift_list: Vec::new(),
            early_gift_requests: Vec::new(),
            friend_gift_requests: Vec::new(),
            neighbor_ledger: Vec::new(),
            welcome_packet_purchased: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn available_points(&self) -> u32 {
        points::available_points(self.score365, self.neighbor_balance_cents)
    }

    /// Add or remove behavior points, keeping the score within 0..=365
    pub fn adjust_score(&mut self, delta: i32, now: NaiveDateTime) -> u32 {
        self.score365 = points::clamp_score(i64::from(self.score365) + i64::from(delta));
        self.updated_at = now;
        self.score365
    }

    /// Overwrite the score, clamped to 0..=365
    pub fn set_score(&mut self, score: u32, now: NaiveDateTime) -> u32 {
        self.score365 = points::clamp_score(i64::from(score));
        self.updated_at = now;
        self.score365
    }

    /// Take the points for an approved gift
    pub fn apply_deduction(&mut self, deduction: &PointsDeduction, reference: &str, now: NaiveDateTime) {
        self.score365 = self.score365.saturating_sub(deduction.from_score);
        if deduction.neighbor_cents > 0 {
            self.record_neighbor_change(
                NeighborEntryKind::GiftDeduction,
                -deduction.neighbor_cents,
                reference,
                now,
            );
        }
        self.updated_at = now;
    }

    /// Give back the points an approved gift held
    pub fn apply_refund(&mut self, deduction: &PointsDeduction, reference: &str, now: NaiveDateTime) {
        let refund = points::plan_refund(self.score365, deduction);
        self.score365 += refund.to_score;

        if deduction.neighbor_cents > 0 {
            self.record_neighbor_change(NeighborEntryKind::GiftRefund, deduction.neighbor_cents, reference, now);
        }
        let overflow_cents = refund.to_neighbor_cents - deduction.neighbor_cents;
        if overflow_cents > 0 {
            self.record_neighbor_change(NeighborEntryKind::ScoreOverflow, overflow_cents, reference, now);
        }
        self.updated_at = now;
    }

    /// Credit a settled donation to the neighbor balance
    pub fn credit_donation(&mut self, amount_cents: i64, reference: &str, now: NaiveDateTime) {
        self.record_neighbor_change(NeighborEntryKind::DonationCredit, amount_cents, reference, now);
        self.updated_at = now;
    }

    fn record_neighbor_change(
        &mut self,
        kind: NeighborEntryKind,
        amount_cents: i64,
        reference: &str,
        now: NaiveDateTime,
    ) {
        self.neighbor_balance_cents += amount_cents;
        self.neighbor_ledger.push(NeighborLedgerEntry {
            kind,
            amount_cents,
            balance_after_cents: self.neighbor_balance_cents,
            reference: reference.to_string(),
            created_at: now,
        });
    }

    /// The neighbor balance recomputed from its audit log
    pub fn neighbor_ledger_total_cents(&self) -> i64 {
        self.neighbor_ledger.iter().map(|entry| entry.amount_cents).sum()
    }

    pub fn requests(&self, kind: RequestKind) -> &[GiftRequestRecord] {
        match kind {
            RequestKind::Early => &self.early_gift_requests,
            RequestKind::Friend => &self.friend_gift_requests,
        }
    }

    pub fn push_request(&mut self, kind: RequestKind, record: GiftRequestRecord, now: NaiveDateTime) {
        match kind {
            RequestKind::Early => self.early_gift_requests.push(record),
            RequestKind::Friend => self.friend_gift_requests.push(record),
        }
        self.updated_at = now;
    }

    pub fn has_pending_request(&self, kind: RequestKind, gift_id: &str) -> bool {
        self.requests(kind)
            .iter()
            .any(|r| r.gift_id == gift_id && r.status == RequestStatus::Pending)
    }

    /// The early or friend request backed by `gift_order_id`, if any
    pub fn request_for_order_mut(&mut self, gift_order_id: &str) -> Option<&mut GiftRequestRecord> {
        self.early_gift_requests
            .iter_mut()
            .chain(self.friend_gift_requests.iter_mut())
            .find(|r| r.gift_order_id == gift_order_id)
    }

    pub fn has_gift_on_list(&self, catalog_item_id: &str) -> bool {
        self.gift_list.iter().any(|id| id == catalog_item_id)
    }

    /// Clear the season's lists and score. Balances and settings survive.
    pub fn reset_for_new_season(&mut self, now: NaiveDateTime) {
        self.gift_list.clear();
        self.early_gift_requests.clear();
        self.friend_gift_requests.clear();
        self.score365 = 0;
        self.updated_at = now;
    }
}

/// Neighbor cents needed to cover `points` whole points
pub fn points_to_cents(points: u32) -> i64 {
    i64::from(points) * CENTS_PER_POINT
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 12, 12).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn child_with(score: u32, neighbor_cents: i64) -> Child {
        let mut child = Child::new("parent::1", "Ava", score, now());
        if neighbor_cents > 0 {
            child.credit_donation(neighbor_cents, "wallet::seed", now());
        }
        child
    }

    #[test]
    fn test_new_child_clamps_starting_score() {
        let child = Child::new("parent::1", "  Ava ", 500, now());
        assert_eq!(child.score365, 365);
        assert_eq!(child.name, "Ava");
    }

    #[test]
    fn test_adjust_score_stays_in_range() {
        let mut child = child_with(10, 0);
        assert_eq!(child.adjust_score(-25, now()), 0);
        assert_eq!(child.adjust_score(400, now()), 365);
    }

    #[test]
    fn test_deduction_and_refund_restore_balances() {
        let mut child = child_with(5, 300);
        let deduction = points::plan_deduction(child.score365, child.neighbor_balance_cents, 6).unwrap();

        child.apply_deduction(&deduction, "gift_order::1", now());
        assert_eq!(child.score365, 0);
        assert_eq!(child.neighbor_balance_cents, 200);
        assert_eq!(child.available_points(), 2);

        child.apply_refund(&deduction, "gift_order::1", now());
        assert_eq!(child.score365, 5);
        assert_eq!(child.neighbor_balance_cents, 300);
        assert_eq!(child.neighbor_ledger_total_cents(), child.neighbor_balance_cents);
    }

    #[test]
    fn test_refund_over_cap_spills_into_neighbor_balance() {
        let mut child = child_with(20, 0);
        let deduction = points::plan_deduction(20, 0, 15).unwrap();
        child.apply_deduction(&deduction, "gift_order::1", now());
        child.adjust_score(360, now());
        assert_eq!(child.score365, 365);

        child.apply_refund(&deduction, "gift_order::1", now());
        assert_eq!(child.score365, 365);
        assert_eq!(child.neighbor_balance_cents, points_to_cents(15));
        assert_eq!(
            child.neighbor_ledger.last().map(|e| e.kind),
            Some(NeighborEntryKind::ScoreOverflow)
        );
    }

    #[test]
    fn test_request_decided_once() {
        let mut record = GiftRequestRecord {
            gift_order_id: "gift_order::1".to_string(),
            gift_id: "catalog::1".to_string(),
            friend_name: None,
            price_cents: 500,
            requested_points: 5,
            status: RequestStatus::Pending,
            requested_at: now(),
            decided_at: None,
        };
        assert!(record.decide(true, now()));
        assert!(!record.decide(false, now()));
        assert_eq!(record.status, RequestStatus::Approved);
    }

    #[test]
    fn test_reset_keeps_neighbor_balance() {
        let mut child = child_with(120, 450);
        child.gift_list.push("catalog::1".to_string());
        child.reset_for_new_season(now());

        assert_eq!(child.score365, 0);
        assert!(child.gift_list.is_empty());
        assert_eq!(child.neighbor_balance_cents, 450);
    }
}
