//! Domain model for a gift order and its status state machine.
//!
//! ```text
//! PENDING_APPROVAL ──approve──▶ APPROVED ──place──▶ ORDERED ──ship──▶ SHIPPED ──deliver──▶ DELIVERED
//!        │                          │
//!        ├──deny/cancel──▶ CANCELLED ◀──cancel──┤
//!        └──fail─────────▶ FAILED    ◀──fail────┘
//! ```
//!
//! `DELIVERED`, `CANCELLED` and `FAILED` are terminal.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::backend::domain::models::catalog_item::CatalogItem;
use crate::backend::domain::points::{cost_in_points, PointsDeduction, CENTS_PER_POINT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Christmas,
    Reward,
    SpecialOccasion,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Christmas => "CHRISTMAS",
            OrderType::Reward => "REWARD",
            OrderType::SpecialOccasion => "SPECIAL_OCCASION",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHRISTMAS" => Ok(OrderType::Christmas),
            "REWARD" => Ok(OrderType::Reward),
            "SPECIAL_OCCASION" => Ok(OrderType::SpecialOccasion),
            other => Err(anyhow::anyhow!("Unknown order type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GiftOrderStatus {
    PendingApproval,
    Approved,
    Ordered,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
}

/// Something that happens to a gift order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Approve,
    Deny,
    Cancel,
    Fail,
    PlaceOrder,
    Ship,
    Deliver,
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            OrderEvent::Approve => "approve",
            OrderEvent::Deny => "deny",
            OrderEvent::Cancel => "cancel",
            OrderEvent::Fail => "fail",
            OrderEvent::PlaceOrder => "place",
            OrderEvent::Ship => "ship",
            OrderEvent::Deliver => "deliver",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Cannot {event} a gift order that is {from}")]
pub struct InvalidTransition {
    pub from: GiftOrderStatus,
    pub event: OrderEvent,
}

impl GiftOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftOrderStatus::PendingApproval => "PENDING_APPROVAL",
            GiftOrderStatus::Approved => "APPROVED",
            GiftOrderStatus::Ordered => "ORDERED",
            GiftOrderStatus::Shipped => "SHIPPED",
            GiftOrderStatus::Delivered => "DELIVERED",
            GiftOrderStatus::Cancelled => "CANCELLED",
            GiftOrderStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GiftOrderStatus::Delivered | GiftOrderStatus::Cancelled | GiftOrderStatus::Failed
        )
    }

    /// Statuses in which the order's points have been taken from the child.
    /// These are also the statuses that count toward the yearly reward quota.
    pub fn holds_points(&self) -> bool {
        matches!(
            self,
            GiftOrderStatus::Approved
                | GiftOrderStatus::Ordered
                | GiftOrderStatus::Shipped
                | GiftOrderStatus::Delivered
        )
    }

    /// The status reached by applying `event`, if the lifecycle allows it.
    ///
    /// Every (status, event) pair is spelled out so a new status or event
    /// cannot be added without deciding its transitions here.
    pub fn next(self, event: OrderEvent) -> Result<GiftOrderStatus, InvalidTransition> {
        use GiftOrderStatus::*;
        use OrderEvent::*;

        let next = match self {
            PendingApproval => match event {
                Approve => Some(Approved),
                Deny | Cancel => Some(Cancelled),
                Fail => Some(Failed),
                PlaceOrder | Ship | Deliver => None,
            },
            Approved => match event {
                PlaceOrder => Some(Ordered),
                Cancel => Some(Cancelled),
                Fail => Some(Failed),
                Approve | Deny | Ship | Deliver => None,
            },
            Ordered => match event {
                Ship => Some(Shipped),
                Approve | Deny | Cancel | Fail | PlaceOrder | Deliver => None,
            },
            Shipped => match event {
                Deliver => Some(Delivered),
                Approve | Deny | Cancel | Fail | PlaceOrder | Ship => None,
            },
            Delivered | Cancelled | Failed => None,
        };

        next.ok_or(InvalidTransition { from: self, event })
    }
}

impl fmt::Display for GiftOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GiftOrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_APPROVAL" => Ok(GiftOrderStatus::PendingApproval),
            "APPROVED" => Ok(GiftOrderStatus::Approved),
            "ORDERED" => Ok(GiftOrderStatus::Ordered),
            "SHIPPED" => Ok(GiftOrderStatus::Shipped),
            "DELIVERED" => Ok(GiftOrderStatus::Delivered),
            "CANCELLED" => Ok(GiftOrderStatus::Cancelled),
            "FAILED" => Ok(GiftOrderStatus::Failed),
            other => Err(anyhow::anyhow!("Unknown gift order status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftOrder {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
    pub catalog_item_id: String,
    pub title: String,
    pub order_type: OrderType,
    pub status: GiftOrderStatus,
    pub price_cents: i64,
    pub cost_points: u32,
    pub points_from_score: u32,
    pub neighbor_cents_deducted: i64,
    pub behavior_reason: Option<String>,
    pub shipping_address: Option<String>,
    pub parent_note: Option<String>,
    pub vendor_reference: Option<String>,
    pub tracking_number: Option<String>,
    pub status_reason: Option<String>,
    pub auto_approved: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub approved_at: Option<NaiveDateTime>,
}

impl GiftOrder {
    pub fn generate_id() -> String {
        format!("gift_order::{}", Uuid::new_v4())
    }

    /// A fresh order awaiting a decision, priced from the catalog item
    pub fn new_pending(
        parent_id: &str,
        child_id: &str,
        item: &CatalogItem,
        order_type: OrderType,
        now: NaiveDateTime,
    ) -> Self {
        GiftOrder {
            id: Self::generate_id(),
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
            catalog_item_id: item.id.clone(),
            title: item.title.clone(),
            order_type,
            status: GiftOrderStatus::PendingApproval,
            price_cents: item.price_cents,
            cost_points: cost_in_points(item.price_cents),
            points_from_score: 0,
            neighbor_cents_deducted: 0,
            behavior_reason: None,
            shipping_address: None,
            parent_note: None,
            vendor_reference: None,
            tracking_number: None,
            status_reason: None,
            auto_approved: false,
            created_at: now,
            updated_at: now,
            approved_at: None,
        }
    }

    /// Move the order along its lifecycle
    pub fn apply(&mut self, event: OrderEvent, now: NaiveDateTime) -> Result<(), InvalidTransition> {
        self.status = self.status.next(event)?;
        self.updated_at = now;
        if event == OrderEvent::Approve {
            self.approved_at = Some(now);
        }
        Ok(())
    }

    pub fn record_deduction(&mut self, deduction: &PointsDeduction) {
        self.points_from_score = deduction.from_score;
        self.neighbor_cents_deducted = deduction.neighbor_cents;
    }

    /// Move the score part of an approved order's held points into neighbor
    /// cents. After a season reset the score belongs to the new season, so a
    /// later refund of this order must land in the neighbor balance.
    /// Returns false if there was nothing to move.
    pub fn carry_over_season(&mut self, now: NaiveDateTime) -> bool {
        if self.status != GiftOrderStatus::Approved || self.points_from_score == 0 {
            return false;
        }
        self.neighbor_cents_deducted += i64::from(self.points_from_score) * CENTS_PER_POINT;
        self.points_from_score = 0;
        self.updated_at = now;
        true
    }

    /// The points this order currently holds, if any
    pub fn held_deduction(&self) -> Option<PointsDeduction> {
        if !self.status.holds_points() {
            return None;
        }
        Some(PointsDeduction {
            points: self.cost_points,
            from_score: self.points_from_score,
            neighbor_cents: self.neighbor_cents_deducted,
        })
    }
}
