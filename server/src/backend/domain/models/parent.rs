//! Domain model for a parent account and its wallet ledger.
//!
//! The wallet balance is never stored. It is folded from the ledger on every
//! read, and every mutation of the ledger happens behind the ledger lock.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEntryType {
    TopUp,
    GiftPurchase,
    Donation,
    WelcomePacket,
}

impl WalletEntryType {
    /// Signed effect of a settled entry on the wallet balance.
    /// Donations and welcome packets are paid by card and never touch it.
    pub fn balance_effect(&self, amount_cents: i64) -> i64 {
        match self {
            WalletEntryType::TopUp => amount_cents,
            WalletEntryType::GiftPurchase => -amount_cents,
            WalletEntryType::Donation | WalletEntryType::WelcomePacket => 0,
        }
    }
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
    pub created_at: NaiveDateTime,
    pub settled_at: Option<NaiveDateTime>,
}

impl WalletEntry {
    pub fn generate_id() -> String {
        format!("wallet::{}", Uuid::new_v4())
    }

    /// Settle a pending entry. Returns false if it was already settled.
    pub fn settle(&mut self, succeeded: bool, now: NaiveDateTime) -> bool {
        if self.status != PaymentStatus::Pending {
            return false;
        }
        self.status = if succeeded { PaymentStatus::Succeeded } else { PaymentStatus::Failed };
        self.settled_at = Some(now);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    pub id: String,
    pub name: String,
    pub email: String,
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub lists_finalized: bool,
    #[serde(default)]
    pub child_ids: Vec<String>,
    #[serde(default)]
    pub wallet_ledger: Vec<WalletEntry>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Parent {
    pub fn generate_id() -> String {
        format!("parent::{}", Uuid::new_v4())
    }

    pub fn owns_child(&self, child_id: &str) -> bool {
        self.child_ids.iter().any(|id| id == child_id)
    }

    pub fn wallet_balance_cents(&self) -> i64 {
        self.wallet_ledger
            .iter()
            .filter(|entry| entry.status == PaymentStatus::Succeeded)
            .map(|entry| entry.entry_type.balance_effect(entry.amount_cents))
            .sum()
    }

    pub fn entry_by_session_mut(&mut self, session_id: &str) -> Option<&mut WalletEntry> {
        self.wallet_ledger
            .iter_mut()
            .find(|entry| entry.checkout_session_id.as_deref() == Some(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 2).unwrap().and_hms_opt(8, 30, 0).unwrap()
    }

    fn entry(entry_type: WalletEntryType, amount_cents: i64, status: PaymentStatus) -> WalletEntry {
        WalletEntry {
            id: WalletEntry::generate_id(),
            entry_type,
            amount_cents,
            status,
            checkout_session_id: None,
            child_id: None,
            description: String::new(),
            created_at: now(),
            settled_at: None,
        }
    }

    #[test]
    fn test_balance_folds_only_succeeded_entries() {
        let parent = Parent {
            id: Parent::generate_id(),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            shipping_address: None,
            lists_finalized: false,
            child_ids: Vec::new(),
            wallet_ledger: vec![
                entry(WalletEntryType::TopUp, 5_000, PaymentStatus::Succeeded),
                entry(WalletEntryType::TopUp, 2_000, PaymentStatus::Pending),
                entry(WalletEntryType::TopUp, 1_000, PaymentStatus::Failed),
                entry(WalletEntryType::GiftPurchase, 1_250, PaymentStatus::Succeeded),
                entry(WalletEntryType::Donation, 900, PaymentStatus::Succeeded),
            ],
            created_at: now(),
            updated_at: now(),
        };

        assert_eq!(parent.wallet_balance_cents(), 3_750);
    }

    #[test]
    fn test_entry_settles_once() {
        let mut pending = entry(WalletEntryType::TopUp, 500, PaymentStatus::Pending);
        assert!(pending.settle(true, now()));
        assert!(!pending.settle(false, now()));
        assert_eq!(pending.status, PaymentStatus::Succeeded);
    }
}
