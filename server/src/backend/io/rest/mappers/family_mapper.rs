use shared::{Child, GiftApprovalSettings, Parent, PaymentStatus, WalletEntry, WalletEntryType};

use super::gift_order_mapper::GiftOrderMapper;
use super::{format_optional_timestamp, format_timestamp};
use crate::backend::domain::models::approval_settings::GiftApprovalSettings as DomainSettings;
use crate::backend::domain::models::child::Child as DomainChild;
use crate::backend::domain::models::parent::{
    Parent as DomainParent, PaymentStatus as DomainPaymentStatus, WalletEntry as DomainWalletEntry,
    WalletEntryType as DomainWalletEntryType,
};

pub struct FamilyMapper;

impl FamilyMapper {
    pub fn parent_to_dto(domain: DomainParent) -> Parent {
        let wallet_balance_cents = domain.wallet_balance_cents();
        Parent {
            id: domain.id,
            name: domain.name,
            email: domain.email,
            shipping_address: domain.shipping_address,
            lists_finalized: domain.lists_finalized,
            wallet_balance_cents,
            child_ids: domain.child_ids,
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
        }
    }

    pub fn child_to_dto(domain: DomainChild) -> Child {
        let available_points = domain.available_points();
        Child {
            id: domain.id,
            parent_id: domain.parent_id,
            name: domain.name,
            score365: domain.score365,
            neighbor_balance_cents: domain.neighbor_balance_cents,
            available_points,
            gift_list: domain.gift_list,
            early_gift_requests: domain
                .early_gift_requests
                .into_iter()
                .map(GiftOrderMapper::request_record_to_dto)
                .collect(),
            friend_gift_requests: domain
                .friend_gift_requests
                .into_iter()
                .map(GiftOrderMapper::request_record_to_dto)
                .collect(),
            welcome_packet_purchased: domain.welcome_packet_purchased,
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
        }
    }

    pub fn child_list_to_dto(children: Vec<DomainChild>) -> Vec<Child> {
        children.into_iter().map(Self::child_to_dto).collect()
    }

    pub fn settings_to_dto(domain: DomainSettings) -> GiftApprovalSettings {
        GiftApprovalSettings {
            max_reward_gifts_per_year: domain.max_reward_gifts_per_year,
            max_reward_price_cents: domain.max_reward_price_cents,
            auto_approve_christmas: domain.auto_approve_christmas,
            auto_approve_rewards: domain.auto_approve_rewards,
            auto_approve_max_points: domain.auto_approve_max_points,
        }
    }

    pub fn settings_to_domain(dto: GiftApprovalSettings) -> DomainSettings {
        DomainSettings {
            max_reward_gifts_per_year: dto.max_reward_gifts_per_year,
            max_reward_price_cents: dto.max_reward_price_cents,
            auto_approve_christmas: dto.auto_approve_christmas,
            auto_approve_rewards: dto.auto_approve_rewards,
            auto_approve_max_points: dto.auto_approve_max_points,
        }
    }

    pub fn wallet_entry_to_dto(domain: DomainWalletEntry) -> WalletEntry {
        WalletEntry {
            id: domain.id,
            entry_type: match domain.entry_type {
                DomainWalletEntryType::TopUp => WalletEntryType::TopUp,
                DomainWalletEntryType::GiftPurchase => WalletEntryType::GiftPurchase,
                DomainWalletEntryType::Donation => WalletEntryType::Donation,
                DomainWalletEntryType::WelcomePacket => WalletEntryType::WelcomePacket,
            },
            amount_cents: domain.amount_cents,
            status: match domain.status {
                DomainPaymentStatus::Pending => PaymentStatus::Pending,
                DomainPaymentStatus::Succeeded => PaymentStatus::Succeeded,
                DomainPaymentStatus::Failed => PaymentStatus::Failed,
            },
            checkout_session_id: domain.checkout_session_id,
            child_id: domain.child_id,
            description: domain.description,
            created_at: format_timestamp(domain.created_at),
            settled_at: format_optional_timestamp(domain.settled_at),
        }
    }

    pub fn wallet_entries_to_dto(entries: Vec<DomainWalletEntry>) -> Vec<WalletEntry> {
        entries.into_iter().map(Self::wallet_entry_to_dto).collect()
    }
}
