use shared::{GiftOrder, GiftOrderStatus, GiftRequestRecord, OrderType, RequestStatus};

use super::{format_optional_timestamp, format_timestamp};
use crate::backend::domain::models::child::{GiftRequestRecord as DomainGiftRequestRecord, RequestStatus as DomainRequestStatus};
use crate::backend::domain::models::gift_order::{
    GiftOrder as DomainGiftOrder, GiftOrderStatus as DomainGiftOrderStatus, OrderType as DomainOrderType,
};

pub struct GiftOrderMapper;

impl GiftOrderMapper {
    pub fn order_type_to_domain(dto: OrderType) -> DomainOrderType {
        match dto {
            OrderType::Christmas => DomainOrderType::Christmas,
            OrderType::Reward => DomainOrderType::Reward,
            OrderType::SpecialOccasion => DomainOrderType::SpecialOccasion,
        }
    }

    pub fn order_type_to_dto(domain: DomainOrderType) -> OrderType {
        match domain {
            DomainOrderType::Christmas => OrderType::Christmas,
            DomainOrderType::Reward => OrderType::Reward,
            DomainOrderType::SpecialOccasion => OrderType::SpecialOccasion,
        }
    }

    pub fn status_to_domain(dto: GiftOrderStatus) -> DomainGiftOrderStatus {
        match dto {
            GiftOrderStatus::PendingApproval => DomainGiftOrderStatus::PendingApproval,
            GiftOrderStatus::Approved => DomainGiftOrderStatus::Approved,
            GiftOrderStatus::Ordered => DomainGiftOrderStatus::Ordered,
            GiftOrderStatus::Shipped => DomainGiftOrderStatus::Shipped,
            GiftOrderStatus::Delivered => DomainGiftOrderStatus::Delivered,
            GiftOrderStatus::Cancelled => DomainGiftOrderStatus::Cancelled,
            GiftOrderStatus::Failed => DomainGiftOrderStatus::Failed,
        }
    }

    pub fn status_to_dto(domain: DomainGiftOrderStatus) -> GiftOrderStatus {
        match domain {
            DomainGiftOrderStatus::PendingApproval => GiftOrderStatus::PendingApproval,
            DomainGiftOrderStatus::Approved => GiftOrderStatus::Approved,
            DomainGiftOrderStatus::Ordered => GiftOrderStatus::Ordered,
            DomainGiftOrderStatus::Shipped => GiftOrderStatus::Shipped,
            DomainGiftOrderStatus::Delivered => GiftOrderStatus::Delivered,
            DomainGiftOrderStatus::Cancelled => GiftOrderStatus::Cancelled,
            DomainGiftOrderStatus::Failed => GiftOrderStatus::Failed,
        }
    }

    pub fn to_dto(domain: DomainGiftOrder) -> GiftOrder {
        GiftOrder {
            id: domain.id,
            parent_id: domain.parent_id,
            child_id: domain.child_id,
            catalog_item_id: domain.catalog_item_id,
            title: domain.title,
            order_type: Self::order_type_to_dto(domain.order_type),
            status: Self::status_to_dto(domain.status),
            price_cents: domain.price_cents,
            cost_points: domain.cost_points,
            points_from_score: domain.points_from_score,
            neighbor_cents_deducted: domain.neighbor_cents_deducted,
            behavior_reason: domain.behavior_reason,
            shipping_address: domain.shipping_address,
            parent_note: domain.parent_note,
            vendor_reference: domain.vendor_reference,
            tracking_number: domain.tracking_number,
            status_reason: domain.status_reason,
            auto_approved: domain.auto_approved,
            created_at: format_timestamp(domain.created_at),
            updated_at: format_timestamp(domain.updated_at),
            approved_at: format_optional_timestamp(domain.approved_at),
        }
    }

    pub fn to_dto_list(orders: Vec<DomainGiftOrder>) -> Vec<GiftOrder> {
        orders.into_iter().map(Self::to_dto).collect()
    }

    pub fn request_status_to_dto(domain: DomainRequestStatus) -> RequestStatus {
        match domain {
            DomainRequestStatus::Pending => RequestStatus::Pending,
            DomainRequestStatus::Approved => RequestStatus::Approved,
            DomainRequestStatus::Denied => RequestStatus::Denied,
        }
    }

    pub fn request_record_to_dto(domain: DomainGiftRequestRecord) -> GiftRequestRecord {
        GiftRequestRecord {
            gift_order_id: domain.gift_order_id,
            gift_id: domain.gift_id,
            friend_name: domain.friend_name,
            price_cents: domain.price_cents,
            requested_points: domain.requested_points,
            status: Self::request_status_to_dto(domain.status),
            requested_at: format_timestamp(domain.requested_at),
            decided_at: format_optional_timestamp(domain.decided_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::csv::test_utils::sample_order;

    #[test]
    fn test_status_mapping_is_symmetric() {
        for status in [
            GiftOrderStatus::PendingApproval,
            GiftOrderStatus::Approved,
            GiftOrderStatus::Ordered,
            GiftOrderStatus::Shipped,
            GiftOrderStatus::Delivered,
            GiftOrderStatus::Cancelled,
            GiftOrderStatus::Failed,
        ] {
            let domain = GiftOrderMapper::status_to_domain(status);
            assert_eq!(GiftOrderMapper::status_to_dto(domain), status);
        }
    }

    #[test]
    fn test_order_to_dto_formats_timestamps() {
        let order = sample_order("parent::1", "child::1", DomainOrderType::Reward);
        let dto = GiftOrderMapper::to_dto(order);

        assert_eq!(dto.created_at, "2025-12-01T12:00:00");
        assert_eq!(dto.order_type, OrderType::Reward);
        assert_eq!(dto.status, GiftOrderStatus::PendingApproval);
        assert!(dto.approved_at.is_none());
    }
}
