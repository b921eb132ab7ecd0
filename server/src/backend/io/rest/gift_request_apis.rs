//! # REST API for Gift Requests
//!
//! Children ask for gifts through their parent's session, so every route
//! here is scoped to a child of the calling parent.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use tracing::{error, info};

use super::mappers::gift_order_mapper::GiftOrderMapper;
use super::{error_response, ParentIdentity};
use crate::backend::domain::commands::gift_requests::{RequestGiftCommand, SpecialGiftCommand, SpecialGiftResult};
use crate::backend::AppState;
use shared::{EarlyGiftRequest, FriendGiftRequest, GiftRequestResponse, RequestGiftRequest, RequestGiftResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/children/:child_id/gift-requests", post(request_gift))
        .route("/children/:child_id/early-gift-requests", post(request_early_gift))
        .route("/children/:child_id/friend-gift-requests", post(request_friend_gift))
}

pub async fn request_gift(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(child_id): Path<String>,
    Json(request): Json<RequestGiftRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/gift-requests - request: {:?}", child_id, request);

    let command = RequestGiftCommand {
        child_id,
        catalog_item_id: request.catalog_item_id,
        order_type: GiftOrderMapper::order_type_to_domain(request.order_type),
        behavior_reason: request.behavior_reason,
        shipping_address: request.shipping_address,
    };

    match state.gift_request_service.request_gift(&parent_id, command).await {
        Ok(result) => {
            let gift_order = GiftOrderMapper::to_dto(result.gift_order);
            let success_message = if result.points_deducted > 0 {
                format!("'{}' approved, {} points deducted", gift_order.title, result.points_deducted)
            } else {
                format!("'{}' is waiting for a parent's approval", gift_order.title)
            };
            let response = RequestGiftResponse {
                status: gift_order.status,
                points_deducted: result.points_deducted,
                gift_order,
                success_message,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to request gift: {}", e);
            error_response(&e)
        }
    }
}

pub async fn request_early_gift(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(child_id): Path<String>,
    Json(request): Json<EarlyGiftRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/early-gift-requests - request: {:?}", child_id, request);

    let command = SpecialGiftCommand {
        child_id,
        gift_id: request.gift_id,
        friend_name: None,
    };

    match state.gift_request_service.request_early_gift(&parent_id, command).await {
        Ok(result) => (StatusCode::CREATED, Json(to_response(result, "Early gift requested"))).into_response(),
        Err(e) => {
            error!("Failed to request early gift: {}", e);
            error_response(&e)
        }
    }
}

pub async fn request_friend_gift(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(child_id): Path<String>,
    Json(request): Json<FriendGiftRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/friend-gift-requests - request: {:?}", child_id, request);

    let command = SpecialGiftCommand {
        child_id,
        gift_id: request.gift_id,
        friend_name: Some(request.friend_name),
    };

    match state.gift_request_service.request_friend_gift(&parent_id, command).await {
        Ok(result) => (StatusCode::CREATED, Json(to_response(result, "Friend gift requested"))).into_response(),
        Err(e) => {
            error!("Failed to request friend gift: {}", e);
            error_response(&e)
        }
    }
}

fn to_response(result: SpecialGiftResult, message: &str) -> GiftRequestResponse {
    GiftRequestResponse {
        gift_order: GiftOrderMapper::to_dto(result.gift_order),
        request: GiftOrderMapper::request_record_to_dto(result.request),
        success_message: message.to_string(),
    }
}
