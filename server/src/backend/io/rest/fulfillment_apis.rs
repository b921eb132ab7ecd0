//! # REST API for Gift Order Fulfilment

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use super::mappers::gift_order_mapper::GiftOrderMapper;
use super::{error_response, ParentIdentity};
use crate::backend::domain::commands::fulfillment::{MarkOrderedCommand, MarkShippedCommand, ReleaseOrderCommand};
use crate::backend::domain::errors::LedgerResult;
use crate::backend::domain::models::gift_order::GiftOrder;
use crate::backend::AppState;
use shared::{
    CancelOrderRequest, FailOrderRequest, GiftOrderListQuery, GiftOrderListResponse, GiftOrderResponse,
    MarkOrderedRequest, MarkShippedRequest,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/gift-orders", get(list_gift_orders))
        .route("/gift-orders/:order_id", get(get_gift_order))
        .route("/gift-orders/:order_id/ordered", post(mark_ordered))
        .route("/gift-orders/:order_id/shipped", post(mark_shipped))
        .route("/gift-orders/:order_id/delivered", post(mark_delivered))
        .route("/gift-orders/:order_id/cancel", post(cancel_order))
        .route("/gift-orders/:order_id/fail", post(fail_order))
}

pub async fn list_gift_orders(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Query(query): Query<GiftOrderListQuery>,
) -> impl IntoResponse {
    info!("GET /api/gift-orders - query: {:?}", query);

    let status = query.status.map(GiftOrderMapper::status_to_domain);
    match state.fulfillment_service.list_orders(&parent_id, status).await {
        Ok(orders) => {
            let response = GiftOrderListResponse {
                gift_orders: GiftOrderMapper::to_dto_list(orders),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to list gift orders: {}", e);
            error_response(&e)
        }
    }
}

pub async fn get_gift_order(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/gift-orders/{}", order_id);

    let result = state.fulfillment_service.get_order(&parent_id, &order_id).await;
    order_response(result, "Gift order found", "get gift order")
}

pub async fn mark_ordered(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(order_id): Path<String>,
    Json(request): Json<MarkOrderedRequest>,
) -> impl IntoResponse {
    info!("POST /api/gift-orders/{}/ordered - request: {:?}", order_id, request);

    let command = MarkOrderedCommand {
        gift_order_id: order_id,
        vendor_reference: request.vendor_reference,
    };
    let result = state.fulfillment_service.mark_ordered(&parent_id, command).await;
    order_response(result, "Gift ordered", "mark gift order as ordered")
}

pub async fn mark_shipped(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(order_id): Path<String>,
    Json(request): Json<MarkShippedRequest>,
) -> impl IntoResponse {
    info!("POST /api/gift-orders/{}/shipped - request: {:?}", order_id, request);

    let command = MarkShippedCommand {
        gift_order_id: order_id,
        tracking_number: request.tracking_number,
    };
    let result = state.fulfillment_service.mark_shipped(&parent_id, command).await;
    order_response(result, "Gift shipped", "mark gift order as shipped")
}

pub async fn mark_delivered(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/gift-orders/{}/delivered", order_id);

    let result = state.fulfillment_service.mark_delivered(&parent_id, &order_id).await;
    order_response(result, "Gift delivered", "mark gift order as delivered")
}

pub async fn cancel_order(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(order_id): Path<String>,
    Json(request): Json<CancelOrderRequest>,
) -> impl IntoResponse {
    info!("POST /api/gift-orders/{}/cancel - request: {:?}", order_id, request);

    let command = ReleaseOrderCommand {
        gift_order_id: order_id,
        reason: request.reason,
    };
    let result = state.fulfillment_service.cancel_order(&parent_id, command).await;
    order_response(result, "Gift order cancelled", "cancel gift order")
}

pub async fn fail_order(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(order_id): Path<String>,
    Json(request): Json<FailOrderRequest>,
) -> impl IntoResponse {
    info!("POST /api/gift-orders/{}/fail - request: {:?}", order_id, request);

    let command = ReleaseOrderCommand {
        gift_order_id: order_id,
        reason: Some(request.reason),
    };
    let result = state.fulfillment_service.fail_order(&parent_id, command).await;
    order_response(result, "Gift order marked as failed", "fail gift order")
}

fn order_response(result: LedgerResult<GiftOrder>, message: &str, action: &str) -> axum::response::Response {
    match result {
        Ok(order) => {
            let response = GiftOrderResponse {
                gift_order: GiftOrderMapper::to_dto(order),
                success_message: message.to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to {}: {}", action, e);
            error_response(&e)
        }
    }
}
