//! # REST API for Parent Approvals

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use super::mappers::gift_order_mapper::GiftOrderMapper;
use super::{error_response, ParentIdentity};
use crate::backend::domain::commands::approvals::ApproveGiftCommand;
use crate::backend::AppState;
use shared::{ApproveGiftRequest, ApproveGiftResponse, PendingApproval, PendingApprovalsResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/approvals/pending", get(get_pending_approvals))
        .route("/gift-orders/:order_id/decision", post(approve_gift_request))
}

pub async fn get_pending_approvals(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
) -> impl IntoResponse {
    info!("GET /api/approvals/pending for parent {}", parent_id);

    match state.approval_service.get_pending_approvals(&parent_id).await {
        Ok(views) => {
            let pending = views
                .into_iter()
                .map(|view| PendingApproval {
                    gift_order: GiftOrderMapper::to_dto(view.gift_order),
                    child_name: view.child_name,
                    affordable: view.affordable,
                })
                .collect();
            (StatusCode::OK, Json(PendingApprovalsResponse { pending })).into_response()
        }
        Err(e) => {
            error!("Failed to get pending approvals: {}", e);
            error_response(&e)
        }
    }
}

pub async fn approve_gift_request(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(order_id): Path<String>,
    Json(request): Json<ApproveGiftRequest>,
) -> impl IntoResponse {
    info!("POST /api/gift-orders/{}/decision - request: {:?}", order_id, request);

    let command = ApproveGiftCommand {
        gift_order_id: order_id,
        approved: request.approved,
        note: request.note,
    };

    match state.approval_service.approve_gift_request(&parent_id, command).await {
        Ok(result) => {
            let gift_order = GiftOrderMapper::to_dto(result.gift_order);
            let success_message = if request.approved {
                format!("'{}' approved", gift_order.title)
            } else {
                format!("'{}' denied", gift_order.title)
            };
            let response = ApproveGiftResponse {
                status: gift_order.status,
                remaining_points: result.remaining_points,
                gift_order,
                success_message,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to decide gift order: {}", e);
            error_response(&e)
        }
    }
}
