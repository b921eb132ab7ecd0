//! # REST API for Parents and Children
//!
//! Account setup, behavior points, gift lists, approval settings and the
//! yearly reset.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post, put},
    Router,
};
use tracing::{error, info};

use super::mappers::family_mapper::FamilyMapper;
use super::{error_response, ParentIdentity};
use crate::backend::domain::commands::family::{
    AdjustScoreCommand, CreateChildCommand, CreateParentCommand, SetScoreCommand,
};
use crate::backend::domain::errors::LedgerResult;
use crate::backend::domain::models::child::Child;
use crate::backend::domain::models::parent::Parent;
use crate::backend::AppState;
use shared::{
    AdjustScoreRequest, ApprovalSettingsResponse, ChildListResponse, ChildResponse, CreateChildRequest,
    CreateParentRequest, FinalizeListsRequest, GiftApprovalSettings, GiftListRequest, ParentResponse, SetScoreRequest,
    UpdateShippingAddressRequest, YearlyResetResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/parents", post(create_parent))
        .route("/parents/me", get(get_parent))
        .route("/parents/me/shipping-address", put(update_shipping_address))
        .route("/parents/me/lists-finalized", put(set_lists_finalized))
        .route(
            "/parents/me/approval-settings",
            get(get_approval_settings).put(update_approval_settings),
        )
        .route("/parents/me/yearly-reset", post(yearly_reset))
        .route("/children", get(list_children).post(add_child))
        .route("/children/:child_id", get(get_child))
        .route("/children/:child_id/score", post(adjust_score).put(set_score))
        .route("/children/:child_id/gift-list", post(add_to_gift_list))
        .route("/children/:child_id/gift-list/:item_id", delete(remove_from_gift_list))
}

pub async fn create_parent(State(state): State<AppState>, Json(request): Json<CreateParentRequest>) -> impl IntoResponse {
    info!("POST /api/parents - request: {:?}", request);

    let command = CreateParentCommand {
        name: request.name,
        email: request.email,
        shipping_address: request.shipping_address,
    };
    match state.parent_service.create_parent(command).await {
        Ok(parent) => {
            let response = ParentResponse {
                parent: FamilyMapper::parent_to_dto(parent),
                success_message: "Parent account created".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to create parent: {}", e);
            error_response(&e)
        }
    }
}

pub async fn get_parent(State(state): State<AppState>, ParentIdentity(parent_id): ParentIdentity) -> impl IntoResponse {
    info!("GET /api/parents/me for {}", parent_id);

    let result = state.parent_service.get_parent(&parent_id).await;
    parent_response(result, "Parent found", "get parent")
}

pub async fn update_shipping_address(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Json(request): Json<UpdateShippingAddressRequest>,
) -> impl IntoResponse {
    info!("PUT /api/parents/me/shipping-address for {}", parent_id);

    let result = state
        .parent_service
        .update_shipping_address(&parent_id, request.shipping_address)
        .await;
    parent_response(result, "Shipping address updated", "update shipping address")
}

pub async fn set_lists_finalized(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Json(request): Json<FinalizeListsRequest>,
) -> impl IntoResponse {
    info!("PUT /api/parents/me/lists-finalized - request: {:?}", request);

    let message = if request.finalized { "Gift lists finalized" } else { "Gift lists reopened" };
    let result = state.parent_service.set_lists_finalized(&parent_id, request.finalized).await;
    parent_response(result, message, "set lists_finalized")
}

pub async fn get_approval_settings(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
) -> impl IntoResponse {
    info!("GET /api/parents/me/approval-settings for {}", parent_id);

    match state.parent_service.get_approval_settings(&parent_id).await {
        Ok(settings) => {
            let response = ApprovalSettingsResponse {
                parent_id,
                settings: FamilyMapper::settings_to_dto(settings),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to get approval settings: {}", e);
            error_response(&e)
        }
    }
}

pub async fn update_approval_settings(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Json(request): Json<GiftApprovalSettings>,
) -> impl IntoResponse {
    info!("PUT /api/parents/me/approval-settings - request: {:?}", request);

    let settings = FamilyMapper::settings_to_domain(request);
    match state.parent_service.update_approval_settings(&parent_id, settings).await {
        Ok(settings) => {
            let response = ApprovalSettingsResponse {
                parent_id,
                settings: FamilyMapper::settings_to_dto(settings),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to update approval settings: {}", e);
            error_response(&e)
        }
    }
}

pub async fn yearly_reset(State(state): State<AppState>, ParentIdentity(parent_id): ParentIdentity) -> impl IntoResponse {
    info!("POST /api/parents/me/yearly-reset for {}", parent_id);

    match state.yearly_reset_service.reset(&parent_id).await {
        Ok(result) => {
            let response = YearlyResetResponse {
                children_reset: result.children_reset,
                cancelled_orders: result.cancelled_orders,
                success_message: "A new season has started".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to run yearly reset: {}", e);
            error_response(&e)
        }
    }
}

pub async fn list_children(State(state): State<AppState>, ParentIdentity(parent_id): ParentIdentity) -> impl IntoResponse {
    info!("GET /api/children for {}", parent_id);

    match state.child_service.list_children(&parent_id).await {
        Ok(children) => {
            let response = ChildListResponse {
                children: FamilyMapper::child_list_to_dto(children),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to list children: {}", e);
            error_response(&e)
        }
    }
}

pub async fn add_child(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Json(request): Json<CreateChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/children - request: {:?}", request);

    let command = CreateChildCommand {
        name: request.name,
        starting_score: request.starting_score.unwrap_or(0),
    };
    match state.child_service.add_child(&parent_id, command).await {
        Ok(child) => {
            let response = ChildResponse {
                child: FamilyMapper::child_to_dto(child),
                success_message: "Child added".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to add child: {}", e);
            error_response(&e)
        }
    }
}

pub async fn get_child(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}", child_id);

    let result = state.child_service.get_owned_child(&parent_id, &child_id).await;
    child_response(result, "Child found", "get child")
}

pub async fn adjust_score(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(child_id): Path<String>,
    Json(request): Json<AdjustScoreRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/score - request: {:?}", child_id, request);

    let command = AdjustScoreCommand {
        child_id,
        delta: request.delta,
        reason: request.reason,
    };
    let result = state.child_service.adjust_score(&parent_id, command).await;
    child_response(result, "Score updated", "adjust score")
}

pub async fn set_score(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(child_id): Path<String>,
    Json(request): Json<SetScoreRequest>,
) -> impl IntoResponse {
    info!("PUT /api/children/{}/score - request: {:?}", child_id, request);

    let command = SetScoreCommand {
        child_id,
        score: request.score,
        reason: request.reason,
    };
    let result = state.child_service.set_score(&parent_id, command).await;
    child_response(result, "Score set", "set score")
}

pub async fn add_to_gift_list(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(child_id): Path<String>,
    Json(request): Json<GiftListRequest>,
) -> impl IntoResponse {
    info!("POST /api/children/{}/gift-list - request: {:?}", child_id, request);

    let result = state
        .child_service
        .add_to_gift_list(&parent_id, &child_id, &request.catalog_item_id)
        .await;
    child_response(result, "Gift added to list", "add to gift list")
}

pub async fn remove_from_gift_list(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path((child_id, item_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/children/{}/gift-list/{}", child_id, item_id);

    let result = state
        .child_service
        .remove_from_gift_list(&parent_id, &child_id, &item_id)
        .await;
    child_response(result, "Gift removed from list", "remove from gift list")
}

fn parent_response(result: LedgerResult<Parent>, message: &str, action: &str) -> Response {
    match result {
        Ok(parent) => {
            let response = ParentResponse {
                parent: FamilyMapper::parent_to_dto(parent),
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

fn child_response(result: LedgerResult<Child>, message: &str, action: &str) -> Response {
    match result {
        Ok(child) => {
            let response = ChildResponse {
                child: FamilyMapper::child_to_dto(child),
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
