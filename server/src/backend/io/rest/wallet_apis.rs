//! # REST API for the Wallet and Payment Webhook

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tracing::{error, info};

use super::mappers::family_mapper::FamilyMapper;
use super::{error_response, ParentIdentity};
use crate::backend::domain::commands::wallet::CheckoutStarted;
use crate::backend::domain::errors::LedgerResult;
use crate::backend::AppState;
use shared::{
    CheckoutResponse, DonationRequest, PaymentOutcome, PaymentWebhookRequest, PaymentWebhookResponse,
    TopUpRequest, WalletResponse, WelcomePacketRequest,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wallet", get(get_wallet))
        .route("/wallet/top-ups", post(start_top_up))
        .route("/wallet/donations", post(start_donation))
        .route("/wallet/welcome-packets", post(start_welcome_packet))
        .route("/payments/webhook", post(payment_webhook))
}

pub async fn get_wallet(State(state): State<AppState>, ParentIdentity(parent_id): ParentIdentity) -> impl IntoResponse {
    info!("GET /api/wallet for {}", parent_id);

    match state.wallet_service.get_wallet(&parent_id).await {
        Ok(summary) => {
            let response = WalletResponse {
                parent_id: summary.parent_id,
                balance_cents: summary.balance_cents,
                entries: FamilyMapper::wallet_entries_to_dto(summary.entries),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to get wallet: {}", e);
            error_response(&e)
        }
    }
}

pub async fn start_top_up(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Json(request): Json<TopUpRequest>,
) -> impl IntoResponse {
    info!("POST /api/wallet/top-ups - request: {:?}", request);

    let result = state.wallet_service.start_top_up(&parent_id, request.amount_cents).await;
    checkout_response(result, "Top-up checkout started", "start top-up")
}

pub async fn start_donation(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Json(request): Json<DonationRequest>,
) -> impl IntoResponse {
    info!("POST /api/wallet/donations - request: {:?}", request);

    let result = state
        .wallet_service
        .start_donation(&parent_id, &request.child_id, request.amount_cents)
        .await;
    checkout_response(result, "Donation checkout started", "start donation")
}

pub async fn start_welcome_packet(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Json(request): Json<WelcomePacketRequest>,
) -> impl IntoResponse {
    info!("POST /api/wallet/welcome-packets - request: {:?}", request);

    let result = state.wallet_service.start_welcome_packet(&parent_id, &request.child_id).await;
    checkout_response(result, "Welcome packet checkout started", "start welcome packet")
}

/// Outcome delivery from the payment gateway; not tied to a parent session
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(request): Json<PaymentWebhookRequest>,
) -> impl IntoResponse {
    info!("POST /api/payments/webhook - request: {:?}", request);

    let succeeded = request.outcome == PaymentOutcome::Succeeded;
    match state.wallet_service.reconcile_payment(&request.session_id, succeeded).await {
        Ok(result) => {
            let response = PaymentWebhookResponse {
                entry: FamilyMapper::wallet_entry_to_dto(result.entry),
                applied: result.applied,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to reconcile payment {}: {}", request.session_id, e);
            error_response(&e)
        }
    }
}

fn checkout_response(result: LedgerResult<CheckoutStarted>, message: &str, action: &str) -> Response {
    match result {
        Ok(started) => {
            let response = CheckoutResponse {
                entry: FamilyMapper::wallet_entry_to_dto(started.entry),
                checkout_url: started.checkout_url,
                success_message: message.to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to {}: {}", action, e);
            error_response(&e)
        }
    }
}
