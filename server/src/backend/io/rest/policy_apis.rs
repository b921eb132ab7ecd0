//! # REST API for Window and Quota Policies

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::{error, info};

use super::mappers::format_timestamp;
use super::{error_response, ParentIdentity};
use crate::backend::AppState;
use shared::{ChristmasWindow, ChristmasWindowQuery, RewardGiftStats};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/policy/christmas-window", get(get_christmas_window))
        .route("/children/:child_id/reward-stats", get(get_reward_gift_stats))
}

pub async fn get_christmas_window(
    State(state): State<AppState>,
    Query(query): Query<ChristmasWindowQuery>,
) -> impl IntoResponse {
    info!("GET /api/policy/christmas-window - query: {:?}", query);

    match state.policy_service.get_christmas_window(query.year) {
        Ok(window) => {
            let response = ChristmasWindow {
                year: window.year,
                starts_at: format_timestamp(window.starts_at),
                ends_at: format_timestamp(window.ends_at),
                is_open: window.is_open,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to get Christmas window: {}", e);
            error_response(&e)
        }
    }
}

pub async fn get_reward_gift_stats(
    State(state): State<AppState>,
    ParentIdentity(parent_id): ParentIdentity,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/children/{}/reward-stats", child_id);

    match state.policy_service.get_reward_gift_stats(&parent_id, &child_id).await {
        Ok(stats) => {
            let response = RewardGiftStats {
                remaining_reward_gifts: stats.remaining(),
                limit_reached: stats.limit_reached(),
                child_id: stats.child_id,
                year: stats.year,
                used_reward_gifts: stats.used_reward_gifts,
                max_reward_gifts_per_year: stats.max_reward_gifts_per_year,
                max_reward_price_cents: stats.max_reward_price_cents,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to get reward gift stats: {}", e);
            error_response(&e)
        }
    }
}
