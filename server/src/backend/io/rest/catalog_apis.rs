//! # REST API for the Gift Catalog

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::{error, info};

use super::error_response;
use super::mappers::catalog_mapper::CatalogMapper;
use crate::backend::domain::commands::catalog::CreateCatalogItemCommand;
use crate::backend::AppState;
use shared::{CatalogItemResponse, CatalogListResponse, CreateCatalogItemRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(list_catalog_items).post(create_catalog_item))
        .route("/catalog/:item_id", get(get_catalog_item))
}

pub async fn list_catalog_items(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/catalog");

    match state.catalog_service.list_items().await {
        Ok(items) => {
            let response = CatalogListResponse {
                items: CatalogMapper::to_dto_list(items),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to list catalog items: {}", e);
            error_response(&e)
        }
    }
}

pub async fn create_catalog_item(
    State(state): State<AppState>,
    Json(request): Json<CreateCatalogItemRequest>,
) -> impl IntoResponse {
    info!("POST /api/catalog - request: {:?}", request);

    let command = CreateCatalogItemCommand {
        title: request.title,
        price_cents: request.price_cents,
        image_url: request.image_url,
        retailer: request.retailer,
    };

    match state.catalog_service.add_item(command).await {
        Ok(item) => {
            let response = CatalogItemResponse {
                item: CatalogMapper::to_dto(item),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to create catalog item: {}", e);
            error_response(&e)
        }
    }
}

pub async fn get_catalog_item(State(state): State<AppState>, Path(item_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/catalog/{}", item_id);

    match state.catalog_service.get_item(&item_id).await {
        Ok(item) => {
            let response = CatalogItemResponse {
                item: CatalogMapper::to_dto(item),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to get catalog item {}: {}", item_id, e);
            error_response(&e)
        }
    }
}
