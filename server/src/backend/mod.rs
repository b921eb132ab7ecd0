//! # Backend Module
//!
//! Everything behind the HTTP port of the gift ledger.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers, DTO mapping)
//!     ↓
//! Domain Layer (services, points ledger, policy)
//!     ↓
//! Storage Layer (YAML documents and CSV collections)
//! ```
//!
//! Adapters sit beside the domain: the payment gateway and the notifier are
//! injected as trait objects so tests can swap them out.

pub mod adapters;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::backend::adapters::{LocalPaymentGateway, LoggingNotifier, Notifier, PaymentGateway};
use crate::backend::domain::{
    ApprovalService, CatalogService, ChildService, Clock, FulfillmentService, GiftRequestService, ParentService,
    PointsLedger, PolicyService, SystemClock, WalletService, YearlyResetService,
};
use crate::backend::io::rest;
use crate::backend::storage::csv::CsvConnection;
use crate::config::ServerConfig;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub parent_service: ParentService,
    pub child_service: ChildService,
    pub catalog_service: CatalogService,
    pub policy_service: PolicyService,
    pub gift_request_service: GiftRequestService,
    pub approval_service: ApprovalService,
    pub fulfillment_service: FulfillmentService,
    pub wallet_service: WalletService,
    pub yearly_reset_service: YearlyResetService,
}

/// Wire every service against one data directory
pub fn build_app_state(
    csv_conn: Arc<CsvConnection>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    payment_gateway: Arc<dyn PaymentGateway>,
    welcome_packet_cents: i64,
) -> AppState {
    let parent_service = ParentService::new(csv_conn.clone(), clock.clone());
    let child_service = ChildService::new(csv_conn.clone(), parent_service.clone(), clock.clone());
    let catalog_service = CatalogService::new(csv_conn.clone(), clock.clone());
    let points_ledger = PointsLedger::new(csv_conn.clone());
    let policy_service = PolicyService::new(
        csv_conn.clone(),
        child_service.clone(),
        parent_service.clone(),
        clock.clone(),
    );
    let gift_request_service = GiftRequestService::new(
        csv_conn.clone(),
        child_service.clone(),
        parent_service.clone(),
        policy_service.clone(),
        points_ledger.clone(),
        notifier.clone(),
        clock.clone(),
    );
    let approval_service = ApprovalService::new(
        csv_conn.clone(),
        child_service.clone(),
        points_ledger.clone(),
        notifier.clone(),
        clock.clone(),
    );
    let fulfillment_service = FulfillmentService::new(
        csv_conn.clone(),
        approval_service.clone(),
        parent_service.clone(),
        points_ledger,
        notifier,
        clock.clone(),
    );
    let wallet_service = WalletService::new(
        csv_conn.clone(),
        parent_service.clone(),
        child_service.clone(),
        payment_gateway,
        welcome_packet_cents,
        clock.clone(),
    );
    let yearly_reset_service = YearlyResetService::new(
        csv_conn,
        parent_service.clone(),
        child_service.clone(),
        clock,
    );

    AppState {
        parent_service,
        child_service,
        catalog_service,
        policy_service,
        gift_request_service,
        approval_service,
        fulfillment_service,
        wallet_service,
        yearly_reset_service,
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &ServerConfig) -> Result<AppState> {
    info!("Setting up data directory at {}", config.data_dir.display());
    let csv_conn = Arc::new(CsvConnection::new(&config.data_dir)?);

    info!("Setting up domain model");
    let app_state = build_app_state(
        csv_conn,
        Arc::new(SystemClock),
        Arc::new(LoggingNotifier),
        Arc::new(LocalPaymentGateway::new(config.checkout_base_url())),
        config.welcome_packet_cents,
    );

    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: Option<&str>) -> Router {
    let allow_origin = match cors_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                AllowOrigin::from(Any)
            }
        },
        None => AllowOrigin::from(Any),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .merge(rest::family_apis::router())
        .merge(rest::catalog_apis::router())
        .merge(rest::gift_request_apis::router())
        .merge(rest::approval_apis::router())
        .merge(rest::fulfillment_apis::router())
        .merge(rest::policy_apis::router())
        .merge(rest::wallet_apis::router());

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}


#[cfg(test)]
mod tests {
    use super::test_support::TestBackend;
    use super::*;
    use crate::backend::domain::commands::family::CreateParentCommand;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(backend: &TestBackend) -> Router {
        create_router(backend.state.clone(), None)
    }

    fn request(method: &str, uri: &str, parent_id: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(parent_id) = parent_id {
            builder = builder.header(rest::PARENT_ID_HEADER, parent_id);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_parent_header_is_unauthorized() {
        let backend = TestBackend::new(10).await;

        let response = app(&backend).oneshot(request("GET", "/api/children", None, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_create_parent_then_read_profile() {
        let backend = TestBackend::new(0).await;
        let body = json!({ "name": "Robin", "email": "robin@example.com", "shipping_address": null });

        let response = app(&backend)
            .oneshot(request("POST", "/api/parents", None, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let parent_id = created["parent"]["id"].as_str().unwrap().to_string();

        let response = app(&backend)
            .oneshot(request("GET", "/api/parents/me", Some(&parent_id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["parent"]["email"], "robin@example.com");
    }

    #[tokio::test]
    async fn test_reward_request_and_approval_over_http() {
        let backend = TestBackend::new(20).await;
        let item = backend.add_catalog_item("Puzzle", 900).await;
        let uri = format!("/api/children/{}/gift-requests", backend.child_id);
        let body = json!({
            "catalog_item_id": item.id,
            "order_type": "REWARD",
            "behavior_reason": "Helped with dishes",
            "shipping_address": null
        });

        let response = app(&backend)
            .oneshot(request("POST", &uri, Some(&backend.parent_id), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["status"], "PENDING_APPROVAL");
        let order_id = created["gift_order"]["id"].as_str().unwrap().to_string();

        let decision = json!({ "approved": true, "note": null });
        let response = app(&backend)
            .oneshot(request(
                "POST",
                &format!("/api/gift-orders/{}/decision", order_id),
                Some(&backend.parent_id),
                Some(decision),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.child().await.score365, 11);
    }

    #[tokio::test]
    async fn test_insufficient_points_maps_to_unprocessable() {
        let backend = TestBackend::new(2).await;
        let item = backend.add_catalog_item("Bicycle", 15_000).await;
        let uri = format!("/api/children/{}/gift-requests", backend.child_id);
        let body = json!({
            "catalog_item_id": item.id,
            "order_type": "REWARD",
            "behavior_reason": null,
            "shipping_address": null
        });

        let response = app(&backend)
            .oneshot(request("POST", &uri, Some(&backend.parent_id), Some(body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["code"], "INSUFFICIENT_POINTS");
    }

    #[tokio::test]
    async fn test_other_parents_child_is_forbidden() {
        let backend = TestBackend::new(5).await;
        let stranger = backend
            .state
            .parent_service
            .create_parent(CreateParentCommand {
                name: "Jo".to_string(),
                email: "jo@example.com".to_string(),
                shipping_address: None,
            })
            .await
            .unwrap();

        let uri = format!("/api/children/{}", backend.child_id);
        let response = app(&backend).oneshot(request("GET", &uri, Some(&stranger.id), None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_christmas_window_is_public() {
        let backend = TestBackend::new(0).await;

        let response = app(&backend)
            .oneshot(request("GET", "/api/policy/christmas-window?year=2026", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["year"], 2026);
    }
}
