//! The authority's HTTP surface: an `axum::Router` implementing the wire
//! contract, a permissive CORS layer, and a bearer-token guard on admin
//! routes.

use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

use license_types::{ApiEnvelope, FabricError, MachineInfo, TokenPayload};

use crate::engine::Engine;

/// Shared state every handler reaches into.
pub struct AppState {
    pub engine: Engine,
    pub admin_token: Option<String>,
}

fn envelope_response<T: Serialize>(result: Result<T, FabricError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiEnvelope::ok(data))).into_response(),
        Err(err) => {
            let status = err.http_status();
            let status_code =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status_code, Json(ApiEnvelope::<()>::error(status, err.to_string()))).into_response()
        }
    }
}

async fn admin_guard(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == axum::http::Method::OPTIONS {
        return next.run(req).await;
    }

    let Some(expected) = &state.admin_token else {
        return next.run(req).await;
    };

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => next.run(req).await,
        _ => {
            let envelope = ApiEnvelope::<()>::error(401, "missing or invalid admin token");
            (StatusCode::UNAUTHORIZED, Json(envelope)).into_response()
        }
    }
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenPayload>,
) -> Response {
    envelope_response(state.engine.mint(payload).await)
}

async fn list_licenses_handler(State(state): State<Arc<AppState>>) -> Response {
    envelope_response(Ok::<_, FabricError>(state.engine.list_licenses().await))
}

async fn delete_license_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    envelope_response(state.engine.delete_license(&id).await)
}

async fn public_key_handler(State(state): State<Arc<AppState>>) -> Response {
    envelope_response(Ok::<_, FabricError>(state.engine.public_key_pem().to_string()))
}

async fn list_nodes_handler(State(state): State<Arc<AppState>>) -> Response {
    envelope_response(Ok::<_, FabricError>(state.engine.list_nodes().await))
}

#[derive(Deserialize)]
struct RegisterBody {
    #[serde(rename = "licenseCode")]
    license_code: String,
    #[serde(rename = "machineInfo")]
    machine_info: MachineInfo,
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Response {
    envelope_response(
        state
            .engine
            .register(&body.license_code, body.machine_info)
            .await,
    )
}

#[derive(Deserialize)]
struct NodeIdBody {
    #[serde(rename = "nodeId")]
    node_id: String,
}

async fn heartbeat_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NodeIdBody>,
) -> Response {
    if state.engine.heartbeat(&body.node_id).await {
        envelope_response(Ok::<_, FabricError>(true))
    } else {
        envelope_response(Err::<bool, _>(FabricError::NotFound(body.node_id)))
    }
}

async fn unregister_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NodeIdBody>,
) -> Response {
    state.engine.unregister(&body.node_id).await;
    envelope_response(Ok::<_, FabricError>(true))
}

async fn stats_handler(State(state): State<Arc<AppState>>) -> Response {
    envelope_response(Ok::<_, FabricError>(state.engine.stats().await))
}

/// Builds the router. Admin routes sit behind `admin_guard`; public routes
/// (publicKey, register, heartbeat, unregister) do not.
pub fn build_router(state: Arc<AppState>) -> Router {
    if state.admin_token.is_none() {
        warn!("admin token not configured; admin routes are open (local development only)");
    }

    let admin_routes = Router::new()
        .route("/api/license/generate", post(generate_handler))
        .route("/api/license/list", get(list_licenses_handler))
        .route("/api/license/:id", delete(delete_license_handler))
        .route("/api/license/nodes", get(list_nodes_handler))
        .route("/api/node/stats", get(stats_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_guard));

    let public_routes = Router::new()
        .route("/api/license/publicKey", get(public_key_handler))
        .route("/api/node/register", post(register_handler))
        .route("/api/node/heartbeat", post(heartbeat_handler))
        .route("/api/node/unregister", post(unregister_handler));

    admin_routes
        .merge(public_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
