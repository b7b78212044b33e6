//! HTTP routes for the balance API

use std::sync::Arc;

use axum::{extract::{Query, State}, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::xrpl_rpc::{BalanceSource, SourceError};
use crate::core::address::validate_xrpl_address;
use crate::core::keys::routes;
use crate::provider::BalanceResponse;

#[derive(Clone)]
pub struct ApiState {
    pub source: Arc<dyn BalanceSource>,
    pub service: String,
}

impl ApiState {
    pub fn new(source: Arc<dyn BalanceSource>, service: impl Into<String>) -> Self {
        Self { source, service: service.into() }
    }
}

#[derive(Deserialize)]
pub struct BalanceQuery {
    #[serde(default)]
    address: Option<String>,
}

pub fn create_router(source: Arc<dyn BalanceSource>) -> Router {
    create_router_with_name(source, "cribwallet")
}

pub fn create_router_with_name(source: Arc<dyn BalanceSource>, service: &str) -> Router {
    Router::new()
        .route(routes::HEALTH, get(health))
        .route(routes::XRPL_BALANCE, get(xrpl_balance))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(ApiState::new(source, service))
}

async fn health(State(s): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": s.service}))
}

async fn xrpl_balance(State(s): State<ApiState>, Query(q): Query<BalanceQuery>) -> (StatusCode, Json<BalanceResponse>) {
    let Some(address) = q.address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(BalanceResponse::err("Address is required")));
    };
    if let Err(e) = validate_xrpl_address(&address) {
        return (StatusCode::BAD_REQUEST, Json(BalanceResponse::err(e.to_string())));
    }

    match s.source.xrp_balance(&address).await {
        Ok(balance) => (StatusCode::OK, Json(BalanceResponse::ok(balance))),
        Err(e @ SourceError::AccountNotFound) => (StatusCode::NOT_FOUND, Json(BalanceResponse::err(e.to_string()))),
        Err(e) => {
            warn!(%address, error = %e, "balance lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(BalanceResponse::err(e.to_string())))
        }
    }
}
