use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{debug, info};

use crate::models::error::ApiError;
use crate::models::location_record::{LocationRecord, NewLocation};
use crate::storage::codec::StoredRow;
use crate::storage::csv_store::LocationStore;

const MAP_PAGE: &str = "map.html";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LocationStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/locations", get(list_locations).post(store_location))
        .route_service("/map", ServeFile::new(static_dir.join(MAP_PAGE)))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
}

#[derive(Debug, Serialize)]
pub struct StoredResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: LocationRecord,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<StoredRow>,
    pub count: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    #[default]
    Oldest,
    Newest,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub order: ListOrder,
}

async fn store_location(
    State(state): State<AppState>,
    body: Result<Json<NewLocation>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredResponse>), ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))?;
    debug!("Received location data: {:?}", body);

    let record = body.into_record(Utc::now()).map_err(|e| {
        debug!("Rejected location: {}", e);
        e
    })?;

    state
        .store
        .append(&record)
        .await
        .map_err(|e| ApiError::storage("Failed to store location data", e))?;

    info!("Location stored from device: {}", record.device);

    Ok((
        StatusCode::CREATED,
        Json(StoredResponse {
            success: true,
            message: "Location stored successfully",
            data: record,
        }),
    ))
}

async fn list_locations(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ApiError::MalformedQuery(rejection.body_text()))?;
    let decoded = state
        .store
        .read_all()
        .await
        .map_err(|e| ApiError::storage("Failed to read locations", e))?;

    let mut rows = decoded.rows;
    if params.order == ListOrder::Newest {
        rows.reverse();
    }
    if decoded.skipped > 0 {
        info!("Skipped {} malformed location rows", decoded.skipped);
    }
    debug!("Returning {} locations", rows.len());

    Ok(Json(ListResponse {
        success: true,
        count: rows.len(),
        data: rows,
        skipped: decoded.skipped,
    }))
}
