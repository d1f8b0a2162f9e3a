use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shared::{
    domain::base_name,
    error::{ApiError, ErrorCode},
};
use tracing::{error, info};

mod config;
mod dataset;

use config::load_settings;
use dataset::Dataset;

struct AppState {
    dataset: Dataset,
}

type ApiFailure = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let dataset = Dataset::open(&settings.data_dir).map_err(|err| {
        error!(
            data_dir = %settings.data_dir.display(),
            "failed to open dataset directory; run the prepare tool first: {err:#}"
        );
        err
    })?;

    let state = AppState { dataset };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "dataset server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/models", get(list_models))
        .route("/api/files", get(list_files))
        .route("/api/image/:file", get(get_image))
        .route("/api/keywords/:base", get(get_keywords))
        .route("/api/results/:model/:base", get(get_result))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn internal(err: anyhow::Error) -> ApiFailure {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(ErrorCode::Internal, format!("{err:#}"))),
    )
}

fn not_found(message: impl Into<String>) -> ApiFailure {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(ErrorCode::NotFound, message)),
    )
}

fn invalid(message: impl Into<String>) -> ApiFailure {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(ErrorCode::Validation, message)),
    )
}

async fn list_models(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiFailure> {
    let models = state.dataset.models().map_err(internal)?;
    Ok(Json(models))
}

async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiFailure> {
    let files = state.dataset.files().map_err(internal)?;
    Ok(Json(files))
}

async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let path = state
        .dataset
        .image_path(&file)
        .map_err(|err| invalid(format!("{err:#}")))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| not_found(format!("image '{file}' not found")))?;

    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    Ok((StatusCode::OK, headers, bytes))
}

async fn get_keywords(
    State(state): State<Arc<AppState>>,
    Path(base): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    // Callers may address keywords by the full file name; normalize to base.
    let base = base_name(&base).to_string();
    let document = state
        .dataset
        .keywords(&base)
        .map_err(|err| invalid(format!("{err:#}")))?
        .ok_or_else(|| not_found(format!("keywords for '{base}' not found")))?;
    Ok(Json(document))
}

async fn get_result(
    State(state): State<Arc<AppState>>,
    Path((model, base)): Path<(String, String)>,
) -> Result<Json<Value>, ApiFailure> {
    let models = state.dataset.models().map_err(internal)?;
    if !models.iter().any(|known| known == &model) {
        return Err(not_found(format!("unknown model '{model}'")));
    }

    let base = base_name(&base).to_string();
    let document = state
        .dataset
        .result(&model, &base)
        .map_err(|err| invalid(format!("{err:#}")))?
        .ok_or_else(|| not_found(format!("result '{model}/{base}' not found")))?;
    Ok(Json(document))
}
