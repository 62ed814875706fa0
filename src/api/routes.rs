//! HTTP handlers

use crate::search::{SearchError, SearchHit, SearchService, DEFAULT_K};
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse, Responder, ResponseError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

/// Shared state handed to every worker
pub struct AppState {
    pub search: SearchService,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    DEFAULT_K
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

/// Errors rendered as `{"detail": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match &e {
            SearchError::EmptyQuery | SearchError::InvalidK { .. } => ApiError::BadRequest(e.to_string()),
            _ => ApiError::Internal(format!("Search error: {}", e)),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "detail": self.to_string() }))
    }
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[post("/search")]
pub async fn search(
    state: web::Data<AppState>,
    request: web::Json<SearchRequest>,
) -> Result<web::Json<SearchResponse>, ApiError> {
    let SearchRequest { query, k } = request.into_inner();

    let results = state.search.search(&query, k).await.map_err(|e| {
        warn!(error = %e, "Search request failed");
        ApiError::from(e)
    })?;

    info!(k, results = results.len(), "Search served");
    Ok(web::Json(SearchResponse { results }))
}

/// Malformed request bodies get the same `{"detail"}` shape as other errors
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        InternalError::from_response(err, HttpResponse::BadRequest().json(json!({ "detail": detail })))
            .into()
    })
}

/// Registers every route on an app
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(health).service(search);
}
