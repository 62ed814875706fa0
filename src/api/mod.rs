//! HTTP search API
//!
//! - `GET /health` returns `{"status": "ok"}`
//! - `POST /search` takes `{"query": "...", "k": 5}` and returns
//!   `{"results": [...]}`, nearest chunk first
//!
//! Errors are JSON objects with a single `detail` field.

mod routes;

pub use routes::{configure, health, search, ApiError, AppState, SearchRequest, SearchResponse};

use crate::search::SearchService;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::{SocketAddr, TcpListener};
use tracing::info;

/// Builds the server on an already bound listener
pub fn build_server(listener: TcpListener, service: SearchService) -> std::io::Result<Server> {
    let state = web::Data::new(AppState { search: service });
    Ok(HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .listen(listener)?
        .run())
}

/// Binds `addr` and serves until the process receives a shutdown signal
pub async fn run_server(addr: SocketAddr, service: SearchService) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    info!("Listening on http://{}", listener.local_addr()?);
    build_server(listener, service)?.await?;
    info!("Server stopped");
    Ok(())
}
