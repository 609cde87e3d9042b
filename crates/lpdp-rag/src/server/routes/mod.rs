//! Routes for the RAG server

pub mod admin;
pub mod chat;

use axum::{
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Chat page and question endpoints
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/chat") }))
        .route("/chat", get(chat::chat_page).post(chat::ask))
        .route("/chat/history", get(chat::history))
        .route("/chat/clear", post(chat::clear))
}

/// Administrative endpoints, with a larger body limit for uploads
pub fn admin_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(admin::stats))
        .route(
            "/admin/upload",
            post(admin::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
}
