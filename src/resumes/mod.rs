use crate::state::AppState;
use axum::Router;

pub mod access;
mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod text;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_router())
        .merge(handlers::write_router())
}
