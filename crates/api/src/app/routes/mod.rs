use axum::Router;

pub mod items;
pub mod system;

/// Router for all item-directory endpoints.
pub fn router() -> Router {
    Router::new().nest("/items", items::router())
}
