// Route path constants - single source of truth for all API paths

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub const ROOT: &str = "/";
pub const HEALTH: &str = "/health";
pub const TODOS: &str = "/api/v1/todos";
pub const TODO_ITEM: &str = "/api/v1/todos/{id}";
pub const TODO_DELETE: &str = "/api/v1/todos/delete/{id}";

// Trailing-slash aliases, served by the same handlers but left out of the docs
pub const TODOS_SLASH: &str = "/api/v1/todos/";
pub const TODO_ITEM_SLASH: &str = "/api/v1/todos/{id}/";
pub const TODO_DELETE_SLASH: &str = "/api/v1/todos/delete/{id}/";

/// All application routes, without docs or middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(ROOT, get(handlers::root_handler))
        .route(HEALTH, get(handlers::health_handler))
        .route(TODOS, post(handlers::create_handler))
        .route(TODOS_SLASH, post(handlers::create_handler))
        .route(TODO_ITEM, put(handlers::update_handler))
        .route(TODO_ITEM_SLASH, put(handlers::update_handler))
        .route(TODO_DELETE, delete(handlers::delete_handler))
        .route(TODO_DELETE_SLASH, delete(handlers::delete_handler))
        .with_state(state)
}
