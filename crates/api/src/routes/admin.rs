//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `SECRETARY` role (enforced by handler extractors).
///
/// ```text
/// POST   /users          -> create_user
/// POST   /users/bulk     -> bulk_create_users
/// GET    /users/{id}     -> get_user
/// DELETE /users/{id}     -> delete_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(admin::create_user))
        .route("/users/bulk", post(admin::bulk_create_users))
        .route("/users/{id}", get(admin::get_user).delete(admin::delete_user))
}
