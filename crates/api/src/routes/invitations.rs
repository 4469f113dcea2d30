//! Route definitions for the `/invitations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::invitations;
use crate::state::AppState;

/// Routes mounted at `/invitations`.
///
/// ```text
/// GET /pending   -> list_pending
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/pending", get(invitations::list_pending))
}
