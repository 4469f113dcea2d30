pub mod admin;
pub mod auth;
pub mod health;
pub mod invitations;
pub mod theses;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
///
/// /users                                           list, ?role= filter (auth required)
/// /users/me                                        get, update own profile
///
/// /admin/users                                     create (secretary only)
/// /admin/users/bulk                                create many, all-or-nothing
/// /admin/users/{id}                                get
///
/// /theses                                          list (?status=, ?faculty_id=), create
/// /theses/{id}                                     get, update, delete
/// /theses/{id}/select                              select (student, POST)
/// /theses/{id}/unselect                            unselect (student, POST)
/// /theses/{id}/assign                              assign to student (owner, POST)
/// /theses/{id}/cancel                              cancel (owner or secretary, POST)
/// /theses/{id}/student-pdf                         attach manuscript (assigned student, PUT)
/// /theses/{id}/grade                               submit mark (POST)
/// /theses/{id}/invitations                         list, invite
/// /theses/{id}/invitations/accept                  accept (invited faculty, POST)
/// /theses/{id}/invitations/reject                  reject (invited faculty, POST)
///
/// /invitations/pending                             caller's pending invitations
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/admin", admin::router())
        .nest("/theses", theses::router())
        .nest("/invitations", invitations::router())
}
