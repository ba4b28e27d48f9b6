//! Route definitions for the project administration page.

use axum::routing::get;
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// Routes mounted at the root.
///
/// ```text
/// GET    /projects.php    -> handle_get   (query string)
/// POST   /projects.php    -> handle_post  (form body)
/// ```
///
/// Both dispatch on the `action` parameter.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/projects.php",
        get(projects::handle_get).post(projects::handle_post),
    )
}
