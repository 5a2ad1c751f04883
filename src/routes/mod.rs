pub mod public;
pub mod trips;

use axum::{extract::DefaultBodyLimit, Router};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Two images per form post, plus their previews carried as `data:` URLs.
const MAX_UPLOAD_BYTES: usize = 40 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .merge(trips::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

/// Navigation bar data shared by every signed-in page.
#[derive(Clone)]
pub struct NavBar {
    pub user_label: String,
}

impl NavBar {
    pub fn new(user: &crate::models::user::AuthenticatedUser) -> Self {
        Self {
            user_label: user.label().to_string(),
        }
    }
}
