//! Route definition for personalized recommendations.

use axum::routing::post;
use axum::Router;

use crate::handlers::recommendations;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/recommendations", post(recommendations::recommend))
}
