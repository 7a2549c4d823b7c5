use axum::{body::Body, extract::State, http::Request, response::Response};

use crate::{
    error::{AppError, Result},
    services,
    state::AppState,
};

/// Dispatches a request to the backend service selected by the routing
/// table. Mounted as the router fallback so every un-routed path lands
/// here; no matching prefix means 404.
pub async fn dispatch(State(state): State<AppState>, req: Request<Body>) -> Result<Response> {
    let rule = state
        .routes
        .match_path(req.uri().path())
        .cloned()
        .ok_or(AppError::RouteNotFound)?;

    services::proxy::forward(&state, &rule, req).await
}
