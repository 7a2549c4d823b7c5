use crate::{
    error::{AppError, Result},
    state::AppState,
};

/// Forwards a camera frame to the AI collaborator for form scoring.
///
/// The payload is relayed verbatim with the identity id attached as a
/// header. Upstream failures never reach the client in detail; callers
/// translate `AnalysisFailed` into a generic `analysis_error` event.
pub async fn analyze_frame(
    state: &AppState,
    user_id: i64,
    payload: &sonic_rs::Value,
) -> Result<sonic_rs::Value> {
    let url = format!("{}/analyze/form", state.config.services.ai);

    let response = state
        .http
        .post(&url)
        .header("X-User-ID", user_id.to_string())
        .json(payload)
        .send()
        .await
        .map_err(|e| AppError::AnalysisFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(AppError::AnalysisFailed(format!(
            "AI service returned {}",
            response.status()
        )));
    }

    response
        .json::<sonic_rs::Value>()
        .await
        .map_err(|e| AppError::AnalysisFailed(format!("Invalid AI response: {}", e)))
}
