use crate::{error::HttpError, AppState};
use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

/// Liveness probe with the current report count.
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, HttpError> {
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "reports": state.db.count()?,
        "uptime": state.started_at.elapsed().as_secs_f64(),
    })))
}
