use axum::Json;
use serde_json::{Value, json};

/// Liveness probe.
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
