//! HTTP surface: prediction and dashboard endpoints behind a static
//! bearer token.
//!
//! The server never touches live trading state. Predictions go through
//! the engine's command channel; dashboard data comes from the published
//! snapshot and the persisted CSV projection.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

use crate::engine::EngineCommand;
use crate::execution::PositionSnapshot;
use crate::persistence::TradeLogs;

pub struct AppState {
    pub api_token: String,
    pub commands: mpsc::Sender<EngineCommand>,
    pub snapshot: Arc<RwLock<PositionSnapshot>>,
    pub logs: TradeLogs,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub signal: String,
    pub confidence: f64,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", get(predict))
        .route("/dashboard-data", get(dashboard_data))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, port: u16) -> crate::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("🌐 API listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Check the static bearer token. Missing and wrong tokens both 401.
fn verify_token(headers: &HeaderMap, expected: &str) -> Result<(), StatusCode> {
    let presented = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if presented == format!("Bearer {}", expected) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn root() -> impl IntoResponse {
    Json(json!({ "status": "futuresbot API is live" }))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PredictResponse>, StatusCode> {
    verify_token(&headers, &state.api_token)?;

    let (respond_to, response) = oneshot::channel();
    state
        .commands
        .send(EngineCommand::Evaluate { respond_to })
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    let (signal, confidence) = response
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(PredictResponse {
        signal: signal.to_string(),
        confidence,
    }))
}

async fn dashboard_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, StatusCode> {
    verify_token(&headers, &state.api_token)?;

    let snapshot = state
        .snapshot
        .read()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let mut data = json!({
        "last_signal": snapshot
            .side
            .map(|s| s.to_string())
            .unwrap_or_else(|| "None".to_string()),
        "is_open": snapshot.is_open,
        "entry_price": snapshot.entry_price,
        "balance": (snapshot.balance * 100.0).round() / 100.0,
        "cooldown_until": snapshot
            .cooldown_until
            .map(|t| t.to_string())
            .unwrap_or_else(|| "None".to_string()),
    });

    if let Some(last) = state.logs.last_closed_trade() {
        data["last_pnl"] = json!(last.pnl_percent);
    }

    Ok(Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert("Authorization", v.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let result = verify_token(&headers_with(None), "secret-ml-token");
        assert_eq!(result, Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_wrong_token_is_unauthorized() {
        let result = verify_token(
            &headers_with(Some("Bearer wrong-token")),
            "secret-ml-token",
        );
        assert_eq!(result, Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_bare_token_without_scheme_is_unauthorized() {
        let result = verify_token(&headers_with(Some("secret-ml-token")), "secret-ml-token");
        assert_eq!(result, Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_correct_token_passes() {
        let result = verify_token(
            &headers_with(Some("Bearer secret-ml-token")),
            "secret-ml-token",
        );
        assert_eq!(result, Ok(()));
    }
}
