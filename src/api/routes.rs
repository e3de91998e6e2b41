//! Route table for the status server.

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/api/v1/status", get(handlers::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_always_ok() {
        let app = build_router(AppState::new());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_flips_with_state() {
        let state = AppState::new();
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.set_ready();
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_reports_markets() {
        let state = AppState::new();
        state.markets.insert(
            "4306".to_string(),
            crate::api::MarketSnapshot {
                market_id: "4306".to_string(),
                title: "Will it rain?".to_string(),
                state: "resting".to_string(),
                price: Some(rust_decimal_macros::dec!(0.3510)),
                rank: Some(1),
                order_id: Some("ord-1".to_string()),
                fills: 0,
                adjustments: 2,
            },
        );
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["markets"][0]["market_id"], "4306");
        assert_eq!(json["markets"][0]["adjustments"], 2);
    }
}
