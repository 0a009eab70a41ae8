use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    balance::handler::balance_page,
    home::handler::home,
    inflows::handler::{axs_inflows, weth_inflows},
    state::ServerState,
};

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/axs", get(axs_inflows))
        .route("/weth", get(weth_inflows))
        .route("/balance", get(balance_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use treasury_core::export::dto::{BALANCE_FILE, CURRENCY_FILE, FRONTEND_DATA_FILE};

    fn app(dir: &TempDir) -> Router {
        router(Arc::new(ServerState::from(dir.path().to_path_buf())))
    }

    async fn get_page(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn write_data(dir: &TempDir) {
        let frontend = json!([
            {"timestamp": {"$date": "2024-01-01T00:00:00.000Z"}, "date": 1704067200,
             "axs_breeding": 3.0, "weth_marketplace": 0.5},
            {"timestamp": {"$date": "2024-01-02T00:00:00.000Z"}, "date": 1704153600,
             "axs_partsEvol": 1.5}
        ]);
        let currency = json!([
            {"timestamp": {"$date": "2024-08-09T10:00:00.000Z"}, "prices": {"AXS": 4.0, "WETH": 2000.0}}
        ]);
        let balance = json!([
            {"timestamp": {"$date": "2024-08-09T10:05:00.000Z"}, "owner": "0xabc", "items": [
                {"tokenSymbol": "WETH", "balance": "2000000000000000000", "decimals": 18, "std_value": 2.0},
                {"tokenSymbol": "AXS", "balance": "7000000000000000000", "decimals": 18, "std_value": 7.0}
            ]}
        ]);
        std::fs::write(dir.path().join(FRONTEND_DATA_FILE), frontend.to_string()).unwrap();
        std::fs::write(dir.path().join(CURRENCY_FILE), currency.to_string()).unwrap();
        std::fs::write(dir.path().join(BALANCE_FILE), balance.to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_pages_render() {
        let dir = TempDir::new().unwrap();
        write_data(&dir);

        let (status, body) = get_page(app(&dir), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("R&amp;C Mint"));

        let (status, body) = get_page(app(&dir), "/axs").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Total AXS: 4.50 ($18.00)"));

        let (status, body) = get_page(app(&dir), "/weth?start=2024-01-01&end=2024-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Total WETH: 0.50 ($1,000.00)"));

        let (status, body) = get_page(app(&dir), "/balance").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Unbacked WETH from the Hack: 1.50"));
    }

    #[tokio::test]
    async fn test_missing_export_is_503() {
        let dir = TempDir::new().unwrap();

        let (status, body) = get_page(app(&dir), "/axs").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("treasury-scripts --export"));
    }

    #[tokio::test]
    async fn test_bad_date_is_400() {
        let dir = TempDir::new().unwrap();
        write_data(&dir);

        let (status, _) = get_page(app(&dir), "/weth?start=yesterday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
