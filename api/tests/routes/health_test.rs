use crate::helpers::make_test_app;
use axum::http::StatusCode;

#[tokio::test]
async fn health_check_reports_live_sessions() {
    let app = make_test_app().await;

    let (status, json) = app.request("GET", "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "OK");
    assert_eq!(json["data"]["live_sessions"], 0);
    assert_eq!(json["message"], "Health check passed");
}
