use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use climate_dash::core::{ClimateSeries, DataOrigin, RawData};
use climate_dash::server::{router, AppState};
use climate_dash::sources::{noaa, study};
use std::sync::Arc;
use tower::ServiceExt;

fn raw() -> RawData {
    RawData {
        climate: ClimateSeries {
            points: noaa::fallback_series(Some(5)),
            origin: DataOrigin::Fallback {
                reason: "offline".to_string(),
            },
        },
        study: study::synthetic_dataset().unwrap(),
    }
}

fn app() -> axum::Router {
    router(Arc::new(AppState::new(raw(), "/nonexistent/Pretendard-Bold.ttf")))
}

async fn get(uri: &str) -> (StatusCode, Option<String>, String) {
    get_from(app(), uri).await
}

async fn get_from(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn test_dashboard_page_renders() {
    let (status, content_type, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.contains("<svg"));
    assert!(body.contains("NOAA API 호출 실패"));
}

#[tokio::test]
async fn test_dashboard_applies_query_options() {
    let (status, _, body) = get("/?study_start=2005-01-01&study_end=2010-01-01&window=2&standardize=on").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("window=2"));
}

#[tokio::test]
async fn test_bad_window_is_rejected() {
    let (status, _, _) = get("/?window=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = get("/?noaa_start=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_filtered_csv() {
    let (status, content_type, body) =
        get("/download/user_data.csv?study_start=2010-01-01&study_end=2012-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/csv"));
    assert_eq!(body.lines().count(), 4);
    assert!(body.starts_with("date,summer_avg_temp_C,math_score\n2010-01-01,"));
}

#[tokio::test]
async fn test_unknown_download_is_not_found() {
    let (status, _, _) = get("/download/secrets.csv").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_font_is_not_found() {
    let (status, _, _) = get("/fonts/Pretendard.ttf").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_row_counts() {
    let (status, _, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["climate_rows"], 240);
    assert_eq!(json["study_rows"], 21);
    assert_eq!(json["climate_fallback"], true);
}

#[tokio::test]
async fn test_reversed_range_is_swapped() {
    let (status, _, body) =
        get("/download/user_data.csv?study_start=2012-01-01&study_end=2010-01-01").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.lines().count(), 4);
    assert!(body.lines().nth(1).unwrap().starts_with("2010-01-01,"));
    assert!(body.lines().nth(3).unwrap().starts_with("2012-01-01,"));
}

#[tokio::test]
async fn test_font_served_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let font = dir.path().join("Pretendard-Bold.ttf");
    std::fs::write(&font, b"ttf-bytes").unwrap();

    let app = router(Arc::new(AppState::new(raw(), font.to_str().unwrap())));
    let (status, content_type, body) = get_from(app.clone(), "/fonts/Pretendard.ttf").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("font/ttf"));
    assert_eq!(body, "ttf-bytes");

    let (_, _, page) = get_from(app, "/").await;
    assert!(page.contains("url('/fonts/Pretendard.ttf')"));
}
