//! Integration tests for chopd-api endpoints
//!
//! The test app has no vision API key configured, so every analysis
//! takes the mock fallback path; the normalizer still guarantees a
//! well-formed result, which is what these tests assert.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::util::ServiceExt;

use chopd_api::services::VisionClient;
use chopd_api::{build_router, AppState};
use chopd_common::config::ServiceConfig;

const BOUNDARY: &str = "chopd-test-boundary";

/// Test helper: create test app with mock-only vision client
fn create_test_app() -> axum::Router {
    let config = ServiceConfig::default();
    let vision = VisionClient::new(&config).expect("Failed to create vision client");
    let state = AppState::new(config, vision);
    build_router(state)
}

/// Test helper: minimal PNG-sniffing bytes padded to the requested size
fn png_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.resize(len.max(8), 0);
    data
}

/// Test helper: build a multipart /analyze body
fn multipart_body(user_id: Option<&str>, photos: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, photo) in photos.iter().enumerate() {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photos\"; \
                 filename=\"photo{i}.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(photo);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(id) = user_id {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"userId\"\r\n\r\n{id}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_analyze(
    app: &axum::Router,
    user_id: Option<&str>,
    photos: &[Vec<u8>],
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/analyze")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(user_id, photos)))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, value)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, value)
}

async fn post_upgrade(
    app: &axum::Router,
    user_id: &str,
    plan: &str,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/user/{user_id}/upgrade"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "plan": plan }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();
    let (status, json) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "chopd-api");
    assert!(json["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_plans_endpoint() {
    let app = create_test_app();
    let (status, json) = get_json(&app, "/plans").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["plans"]["free"]["name"], "Free");
    assert_eq!(json["plans"]["free"]["price"], 0.0);
    assert_eq!(json["plans"]["free"]["limits"]["maxImagesPerAnalysis"], 2);
    assert_eq!(json["plans"]["free"]["limits"]["maxAnalysesPerMonth"], 3);
    assert_eq!(json["plans"]["free"]["limits"]["maxImageSizeMB"], 5);
    assert_eq!(json["plans"]["premium"]["price"], 9.99);
    assert_eq!(json["plans"]["premium"]["limits"]["maxAnalysesPerMonth"], 50);
    assert_eq!(
        json["plans"]["premium"]["features"]["priorityProcessing"],
        true
    );
}

#[tokio::test]
async fn test_status_creates_free_tier_record() {
    let app = create_test_app();
    let (status, json) = get_json(&app, "/user/user-abc/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["userId"], "user-abc");
    assert_eq!(json["subscription"], "free");
    assert_eq!(json["subscriptionData"]["plan"], "free");
    assert!(json["subscriptionData"]["endDate"].is_null());
    assert_eq!(json["usage"]["analysesThisMonth"], 0);
    assert_eq!(json["usage"]["maxAnalysesPerMonth"], 3);
    assert_eq!(json["usage"]["remainingAnalyses"], 3);
    assert_eq!(json["limits"]["maxImagesPerAnalysis"], 2);
    assert_eq!(json["limits"]["maxImageSizeMB"], 5);
    assert_eq!(json["features"]["basicAnalysis"], true);
    assert_eq!(json["features"]["detailedSuggestions"], false);
}

#[tokio::test]
async fn test_upgrade_flips_tier_and_stamps_expiry() {
    let app = create_test_app();

    let (status, json) = post_upgrade(&app, "user-up", "premium").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["subscription"], "premium");
    assert!(json["expiresAt"].is_string());

    let (_, json) = get_json(&app, "/user/user-up/status").await;
    assert_eq!(json["subscription"], "premium");
    assert!(json["subscriptionData"]["endDate"].is_string());
    assert_eq!(json["usage"]["maxAnalysesPerMonth"], 50);
    assert_eq!(json["limits"]["maxImagesPerAnalysis"], 4);
    assert_eq!(json["features"]["detailedSuggestions"], true);
}

#[tokio::test]
async fn test_unknown_plan_fails_safe_to_free() {
    let app = create_test_app();

    let (status, json) = post_upgrade(&app, "user-gold", "gold").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["subscription"], "free");
    assert!(json["expiresAt"].is_null());
}

#[tokio::test]
async fn test_analyze_requires_user_id() {
    let app = create_test_app();
    let photos = vec![png_bytes(1024), png_bytes(1024)];

    let (status, json) = post_analyze(&app, None, &photos).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_analyze_rejects_single_photo() {
    let app = create_test_app();
    let photos = vec![png_bytes(1024)];

    let (status, json) = post_analyze(&app, Some("user-1"), &photos).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "TOO_FEW_IMAGES");
    assert_eq!(json["error"]["upgradeRequired"], true);
}

#[tokio::test]
async fn test_analyze_rejects_three_photos_on_free_tier() {
    let app = create_test_app();
    let photos = vec![png_bytes(1024), png_bytes(1024), png_bytes(1024)];

    let (status, json) = post_analyze(&app, Some("user-1"), &photos).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "TOO_MANY_IMAGES");
    assert_eq!(json["error"]["upgradeRequired"], true);
}

#[tokio::test]
async fn test_analyze_rejects_oversized_photo() {
    let app = create_test_app();
    // Free tier caps each photo at 5MB
    let photos = vec![png_bytes(5 * 1024 * 1024 + 1), png_bytes(1024)];

    let (status, json) = post_analyze(&app, Some("user-1"), &photos).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"]["code"], "FILE_TOO_LARGE");
    assert_eq!(json["error"]["upgradeRequired"], true);
}

#[tokio::test]
async fn test_analyze_rejects_non_image_part() {
    let app = create_test_app();
    let photos = vec![b"plain text pretending to be a photo".to_vec(), png_bytes(1024)];

    let (status, json) = post_analyze(&app, Some("user-1"), &photos).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_analyze_happy_path_is_well_formed() {
    let app = create_test_app();
    let photos = vec![png_bytes(2048), png_bytes(2048)];

    let (status, json) = post_analyze(&app, Some("user-ok"), &photos).await;
    assert_eq!(status, StatusCode::OK);

    let score = json["score"].as_u64().unwrap();
    assert!(score <= 100);

    // Breakdown stays in band and sums to the score exactly
    let breakdown = &json["breakdown"];
    let face = breakdown["face"].as_u64().unwrap();
    let hair = breakdown["hair"].as_u64().unwrap();
    let skin = breakdown["skin"].as_u64().unwrap();
    let style = breakdown["style"].as_u64().unwrap();
    let body = breakdown["body"].as_u64().unwrap();
    assert!(face <= 25 && hair <= 25);
    assert!(skin <= 20 && style <= 20 && body <= 20);
    assert_eq!(face + hair + skin + style + body, score);

    for category in ["face", "hair", "skin", "style", "body"] {
        assert!(!json["suggestions"][category].as_str().unwrap().is_empty());
    }

    assert_eq!(json["subscription"], "free");
    assert_eq!(json["usage"]["analysesThisMonth"], 1);
    assert_eq!(json["usage"]["remainingAnalyses"], 2);
    // Free tier gets no premium insights
    assert!(json.get("premiumInsights").is_none());
}

#[tokio::test]
async fn test_quota_exhaustion_after_three_free_analyses() {
    let app = create_test_app();
    let photos = vec![png_bytes(1024), png_bytes(1024)];

    for used in 1..=3u64 {
        let (status, json) = post_analyze(&app, Some("user-quota"), &photos).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["usage"]["analysesThisMonth"], used);
        assert_eq!(json["usage"]["remainingAnalyses"], 3 - used);
    }

    let (status, json) = post_analyze(&app, Some("user-quota"), &photos).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "QUOTA_EXHAUSTED");
    assert_eq!(json["error"]["upgradeRequired"], true);

    // Other users are unaffected
    let (status, _) = post_analyze(&app, Some("user-other"), &photos).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_premium_analyze_gets_insights_and_wider_limits() {
    let app = create_test_app();
    let (status, _) = post_upgrade(&app, "user-vip", "premium").await;
    assert_eq!(status, StatusCode::OK);

    // Four photos are allowed on premium
    let photos = vec![
        png_bytes(1024),
        png_bytes(1024),
        png_bytes(1024),
        png_bytes(1024),
    ];
    let (status, json) = post_analyze(&app, Some("user-vip"), &photos).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["subscription"], "premium");
    assert_eq!(json["usage"]["maxAnalysesPerMonth"], 50);
    assert!(json["premiumInsights"]["productRecommendations"].is_array());
    assert!(json["premiumInsights"]["improvementTimeline"].is_string());

    // Five photos exceed even the premium cap; no upgrade would help
    let five = vec![
        png_bytes(1024),
        png_bytes(1024),
        png_bytes(1024),
        png_bytes(1024),
        png_bytes(1024),
    ];
    let (status, json) = post_analyze(&app, Some("user-vip"), &five).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "TOO_MANY_IMAGES");
    assert_eq!(json["error"]["upgradeRequired"], false);
}
