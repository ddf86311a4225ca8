//! Photo analysis endpoint
//!
//! Pipeline: read the multipart upload, check admission against the
//! user's quota record, record usage, send the photos to the vision
//! model (or fall back to the mock generator), normalize whatever comes
//! back, and attach subscription context to the response.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use chopd_common::analysis::{normalize, AnalysisResult};
use chopd_common::quota::UsageSnapshot;
use chopd_common::tiers::Tier;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::{mock_analysis, premium_insights, Photo, PremiumInsights};
use crate::{ApiError, ApiResult, AppState};

/// Response for POST /analyze
///
/// The normalized analysis flattened together with subscription context;
/// `premiumInsights` appears only for tiers with detailed suggestions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub subscription: Tier,
    pub usage: UsageSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_insights: Option<PremiumInsights>,
}

/// Fields collected from the multipart upload
#[derive(Default)]
struct UploadForm {
    photos: Vec<Photo>,
    user_id: Option<String>,
}

/// POST /analyze
///
/// Multipart form: repeated `photos` file parts, a `userId` text part,
/// and an optional `photoTypes` part (currently informational only).
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<AnalyzeResponse>> {
    let request_id = Uuid::new_v4();
    let form = read_upload(multipart).await?;

    let user_id = form
        .user_id
        .ok_or_else(|| ApiError::BadRequest("Missing userId field".to_string()))?;
    let photos = form.photos;

    let now = Utc::now();
    let sizes: Vec<u64> = photos.iter().map(|p| p.data.len() as u64).collect();

    // Admission and usage recording happen under the per-user lock so
    // concurrent requests for one user cannot overshoot the monthly cap
    let entry = state.ledger.get_or_create(&user_id, now).await;
    let (tier, usage) = {
        let mut record = entry.lock().await;
        record.can_admit(photos.len() as u32, &sizes, now)?;
        record.record_usage(now);
        (record.tier, record.usage_snapshot(now))
    };

    info!(
        %request_id,
        user = %user_id,
        tier = %tier,
        photos = photos.len(),
        "Analyzing photos"
    );

    // Quota is spent at this point; an upstream failure degrades to the
    // mock generator rather than surfacing an error
    let raw = if state.vision.is_configured() {
        match state.vision.request_analysis(&photos).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%request_id, error = %e, "Vision API failed, using mock analysis");
                *state.last_error.write().await = Some(e.to_string());
                mock_analysis(photos.len())
            }
        }
    } else {
        mock_analysis(photos.len())
    };

    let analysis = normalize(&raw);
    let premium_insights = tier
        .features()
        .detailed_suggestions
        .then(premium_insights);

    info!(%request_id, score = analysis.score, "Analysis complete");

    Ok(Json(AnalyzeResponse {
        analysis,
        subscription: tier,
        usage,
        premium_insights,
    }))
}

/// Drain the multipart stream into an [`UploadForm`]
///
/// Every `photos` part must sniff as an image; unknown parts are
/// ignored.
async fn read_upload(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("photos") => {
                let filename = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read photo: {}", e)))?;

                if !infer::is_image(&data) {
                    return Err(ApiError::BadRequest(
                        "Only image files are allowed".to_string(),
                    ));
                }

                form.photos.push(Photo {
                    data: data.to_vec(),
                    filename,
                });
            }
            Some("userId") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read userId: {}", e)))?;
                let value = value.trim().to_string();
                if !value.is_empty() {
                    form.user_id = Some(value);
                }
            }
            // photoTypes and anything else the client sends along
            _ => {}
        }
    }

    Ok(form)
}

/// Build analyze routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}
