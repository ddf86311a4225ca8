//! User status and upgrade endpoints
//!
//! The upgrade endpoint is a stub: it flips the subscription flag and
//! stamps a 30-day validity window. Real payment processing happens
//! elsewhere (or not at all).

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chopd_common::quota::UsageSnapshot;
use chopd_common::tiers::{Tier, TierFeatures};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ApiResult, AppState};

/// Subscription validity window as shown to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionData {
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub plan: Tier,
}

/// Per-request limits shown alongside usage (the monthly cap lives in
/// the usage block)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLimits {
    pub max_images_per_analysis: u32,
    #[serde(rename = "maxImageSizeMB")]
    pub max_image_size_mb: u64,
}

/// Response for GET /user/:id/status
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    pub user_id: String,
    pub subscription: Tier,
    pub subscription_data: SubscriptionData,
    pub usage: UsageSnapshot,
    pub limits: StatusLimits,
    pub features: TierFeatures,
}

/// GET /user/:id/status
///
/// Reports subscription, usage (post-rollover), limits, and feature
/// flags. First reference to an unknown user creates a fresh free-tier
/// record.
pub async fn user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserStatusResponse>> {
    let now = Utc::now();
    let entry = state.ledger.get_or_create(&user_id, now).await;
    let mut record = entry.lock().await;

    let usage = record.usage_snapshot(now);
    let limits = record.tier.limits();

    Ok(Json(UserStatusResponse {
        user_id: record.user_id.clone(),
        subscription: record.tier,
        subscription_data: SubscriptionData {
            start_date: record.tier_start,
            end_date: record.tier_end,
            plan: record.tier,
        },
        usage,
        limits: StatusLimits {
            max_images_per_analysis: limits.max_images_per_analysis,
            max_image_size_mb: limits.max_image_size_mb,
        },
        features: record.tier.features(),
    }))
}

/// Request payload for POST /user/:id/upgrade
#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    /// Plan to switch to; defaults to "premium". Unknown plan names
    /// fail safe to the free tier.
    #[serde(default)]
    pub plan: Option<String>,
}

/// Response for POST /user/:id/upgrade
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeResponse {
    pub success: bool,
    pub message: String,
    pub subscription: Tier,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /user/:id/upgrade
///
/// **Request:** `{"plan": "premium"}` (plan optional)
/// **Response:** `{"success": true, "message": "...", ...}`
pub async fn upgrade_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpgradeRequest>,
) -> ApiResult<Json<UpgradeResponse>> {
    let tier = Tier::parse(payload.plan.as_deref().unwrap_or("premium"));
    let now = Utc::now();

    let entry = state.ledger.get_or_create(&user_id, now).await;
    let mut record = entry.lock().await;
    record.upgrade(tier, now);

    info!(user = %user_id, tier = %tier, "Subscription changed");

    let message = match tier {
        Tier::Premium => "Successfully upgraded to premium!".to_string(),
        Tier::Free => "Switched to the free plan.".to_string(),
    };

    Ok(Json(UpgradeResponse {
        success: true,
        message,
        subscription: record.tier,
        expires_at: record.tier_end,
    }))
}

/// Build user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/:id/status", get(user_status))
        .route("/user/:id/upgrade", post(upgrade_user))
}
