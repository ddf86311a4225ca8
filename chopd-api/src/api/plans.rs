//! Plan catalog endpoint

use axum::{routing::get, Json, Router};
use chopd_common::tiers::{self, PlanCatalog};
use serde::Serialize;

use crate::AppState;

/// Response for GET /plans
#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub plans: PlanCatalog,
}

/// GET /plans
///
/// Static catalog of the free and premium plans: pricing, limits, and
/// feature flags for the upgrade screen.
pub async fn get_plans() -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: tiers::plans(),
    })
}

/// Build plan routes
pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/plans", get(get_plans))
}
