//! Subscription tier policy: limits and feature flags per tier
//!
//! Pure lookup, no state. Unknown tier names parse as `Free` so a
//! corrupt or out-of-date tier value can only ever reduce entitlements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    /// Parse a tier name; anything unrecognized is treated as `Free`
    pub fn parse(name: &str) -> Tier {
        match name.trim().to_ascii_lowercase().as_str() {
            "premium" => Tier::Premium,
            _ => Tier::Free,
        }
    }

    /// Wire name of the tier
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
        }
    }

    /// Per-request and monthly limits for this tier
    pub fn limits(self) -> TierLimits {
        match self {
            Tier::Free => TierLimits {
                max_images_per_analysis: 2,
                max_analyses_per_month: 3,
                max_image_size_mb: 5,
            },
            Tier::Premium => TierLimits {
                max_images_per_analysis: 4,
                max_analyses_per_month: 50,
                max_image_size_mb: 10,
            },
        }
    }

    /// Feature flags for this tier
    pub fn features(self) -> TierFeatures {
        let premium = self == Tier::Premium;
        TierFeatures {
            basic_analysis: true,
            detailed_suggestions: premium,
            progress_tracking: premium,
            export_results: premium,
            priority_processing: premium,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric limits attached to a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierLimits {
    pub max_images_per_analysis: u32,
    pub max_analyses_per_month: u32,
    #[serde(rename = "maxImageSizeMB")]
    pub max_image_size_mb: u64,
}

impl TierLimits {
    /// Per-image size ceiling in bytes (MB x 1024 x 1024)
    pub fn max_image_size_bytes(&self) -> u64 {
        self.max_image_size_mb * 1024 * 1024
    }
}

/// Feature flags attached to a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFeatures {
    pub basic_analysis: bool,
    pub detailed_suggestions: bool,
    pub progress_tracking: bool,
    pub export_results: bool,
    pub priority_processing: bool,
}

/// A purchasable plan as shown on the upgrade screen
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: &'static str,
    pub price: f64,
    pub features: TierFeatures,
    pub limits: TierLimits,
}

/// The plan catalog served by `GET /plans`
#[derive(Debug, Clone, Serialize)]
pub struct PlanCatalog {
    pub free: Plan,
    pub premium: Plan,
}

/// Build the static plan catalog
pub fn plans() -> PlanCatalog {
    PlanCatalog {
        free: Plan {
            name: "Free",
            price: 0.0,
            features: Tier::Free.features(),
            limits: Tier::Free.limits(),
        },
        premium: Plan {
            name: "Premium",
            price: 9.99,
            features: Tier::Premium.features(),
            limits: Tier::Premium.limits(),
        },
    }
}
