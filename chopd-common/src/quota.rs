//! Per-user quota ledger with monthly rollover
//!
//! One [`UserQuotaRecord`] per user, created lazily on first reference
//! and kept for the life of the process. Each record sits behind its own
//! `tokio::sync::Mutex`, so a handler can hold the lock across the
//! admission check and the usage increment and two concurrent requests
//! for the same user can never both slip past the monthly cap. Requests
//! for different users share nothing but the outer map.
//!
//! Rollover is evaluated against the caller-supplied `now` before any
//! read of `analyses_this_month`, so a request made in a new month never
//! sees stale exhaustion from the previous month.

use crate::tiers::Tier;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Minimum photos per analysis, independent of tier
pub const MIN_IMAGES_PER_ANALYSIS: u32 = 2;

/// Length of the stub premium term granted by the upgrade endpoint
pub const PREMIUM_TERM_DAYS: i64 = 30;

/// Why an analysis request was refused admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    TooFewImages,
    TooManyImages,
    FileTooLarge,
    QuotaExhausted,
}

impl DenialReason {
    /// Structured reason code sent to the client
    pub fn code(self) -> &'static str {
        match self {
            DenialReason::TooFewImages => "TOO_FEW_IMAGES",
            DenialReason::TooManyImages => "TOO_MANY_IMAGES",
            DenialReason::FileTooLarge => "FILE_TOO_LARGE",
            DenialReason::QuotaExhausted => "QUOTA_EXHAUSTED",
        }
    }
}

/// A refused admission: reason code, human-readable message, and whether
/// upgrading the subscription would lift the limit that was hit
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AdmissionDenial {
    pub reason: DenialReason,
    pub message: String,
    pub upgrade_required: bool,
}

/// Usage numbers reported to the client, post-rollover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub analyses_this_month: u32,
    pub max_analyses_per_month: u32,
    pub remaining_analyses: u32,
}

/// Per-user entitlement state
#[derive(Debug, Clone)]
pub struct UserQuotaRecord {
    pub user_id: String,
    pub tier: Tier,
    pub analyses_this_month: u32,
    /// Timestamp of the last recorded analysis; drives month rollover
    pub last_analysis: Option<DateTime<Utc>>,
    pub tier_start: DateTime<Utc>,
    /// Expiry of the current tier; `None` for the free tier
    pub tier_end: Option<DateTime<Utc>>,
}

impl UserQuotaRecord {
    /// Fresh free-tier record with zero usage
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            tier: Tier::Free,
            analyses_this_month: 0,
            last_analysis: None,
            tier_start: now,
            tier_end: None,
        }
    }

    /// Reset the monthly counter when `now` falls in a different
    /// (month, year) than the last recorded analysis
    pub fn rollover_if_new_month(&mut self, now: DateTime<Utc>) {
        let stale = match self.last_analysis {
            None => self.analyses_this_month > 0,
            Some(last) => last.month() != now.month() || last.year() != now.year(),
        };
        if stale && self.analyses_this_month > 0 {
            tracing::debug!(
                user = %self.user_id,
                previous = self.analyses_this_month,
                "Monthly quota rollover"
            );
            self.analyses_this_month = 0;
        }
    }

    /// Decide whether a new analysis request may proceed
    ///
    /// Applies rollover first, then checks image count, per-file size,
    /// and the monthly cap, in that order. `file_sizes` are byte counts.
    pub fn can_admit(
        &mut self,
        image_count: u32,
        file_sizes: &[u64],
        now: DateTime<Utc>,
    ) -> Result<(), AdmissionDenial> {
        self.rollover_if_new_month(now);

        let limits = self.tier.limits();
        let upgrade_required = self.tier != Tier::Premium;

        if image_count > limits.max_images_per_analysis {
            return Err(AdmissionDenial {
                reason: DenialReason::TooManyImages,
                message: format!(
                    "Maximum {} photos allowed on the {} plan",
                    limits.max_images_per_analysis, self.tier
                ),
                upgrade_required,
            });
        }

        if image_count < MIN_IMAGES_PER_ANALYSIS {
            return Err(AdmissionDenial {
                reason: DenialReason::TooFewImages,
                message: format!(
                    "At least {} photos are required for analysis",
                    MIN_IMAGES_PER_ANALYSIS
                ),
                upgrade_required,
            });
        }

        let max_bytes = limits.max_image_size_bytes();
        if file_sizes.iter().any(|size| *size > max_bytes) {
            return Err(AdmissionDenial {
                reason: DenialReason::FileTooLarge,
                message: format!("Each photo must be {}MB or smaller", limits.max_image_size_mb),
                upgrade_required,
            });
        }

        if self.analyses_this_month >= limits.max_analyses_per_month {
            return Err(AdmissionDenial {
                reason: DenialReason::QuotaExhausted,
                message: format!(
                    "Monthly analysis limit reached ({} per month)",
                    limits.max_analyses_per_month
                ),
                upgrade_required,
            });
        }

        Ok(())
    }

    /// Count one admitted analysis
    ///
    /// Caller contract: exactly once per successful [`can_admit`], while
    /// still holding this record's lock.
    pub fn record_usage(&mut self, now: DateTime<Utc>) {
        self.rollover_if_new_month(now);
        self.analyses_this_month += 1;
        self.last_analysis = Some(now);
    }

    /// Switch tiers; premium gets a 30-day validity window
    ///
    /// Idempotent: repeated upgrades to the current tier leave the
    /// validity window untouched.
    pub fn upgrade(&mut self, tier: Tier, now: DateTime<Utc>) {
        if self.tier == tier {
            return;
        }
        self.tier = tier;
        self.tier_start = now;
        self.tier_end = match tier {
            Tier::Premium => Some(now + Duration::days(PREMIUM_TERM_DAYS)),
            Tier::Free => None,
        };
    }

    /// Post-rollover usage numbers for the status endpoint
    pub fn usage_snapshot(&mut self, now: DateTime<Utc>) -> UsageSnapshot {
        self.rollover_if_new_month(now);
        let max = self.tier.limits().max_analyses_per_month;
        UsageSnapshot {
            analyses_this_month: self.analyses_this_month,
            max_analyses_per_month: max,
            remaining_analyses: max.saturating_sub(self.analyses_this_month),
        }
    }
}

/// Process-wide map of user quota records
///
/// Owned by the application state and injected into request handlers;
/// never referenced as a global. A persistent store could replace the
/// inner map without touching the record semantics.
#[derive(Debug, Default)]
pub struct QuotaLedger {
    users: RwLock<HashMap<String, Arc<Mutex<UserQuotaRecord>>>>,
}

impl QuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the record handle for a user, creating a fresh free-tier
    /// record on first reference
    pub async fn get_or_create(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Arc<Mutex<UserQuotaRecord>> {
        if let Some(record) = self.users.read().await.get(user_id) {
            return Arc::clone(record);
        }

        let mut users = self.users.write().await;
        // Re-check: another task may have inserted between the locks
        Arc::clone(
            users
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(UserQuotaRecord::new(user_id, now)))),
        )
    }

    /// Number of users seen so far
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}
