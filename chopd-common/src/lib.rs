//! # chopd Common Library
//!
//! Shared code for the chopd appearance-scoring backend:
//! - Score normalization (raw model output -> well-formed result)
//! - Subscription tier policy (limits and feature flags)
//! - Per-user quota ledger with monthly rollover
//! - Configuration loading
//! - Common error types

pub mod analysis;
pub mod config;
pub mod error;
pub mod quota;
pub mod tiers;

pub use error::{Error, Result};
pub use tiers::Tier;
