//! Service modules for the analysis pipeline

pub mod insights;
pub mod vision;

pub use insights::{premium_insights, PremiumInsights};
pub use vision::{mock_analysis, Photo, VisionClient, VisionError};
