//! HTTP API handlers for chopd-api

pub mod analyze;
pub mod health;
pub mod plans;
pub mod users;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use plans::plan_routes;
pub use users::user_routes;
