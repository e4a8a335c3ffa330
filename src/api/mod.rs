//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod wastages;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use wastages::configure_routes as configure_wastage_routes;
