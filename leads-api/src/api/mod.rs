//! HTTP API handlers for leads-api

pub mod bulk;
pub mod gender;
pub mod health;
pub mod import;
pub mod lead_ids;
pub mod leads;
pub mod messages;
pub mod reports;

pub use bulk::bulk_routes;
pub use gender::gender_routes;
pub use health::health_routes;
pub use import::import_routes;
pub use leads::lead_routes;
pub use messages::message_routes;
pub use reports::report_routes;
