//! HTTP API handlers for mitti-scan

pub mod health;
pub mod last_known;
pub mod scans;

pub use health::health_routes;
pub use last_known::last_known_routes;
pub use scans::scan_routes;
