//! Data models for fleet entities.
//!
//! Wire representations of what the console manages:
//!
//! - `Vehicle`: the fleet roster
//! - `Driver`: personnel with license info
//! - `Shipment`: transport jobs with origin/destination
//! - `Assignment`: driver/vehicle pairings over a time window
//!
//! Field names follow the backend's camelCase JSON. Status strings and
//! service-interval fields are opaque server-computed values.

pub mod assignment;
pub mod driver;
pub mod shipment;
pub mod vehicle;

pub use assignment::Assignment;
pub use driver::Driver;
pub use shipment::Shipment;
pub use vehicle::Vehicle;
