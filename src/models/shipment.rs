use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub description: Option<String>,
    pub origin: String,
    pub destination: String,
    /// Lifecycle status string owned by the server (e.g. "PLANNED",
    /// "IN_TRANSIT", "DELIVERED"); the client does not enforce transitions
    pub status: Option<String>,
    #[serde(rename = "plannedPickup")]
    pub planned_pickup: Option<DateTime<Utc>>,
    #[serde(rename = "plannedDelivery")]
    pub planned_delivery: Option<DateTime<Utc>>,
    #[serde(rename = "assignedVehicleId")]
    pub assigned_vehicle_id: Option<i64>,
}

impl Shipment {
    pub fn route_display(&self) -> String {
        format!("{} -> {}", self.origin, self.destination)
    }

    pub fn status_display(&self) -> &str {
        self.status.as_deref().unwrap_or("UNKNOWN")
    }
}
