use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A driver/vehicle pairing over a time window. An open assignment has no
/// end time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "driverId")]
    pub driver_id: i64,
    #[serde(rename = "vehicleId")]
    pub vehicle_id: i64,
    #[serde(rename = "startTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "endTime")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let json = r#"{
            "id": 5,
            "driverId": 3,
            "vehicleId": 12,
            "startTime": "2026-03-01T08:00:00Z",
            "endTime": null
        }"#;

        let assignment: Assignment = serde_json::from_str(json).unwrap();
        assert_eq!(assignment.driver_id, 3);
        assert_eq!(assignment.vehicle_id, 12);
        assert!(assignment.is_open());
    }
}
