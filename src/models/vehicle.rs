use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Absent when creating a new vehicle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "registrationNumber")]
    pub registration_number: String,
    pub model: Option<String>,
    #[serde(rename = "capacityKg")]
    pub capacity_kg: Option<f64>,
    #[serde(rename = "mileageKm")]
    pub mileage_km: Option<f64>,
    /// Computed server-side from the service interval
    #[serde(rename = "serviceDue", default)]
    pub service_due: Option<bool>,
}

impl Vehicle {
    pub fn display_name(&self) -> String {
        match self.model {
            Some(ref model) => format!("{} ({})", model, self.registration_number),
            None => self.registration_number.clone(),
        }
    }
}
