//! Typed resource calls for the console screens.
//!
//! Thin wrappers over the dispatcher: each screen talks to exactly one of
//! these, and all auth/refresh behavior comes for free from `send`.
//! Business rules (service intervals, shipment lifecycle, analytics) live
//! server-side; responses are consumed as data.

use crate::models::{Assignment, Driver, Shipment, Vehicle};

use super::{ApiClient, ApiError};

impl ApiClient {
    // ===== Vehicles =====

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>, ApiError> {
        self.get_json("/api/vehicles").await
    }

    pub async fn get_vehicle(&self, id: i64) -> Result<Vehicle, ApiError> {
        self.get_json(&format!("/api/vehicles/{id}")).await
    }

    pub async fn create_vehicle(&self, vehicle: &Vehicle) -> Result<Vehicle, ApiError> {
        self.post_json("/api/vehicles", vehicle).await
    }

    pub async fn update_vehicle(&self, id: i64, vehicle: &Vehicle) -> Result<Vehicle, ApiError> {
        self.put_json(&format!("/api/vehicles/{id}"), vehicle).await
    }

    pub async fn delete_vehicle(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/vehicles/{id}")).await
    }

    // ===== Drivers =====

    pub async fn list_drivers(&self) -> Result<Vec<Driver>, ApiError> {
        self.get_json("/api/drivers").await
    }

    pub async fn get_driver(&self, id: i64) -> Result<Driver, ApiError> {
        self.get_json(&format!("/api/drivers/{id}")).await
    }

    pub async fn create_driver(&self, driver: &Driver) -> Result<Driver, ApiError> {
        self.post_json("/api/drivers", driver).await
    }

    pub async fn update_driver(&self, id: i64, driver: &Driver) -> Result<Driver, ApiError> {
        self.put_json(&format!("/api/drivers/{id}"), driver).await
    }

    pub async fn delete_driver(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/drivers/{id}")).await
    }

    // ===== Shipments =====

    pub async fn list_shipments(&self) -> Result<Vec<Shipment>, ApiError> {
        self.get_json("/api/shipments").await
    }

    pub async fn get_shipment(&self, id: i64) -> Result<Shipment, ApiError> {
        self.get_json(&format!("/api/shipments/{id}")).await
    }

    pub async fn create_shipment(&self, shipment: &Shipment) -> Result<Shipment, ApiError> {
        self.post_json("/api/shipments", shipment).await
    }

    pub async fn update_shipment(&self, id: i64, shipment: &Shipment) -> Result<Shipment, ApiError> {
        self.put_json(&format!("/api/shipments/{id}"), shipment)
            .await
    }

    pub async fn delete_shipment(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/shipments/{id}")).await
    }

    // ===== Driver/vehicle assignments =====

    pub async fn list_assignments(&self) -> Result<Vec<Assignment>, ApiError> {
        self.get_json("/api/assignments").await
    }

    pub async fn assignments_for_driver(&self, driver_id: i64) -> Result<Vec<Assignment>, ApiError> {
        self.get_json(&format!("/api/drivers/{driver_id}/assignments"))
            .await
    }

    pub async fn create_assignment(&self, assignment: &Assignment) -> Result<Assignment, ApiError> {
        self.post_json("/api/assignments", assignment).await
    }

    pub async fn delete_assignment(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/assignments/{id}")).await
    }
}
