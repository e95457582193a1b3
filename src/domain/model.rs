use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::endpoint::Endpoint;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Engine {
    #[serde(rename = "type")]
    pub engine_type: Option<String>,
    #[serde(rename = "powerInKW")]
    pub power_in_kw: Option<u32>,
    pub capacity_in_liters: Option<f64>,
}

impl Engine {
    pub const FIELDS: &'static [&'static str] = &["type", "powerInKW", "capacityInLiters"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExteriorDimensions {
    pub length_in_mm: Option<u32>,
    pub width_in_mm: Option<u32>,
    pub height_in_mm: Option<u32>,
}

impl ExteriorDimensions {
    pub const FIELDS: &'static [&'static str] = &["lengthInMm", "widthInMm", "heightInMm"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gearbox {
    #[serde(rename = "type")]
    pub gearbox_type: Option<String>,
}

impl Gearbox {
    pub const FIELDS: &'static [&'static str] = &["type"];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SteeringPosition {
    Left,
    Right,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Vehicle specification as returned inside the garage vehicle payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Specification {
    pub title: Option<String>,
    pub manufacturing_date: Option<NaiveDate>,
    pub model_year: Option<String>,
    pub body: Option<String>,
    pub trim_level: Option<String>,
    pub exterior_colour: Option<String>,
    pub system_code: Option<String>,
    pub system_model_id: Option<String>,
    pub engine: Engine,
    pub exterior_dimensions: ExteriorDimensions,
    pub gearbox: Gearbox,
    /// Not part of the garage payload; filled from `air-conditioning`.
    #[serde(skip_deserializing)]
    pub steering_wheel_position: SteeringPosition,
}

impl Specification {
    pub const FIELDS: &'static [&'static str] = &[
        "title",
        "manufacturingDate",
        "modelYear",
        "body",
        "trimLevel",
        "exteriorColour",
        "systemCode",
        "systemModelId",
        "engine",
        "exteriorDimensions",
        "gearbox",
        "battery",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServicePartner {
    pub service_partner_id: Option<String>,
}

impl ServicePartner {
    pub const FIELDS: &'static [&'static str] = &["servicePartnerId"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GarageVehicle {
    pub vin: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub system_model_id: Option<String>,
    pub priority: Option<String>,
    pub device_platform: Option<String>,
    pub state: Option<String>,
    pub workshop_mode_enabled: Option<bool>,
    pub specification: Specification,
    pub service_partner: Option<ServicePartner>,
    pub renders: Vec<Value>,
    pub composite_renders: Vec<Value>,
}

impl GarageVehicle {
    pub const FIELDS: &'static [&'static str] = &[
        "vin",
        "name",
        "title",
        "systemModelId",
        "priority",
        "devicePlatform",
        "state",
        "workshopModeEnabled",
        "specification",
        "servicePartner",
        "renders",
        "compositeRenders",
        "licensePlate",
        "errors",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Garage {
    pub vehicles: Vec<GarageVehicle>,
    pub errors: Vec<Value>,
}

/// Raw API responses collected for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub vin: String,
    pub captured_at: DateTime<Utc>,
    /// Endpoint name to response body.
    pub raw_api: BTreeMap<String, Value>,
    /// Endpoint name to error message.
    pub failures: BTreeMap<String, String>,
    /// Location to unknown keys found there.
    pub extras: BTreeMap<String, BTreeSet<String>>,
}

impl VehicleSnapshot {
    pub fn new(vin: impl Into<String>) -> Self {
        Self {
            vin: vin.into(),
            captured_at: Utc::now(),
            raw_api: BTreeMap::new(),
            failures: BTreeMap::new(),
            extras: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, endpoint: Endpoint, body: Value) {
        self.failures.remove(endpoint.name());
        self.raw_api.insert(endpoint.name().to_string(), body);
    }

    pub fn record_failure(&mut self, endpoint: Endpoint, message: impl Into<String>) {
        self.failures
            .insert(endpoint.name().to_string(), message.into());
    }

    pub fn record_extras(&mut self, location: impl Into<String>, keys: BTreeSet<String>) {
        if !keys.is_empty() {
            self.extras.entry(location.into()).or_default().extend(keys);
        }
    }

    pub fn get(&self, endpoint: Endpoint) -> Option<&Value> {
        self.raw_api.get(endpoint.name())
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Carries over responses from `previous` for endpoints that failed this
    /// time. The failures stay recorded.
    pub fn merge_previous(&mut self, previous: &VehicleSnapshot) {
        if previous.vin != self.vin {
            return;
        }
        for (name, body) in &previous.raw_api {
            if self.failures.contains_key(name) && !self.raw_api.contains_key(name) {
                self.raw_api.insert(name.clone(), body.clone());
            }
        }
    }

    /// Garage specification with the steering side merged in, if both are present.
    pub fn specification(&self) -> Option<Specification> {
        let vehicle: GarageVehicle =
            serde_json::from_value(self.get(Endpoint::GarageVehicle)?.clone()).ok()?;
        let mut specification = vehicle.specification;
        if let Some(position) = self
            .get(Endpoint::AirConditioning)
            .and_then(|ac| ac.get("steeringWheelPosition"))
            .and_then(|v| serde_json::from_value::<SteeringPosition>(v.clone()).ok())
        {
            specification.steering_wheel_position = position;
        }
        Some(specification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn garage_vehicle_json() -> Value {
        json!({
            "vin": "TMBJJ7NE0L0000001",
            "name": "Octavia",
            "title": "Škoda Octavia Combi",
            "systemModelId": "NJ5",
            "priority": "FIRST_CAR",
            "state": "ACTIVATED",
            "devicePlatform": "MBB",
            "workshopModeEnabled": false,
            "specification": {
                "title": "Škoda Octavia Combi",
                "manufacturingDate": "2020-03-17",
                "modelYear": "2020",
                "body": "Combi",
                "trimLevel": "Style",
                "exteriorColour": "Moon White",
                "systemCode": "SKODA_OCTAVIA",
                "systemModelId": "NJ5",
                "engine": {"type": "TDI", "powerInKW": 110, "capacityInLiters": 2.0},
                "exteriorDimensions": {"lengthInMm": 4689, "widthInMm": 1829, "heightInMm": 1468},
                "gearbox": {"type": "A7F"}
            },
            "servicePartner": {"servicePartnerId": "DEU1234"}
        })
    }

    #[test]
    fn test_garage_vehicle_deserializes() {
        let vehicle: GarageVehicle = serde_json::from_value(garage_vehicle_json()).unwrap();
        assert_eq!(vehicle.vin, "TMBJJ7NE0L0000001");
        assert_eq!(vehicle.workshop_mode_enabled, Some(false));
        let spec = &vehicle.specification;
        assert_eq!(spec.manufacturing_date, NaiveDate::from_ymd_opt(2020, 3, 17));
        assert_eq!(spec.engine.engine_type.as_deref(), Some("TDI"));
        assert_eq!(spec.engine.power_in_kw, Some(110));
        assert_eq!(spec.exterior_dimensions.length_in_mm, Some(4689));
        assert_eq!(spec.gearbox.gearbox_type.as_deref(), Some("A7F"));
        assert_eq!(
            vehicle.service_partner.unwrap().service_partner_id.as_deref(),
            Some("DEU1234")
        );
    }

    #[test]
    fn test_missing_nested_objects_default_to_empty() {
        let vehicle: GarageVehicle =
            serde_json::from_value(json!({"vin": "TMBJJ7NE0L0000001"})).unwrap();
        assert_eq!(vehicle.specification, Specification::default());
        assert!(vehicle.service_partner.is_none());
        assert!(vehicle.renders.is_empty());
    }

    #[test]
    fn test_steering_position_unknown_values() {
        let left: SteeringPosition = serde_json::from_value(json!("LEFT")).unwrap();
        let odd: SteeringPosition = serde_json::from_value(json!("CENTER")).unwrap();
        assert_eq!(left, SteeringPosition::Left);
        assert_eq!(odd, SteeringPosition::Unknown);
    }

    #[test]
    fn test_snapshot_specification_merges_steering() {
        let mut snapshot = VehicleSnapshot::new("TMBJJ7NE0L0000001");
        assert!(snapshot.specification().is_none());

        snapshot.record(Endpoint::GarageVehicle, garage_vehicle_json());
        snapshot.record(
            Endpoint::AirConditioning,
            json!({"state": "OFF", "steeringWheelPosition": "RIGHT"}),
        );
        let spec = snapshot.specification().unwrap();
        assert_eq!(spec.trim_level.as_deref(), Some("Style"));
        assert_eq!(spec.steering_wheel_position, SteeringPosition::Right);
    }

    #[test]
    fn test_merge_previous_keeps_known_data() {
        let mut previous = VehicleSnapshot::new("TMBJJ7NE0L0000001");
        previous.record(Endpoint::Charging, json!({"status": "old"}));
        previous.record(Endpoint::VehicleStatus, json!({"doors": "old"}));

        let mut current = VehicleSnapshot::new("TMBJJ7NE0L0000001");
        current.record(Endpoint::VehicleStatus, json!({"doors": "new"}));
        current.record_failure(Endpoint::Charging, "HTTP 500");
        current.merge_previous(&previous);

        assert_eq!(current.get(Endpoint::VehicleStatus).unwrap()["doors"], "new");
        assert_eq!(current.get(Endpoint::Charging).unwrap()["status"], "old");
        assert!(!current.is_complete());

        let other = VehicleSnapshot::new("TMBJJ7NE0L0000002");
        let mut untouched = other.clone();
        untouched.merge_previous(&previous);
        assert_eq!(untouched, other);
    }

    #[test]
    fn test_merge_previous_skips_endpoints_not_queried() {
        let mut previous = VehicleSnapshot::new("TMBJJ7NE0L0000001");
        previous.record(Endpoint::Positions, json!({"positions": []}));
        previous.record(Endpoint::Charging, json!({"status": "old"}));

        let mut current = VehicleSnapshot::new("TMBJJ7NE0L0000001");
        current.record(Endpoint::VehicleStatus, json!({"doors": "new"}));
        current.record_failure(Endpoint::Charging, "HTTP 500");
        current.merge_previous(&previous);

        assert!(current.get(Endpoint::Positions).is_none());
        assert_eq!(current.get(Endpoint::Charging).unwrap()["status"], "old");
        assert_eq!(current.raw_api.len(), 2);
    }
}
