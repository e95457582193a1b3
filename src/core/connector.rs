use crate::domain::endpoint::{Endpoint, HttpMethod};
use crate::domain::model::{
    Engine, ExteriorDimensions, Garage, GarageVehicle, Gearbox, ServicePartner, Specification,
    SteeringPosition, VehicleSnapshot,
};
use crate::domain::ports::{ApiRequest, ApiResponse, ApiTransport};
use crate::utils::error::{ConnectorError, Result};
use crate::utils::extra_keys::log_extra_keys;
use crate::utils::validation::{validate_range, validate_vin};
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

pub const MIN_CHARGE_LIMIT: u8 = 50;
pub const MAX_CHARGE_LIMIT: u8 = 100;
pub const MIN_TEMPERATURE_C: f64 = 16.0;
pub const MAX_TEMPERATURE_C: f64 = 29.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HonkMode {
    Flash,
    HonkAndFlash,
}

impl HonkMode {
    fn as_api_str(&self) -> &'static str {
        match self {
            Self::Flash => "FLASH",
            Self::HonkAndFlash => "HONK_AND_FLASH",
        }
    }
}

/// Read and command operations for vehicles on one account.
///
/// Commands are fire-and-forget: the vendor accepts them and executes them
/// asynchronously; the returned response only says the request was taken.
pub struct VehicleConnector<T: ApiTransport> {
    transport: T,
    show_extra_keys: bool,
}

impl<T: ApiTransport> VehicleConnector<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            show_extra_keys: false,
        }
    }

    /// Log unknown API fields at INFO instead of DEBUG.
    pub fn show_extra_keys(mut self, show: bool) -> Self {
        self.show_extra_keys = show;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Raw JSON of any readable endpoint.
    pub async fn fetch(&self, endpoint: Endpoint, vin: Option<&str>) -> Result<Value> {
        if endpoint.spec().method != HttpMethod::Get {
            return Err(ConnectorError::ValidationError {
                message: format!("{} is not a read endpoint", endpoint),
            });
        }
        let request = ApiRequest {
            endpoint,
            vin: vin.map(str::to_string),
            body: None,
        };
        Ok(self.transport.send(request).await?.into_json())
    }

    async fn fetch_vehicle(&self, endpoint: Endpoint, vin: &str) -> Result<Value> {
        self.fetch(endpoint, Some(vin)).await
    }

    pub async fn user(&self) -> Result<Value> {
        self.fetch(Endpoint::User, None).await
    }

    pub async fn garage(&self) -> Result<Garage> {
        let raw = self.fetch(Endpoint::Garage, None).await?;
        if let Some(vehicles) = raw.get("vehicles").and_then(Value::as_array) {
            for vehicle in vehicles.iter().filter_map(Value::as_object) {
                self.garage_vehicle_extras(vehicle);
            }
        }
        let garage: Garage = serde_json::from_value(raw)?;
        tracing::info!("Garage lists {} vehicle(s)", garage.vehicles.len());
        Ok(garage)
    }

    pub async fn vehicle(&self, vin: &str) -> Result<GarageVehicle> {
        let raw = self.fetch_vehicle(Endpoint::GarageVehicle, vin).await?;
        if let Some(object) = raw.as_object() {
            self.garage_vehicle_extras(object);
        }
        Ok(serde_json::from_value(raw)?)
    }

    pub async fn renders(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::Renders, vin).await
    }

    pub async fn equipment(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::Equipment, vin).await
    }

    pub async fn vehicle_status(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::VehicleStatus, vin).await
    }

    pub async fn driving_range(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::DrivingRange, vin).await
    }

    pub async fn connection_readiness(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::ConnectionReadiness, vin).await
    }

    pub async fn warning_lights(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::WarningLights, vin).await
    }

    pub async fn trip_statistics(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::TripStatistics, vin).await
    }

    pub async fn maintenance(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::Maintenance, vin).await
    }

    pub async fn maintenance_report(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::MaintenanceReport, vin).await
    }

    pub async fn positions(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::Positions, vin).await
    }

    pub async fn charging(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::Charging, vin).await
    }

    pub async fn charging_history(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::ChargingHistory, vin).await
    }

    pub async fn air_conditioning(&self, vin: &str) -> Result<Value> {
        self.fetch_vehicle(Endpoint::AirConditioning, vin).await
    }

    pub async fn steering_wheel_position(&self, vin: &str) -> Result<SteeringPosition> {
        let raw = self.air_conditioning(vin).await?;
        Ok(raw
            .get("steeringWheelPosition")
            .cloned()
            .map(serde_json::from_value::<SteeringPosition>)
            .transpose()?
            .unwrap_or_default())
    }

    /// Sends a vehicle command. Does not wait for the vehicle to execute it.
    pub async fn send_command(
        &self,
        endpoint: Endpoint,
        vin: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse> {
        if !endpoint.is_command() {
            return Err(ConnectorError::ValidationError {
                message: format!("{} is not a vehicle command", endpoint),
            });
        }
        validate_vin("vin", vin)?;

        let mut request = ApiRequest::for_vehicle(endpoint, vin);
        request.body = body;
        let response = self.transport.send(request).await?;
        tracing::info!(
            "Command {} accepted for {} (HTTP {})",
            endpoint,
            vin,
            response.status
        );
        Ok(response)
    }

    pub async fn lock(&self, vin: &str, spin: &str) -> Result<ApiResponse> {
        validate_spin(spin)?;
        self.send_command(Endpoint::Lock, vin, Some(json!({ "currentSpin": spin })))
            .await
    }

    pub async fn unlock(&self, vin: &str, spin: &str) -> Result<ApiResponse> {
        validate_spin(spin)?;
        self.send_command(Endpoint::Unlock, vin, Some(json!({ "currentSpin": spin })))
            .await
    }

    pub async fn honk_and_flash(
        &self,
        vin: &str,
        mode: HonkMode,
        position: Option<(f64, f64)>,
    ) -> Result<ApiResponse> {
        let mut body = json!({ "mode": mode.as_api_str() });
        if let Some((latitude, longitude)) = position {
            body["vehiclePosition"] = json!({
                "latitude": latitude,
                "longitude": longitude,
            });
        }
        self.send_command(Endpoint::HonkAndFlash, vin, Some(body))
            .await
    }

    pub async fn start_charging(&self, vin: &str) -> Result<ApiResponse> {
        self.send_command(Endpoint::ChargingStart, vin, None).await
    }

    pub async fn stop_charging(&self, vin: &str) -> Result<ApiResponse> {
        self.send_command(Endpoint::ChargingStop, vin, None).await
    }

    pub async fn set_charge_limit(&self, vin: &str, percent: u8) -> Result<ApiResponse> {
        validate_charge_limit(percent)?;
        self.send_command(
            Endpoint::ChargeLimit,
            vin,
            Some(json!({ "targetSOCInPercent": percent })),
        )
        .await
    }

    pub async fn start_climate(&self, vin: &str, celsius: Option<f64>) -> Result<ApiResponse> {
        let body = match celsius {
            Some(celsius) => json!({ "targetTemperature": temperature_body(celsius)? }),
            None => json!({}),
        };
        self.send_command(Endpoint::ClimateStart, vin, Some(body))
            .await
    }

    pub async fn stop_climate(&self, vin: &str) -> Result<ApiResponse> {
        self.send_command(Endpoint::ClimateStop, vin, None).await
    }

    pub async fn set_target_temperature(&self, vin: &str, celsius: f64) -> Result<ApiResponse> {
        let body = temperature_body(celsius)?;
        self.send_command(Endpoint::TargetTemperature, vin, Some(body))
            .await
    }

    pub async fn start_window_heating(&self, vin: &str) -> Result<ApiResponse> {
        self.send_command(Endpoint::WindowHeatingStart, vin, None)
            .await
    }

    pub async fn stop_window_heating(&self, vin: &str) -> Result<ApiResponse> {
        self.send_command(Endpoint::WindowHeatingStop, vin, None)
            .await
    }

    /// Refused by [`crate::core::client::SkodaClient`] unless disabled endpoints are allowed.
    pub async fn wake_up(&self, vin: &str) -> Result<ApiResponse> {
        self.send_command(Endpoint::VehicleWakeup, vin, None).await
    }

    /// Reads every vehicle endpoint once. Failing endpoints are recorded in
    /// the snapshot; only authentication failures abort the run.
    pub async fn snapshot(&self, vin: &str) -> Result<VehicleSnapshot> {
        validate_vin("vin", vin)?;
        let mut snapshot = VehicleSnapshot::new(vin);

        let readable = Endpoint::active()
            .filter(|e| e.spec().method == HttpMethod::Get && e.requires_vin());
        for endpoint in readable {
            match self.fetch_vehicle(endpoint, vin).await {
                Ok(body) => snapshot.record(endpoint, body),
                Err(e @ (ConnectorError::Unauthorized { .. } | ConnectorError::TokenExpired)) => {
                    return Err(e)
                }
                Err(e) => {
                    tracing::warn!("{}: {} failed: {}", vin, endpoint, e);
                    snapshot.record_failure(endpoint, e.to_string());
                }
            }
        }

        let garage_vehicle = snapshot
            .get(Endpoint::GarageVehicle)
            .and_then(Value::as_object)
            .cloned();
        if let Some(object) = garage_vehicle {
            for (location, keys) in self.garage_vehicle_extras(&object) {
                snapshot.record_extras(location, keys);
            }
        }

        tracing::info!(
            "Snapshot of {}: {} endpoint(s) read, {} failed",
            vin,
            snapshot.raw_api.len(),
            snapshot.failures.len()
        );
        Ok(snapshot)
    }

    fn garage_vehicle_extras(&self, vehicle: &Map<String, Value>) -> Vec<(String, BTreeSet<String>)> {
        let show = self.show_extra_keys;
        let mut found = vec![(
            "garage vehicle".to_string(),
            log_extra_keys("garage vehicle", vehicle, GarageVehicle::FIELDS, show),
        )];

        let nested: [(&str, Option<&Map<String, Value>>, &[&str]); 5] = [
            (
                "specification",
                object_at(vehicle, &["specification"]),
                Specification::FIELDS,
            ),
            (
                "specification.engine",
                object_at(vehicle, &["specification", "engine"]),
                Engine::FIELDS,
            ),
            (
                "specification.exteriorDimensions",
                object_at(vehicle, &["specification", "exteriorDimensions"]),
                ExteriorDimensions::FIELDS,
            ),
            (
                "specification.gearbox",
                object_at(vehicle, &["specification", "gearbox"]),
                Gearbox::FIELDS,
            ),
            (
                "servicePartner",
                object_at(vehicle, &["servicePartner"]),
                ServicePartner::FIELDS,
            ),
        ];
        for (location, object, allowed) in nested {
            if let Some(object) = object {
                found.push((
                    location.to_string(),
                    log_extra_keys(location, object, allowed, show),
                ));
            }
        }
        found.retain(|(_, keys)| !keys.is_empty());
        found
    }
}

fn object_at<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Map<String, Value>> {
    let (first, rest) = path.split_first()?;
    let mut current = root.get(*first)?.as_object()?;
    for key in rest {
        current = current.get(*key)?.as_object()?;
    }
    Some(current)
}

fn validate_spin(spin: &str) -> Result<()> {
    if spin.len() != 4 || !spin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConnectorError::ValidationError {
            message: "S-PIN must be exactly 4 digits".to_string(),
        });
    }
    Ok(())
}

/// The vehicle accepts limits from 50 to 100 percent in steps of 10.
pub fn validate_charge_limit(percent: u8) -> Result<()> {
    validate_range("charge_limit", percent, MIN_CHARGE_LIMIT, MAX_CHARGE_LIMIT)?;
    if percent % 10 != 0 {
        return Err(ConnectorError::InvalidConfigValueError {
            field: "charge_limit".to_string(),
            value: percent.to_string(),
            reason: "Value must be a multiple of 10".to_string(),
        });
    }
    Ok(())
}

/// Target temperatures go from 16.0 to 29.5 °C in half-degree steps.
pub fn validate_temperature(celsius: f64) -> Result<()> {
    validate_range("temperature", celsius, MIN_TEMPERATURE_C, MAX_TEMPERATURE_C)?;
    if (celsius * 2.0).fract() != 0.0 {
        return Err(ConnectorError::InvalidConfigValueError {
            field: "temperature".to_string(),
            value: celsius.to_string(),
            reason: "Value must be a multiple of 0.5".to_string(),
        });
    }
    Ok(())
}

fn temperature_body(celsius: f64) -> Result<Value> {
    validate_temperature(celsius)?;
    Ok(json!({ "temperatureValue": celsius, "unitInCar": "CELSIUS" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const VIN: &str = "TMBJJ7NE0L0000001";

    #[derive(Clone, Copy)]
    enum Failure {
        Status(u16),
        Expired,
    }

    /// Transport double answering from a table and recording requests.
    struct MockTransport {
        responses: HashMap<Endpoint, std::result::Result<Value, Failure>>,
        sent: Mutex<Vec<ApiRequest>>,
    }

    impl MockTransport {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, endpoint: Endpoint, body: Value) -> Self {
            self.responses.insert(endpoint, Ok(body));
            self
        }

        fn failing(mut self, endpoint: Endpoint, status: u16) -> Self {
            self.responses.insert(endpoint, Err(Failure::Status(status)));
            self
        }

        fn expiring(mut self, endpoint: Endpoint) -> Self {
            self.responses.insert(endpoint, Err(Failure::Expired));
            self
        }

        fn sent(&self) -> Vec<ApiRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiTransport for MockTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
            self.sent.lock().unwrap().push(request.clone());
            match self.responses.get(&request.endpoint) {
                Some(Ok(body)) => Ok(ApiResponse {
                    endpoint: request.endpoint,
                    status: 200,
                    body: Some(body.clone()),
                }),
                Some(Err(Failure::Status(401))) => Err(ConnectorError::Unauthorized {
                    endpoint: request.endpoint.name().to_string(),
                }),
                Some(Err(Failure::Expired)) => Err(ConnectorError::TokenExpired),
                Some(Err(Failure::Status(status))) => Err(ConnectorError::ApiStatus {
                    endpoint: request.endpoint.name().to_string(),
                    status: *status,
                    body: String::new(),
                }),
                None => Ok(ApiResponse {
                    endpoint: request.endpoint,
                    status: 202,
                    body: None,
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_commands() {
        let connector = VehicleConnector::new(MockTransport::new());
        let err = connector.fetch(Endpoint::Lock, Some(VIN)).await.unwrap_err();
        assert!(matches!(err, ConnectorError::ValidationError { .. }));
        assert!(connector.transport().sent().is_empty());
    }

    #[tokio::test]
    async fn test_lock_sends_spin() {
        let connector = VehicleConnector::new(MockTransport::new());
        let response = connector.lock(VIN, "1234").await.unwrap();
        assert_eq!(response.status, 202);

        let sent = connector.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].endpoint, Endpoint::Lock);
        assert_eq!(sent[0].vin.as_deref(), Some(VIN));
        assert_eq!(sent[0].body, Some(json!({"currentSpin": "1234"})));

        assert!(connector.unlock(VIN, "12a4").await.is_err());
        assert_eq!(connector.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_command_argument_validation() {
        let connector = VehicleConnector::new(MockTransport::new());
        assert!(connector.set_charge_limit(VIN, 80).await.is_ok());
        assert!(connector.set_charge_limit(VIN, 40).await.is_err());
        assert!(connector.set_charge_limit(VIN, 85).await.is_err());
        assert!(connector.set_target_temperature(VIN, 21.5).await.is_ok());
        assert!(connector.set_target_temperature(VIN, 21.3).await.is_err());
        assert!(connector.set_target_temperature(VIN, 30.0).await.is_err());

        let sent = connector.transport().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body, Some(json!({"targetSOCInPercent": 80})));
        assert_eq!(
            sent[1].body,
            Some(json!({"temperatureValue": 21.5, "unitInCar": "CELSIUS"}))
        );
    }

    #[tokio::test]
    async fn test_send_command_rejects_reads() {
        let connector = VehicleConnector::new(MockTransport::new());
        assert!(connector.send_command(Endpoint::Charging, VIN, None).await.is_err());
        assert!(connector.send_command(Endpoint::RefreshToken, VIN, None).await.is_err());
    }

    #[tokio::test]
    async fn test_honk_and_flash_body() {
        let connector = VehicleConnector::new(MockTransport::new());
        connector
            .honk_and_flash(VIN, HonkMode::Flash, Some((50.1, 14.4)))
            .await
            .unwrap();
        let sent = connector.transport().sent();
        assert_eq!(
            sent[0].body,
            Some(json!({
                "mode": "FLASH",
                "vehiclePosition": {"latitude": 50.1, "longitude": 14.4}
            }))
        );
    }

    #[tokio::test]
    async fn test_steering_wheel_position() {
        let transport = MockTransport::new().with(
            Endpoint::AirConditioning,
            json!({"state": "OFF", "steeringWheelPosition": "LEFT"}),
        );
        let connector = VehicleConnector::new(transport);
        assert_eq!(
            connector.steering_wheel_position(VIN).await.unwrap(),
            SteeringPosition::Left
        );
    }

    #[tokio::test]
    async fn test_snapshot_records_failures_and_extras() {
        let transport = MockTransport::new()
            .with(
                Endpoint::GarageVehicle,
                json!({
                    "vin": VIN,
                    "name": "Enyaq",
                    "brandNewField": 1,
                    "specification": {"title": "Enyaq", "engine": {"type": "iV", "batteryKind": "NMC"}}
                }),
            )
            .with(Endpoint::Charging, json!({"status": {"state": "READY_FOR_CHARGING"}}))
            .failing(Endpoint::TripStatistics, 500);
        let connector = VehicleConnector::new(transport);

        let snapshot = connector.snapshot(VIN).await.unwrap();

        assert_eq!(connector.transport().sent().len(), 14);
        assert!(snapshot.get(Endpoint::Charging).is_some());
        assert!(snapshot.failures.contains_key("trip-statistics"));
        assert!(!snapshot.is_complete());
        assert!(snapshot.extras["garage vehicle"].contains("brandNewField"));
        assert!(snapshot.extras["specification.engine"].contains("batteryKind"));
        assert!(!snapshot.extras.contains_key("specification"));
    }

    #[tokio::test]
    async fn test_snapshot_aborts_on_unauthorized() {
        let transport = MockTransport::new().failing(Endpoint::GarageVehicle, 401);
        let connector = VehicleConnector::new(transport);
        let err = connector.snapshot(VIN).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Unauthorized { .. }));
        assert_eq!(connector.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_aborts_on_expired_token() {
        let transport = MockTransport::new()
            .with(Endpoint::GarageVehicle, json!({"vin": VIN}))
            .expiring(Endpoint::VehicleStatus);
        let connector = VehicleConnector::new(transport);
        let err = connector.snapshot(VIN).await.unwrap_err();
        assert!(matches!(err, ConnectorError::TokenExpired));

        let sent = connector.transport().sent();
        assert_eq!(sent.last().unwrap().endpoint, Endpoint::VehicleStatus);
        assert!(sent.len() < 14);
    }

    #[test]
    fn test_object_at() {
        let root = json!({"a": {"b": {"c": 1}}, "x": 2});
        let root = root.as_object().unwrap();
        assert!(object_at(root, &["a", "b"]).unwrap().contains_key("c"));
        assert!(object_at(root, &["x"]).is_none());
        assert!(object_at(root, &[]).is_none());
    }
}
