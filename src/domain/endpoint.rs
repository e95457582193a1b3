//! Catalog of the MySkoda cloud API endpoints.
//!
//! Every endpoint the connector knows is a variant of [`Endpoint`]; its
//! static row ([`EndpointSpec`]) carries the HTTP method, host, version,
//! path template and fixed query parameters. Vehicle scoped templates
//! contain a `{vin}` placeholder.

use crate::utils::error::{ConnectorError, Result};
use crate::utils::validation::validate_vin;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://mysmob.api.connect.skoda-auto.cz";
pub const DEFAULT_IDENTITY_BASE: &str = "https://identity.vwgroup.io";

const VIN_PLACEHOLDER: &str = "{vin}";

const CONNECTIVITY_GENERATIONS: &[(&str, &str)] = &[
    ("connectivityGenerations", "MOD1"),
    ("connectivityGenerations", "MOD2"),
    ("connectivityGenerations", "MOD3"),
    ("connectivityGenerations", "MOD4"),
];
const CONNECT_TOKEN: &[(&str, &str)] = &[("tokenType", "CONNECT")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Host {
    Api,
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
    V3,
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Authentication,
    Garage,
    VehicleStatus,
    Maintenance,
    Position,
    Charging,
    Climate,
    Access,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Authentication,
        Category::Garage,
        Category::VehicleStatus,
        Category::Maintenance,
        Category::Position,
        Category::Charging,
        Category::Climate,
        Category::Access,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication",
            Self::Garage => "Garage & vehicle information",
            Self::VehicleStatus => "Vehicle status",
            Self::Maintenance => "Maintenance",
            Self::Position => "Position",
            Self::Charging => "Charging",
            Self::Climate => "Climate control",
            Self::Access => "Access control",
        }
    }
}

/// Base URLs the endpoint templates are rendered against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase {
    pub api: String,
    pub identity: String,
}

impl Default for ApiBase {
    fn default() -> Self {
        Self {
            api: DEFAULT_API_BASE.to_string(),
            identity: DEFAULT_IDENTITY_BASE.to_string(),
        }
    }
}

impl ApiBase {
    pub fn new(api: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            identity: identity.into(),
        }
    }

    pub fn for_host(&self, host: Host) -> &str {
        match host {
            Host::Api => self.api.trim_end_matches('/'),
            Host::Identity => self.identity.trim_end_matches('/'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub name: &'static str,
    pub method: HttpMethod,
    pub host: Host,
    /// `None` for identity host paths, which are not under `/api/{version}`.
    pub version: Option<ApiVersion>,
    pub path: &'static str,
    pub query: &'static [(&'static str, &'static str)],
    pub category: Category,
    pub description: &'static str,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    OidcAuthorize,
    ExchangeAuthorizationCode,
    RefreshToken,
    User,
    Garage,
    GarageVehicle,
    Renders,
    Equipment,
    VehicleStatus,
    DrivingRange,
    ConnectionReadiness,
    WarningLights,
    TripStatistics,
    Maintenance,
    MaintenanceReport,
    Positions,
    Charging,
    ChargingHistory,
    ChargingStart,
    ChargingStop,
    ChargeLimit,
    AirConditioning,
    ClimateStart,
    ClimateStop,
    TargetTemperature,
    WindowHeatingStart,
    WindowHeatingStop,
    Lock,
    Unlock,
    HonkAndFlash,
    VehicleWakeup,
}

impl Endpoint {
    pub const ALL: [Endpoint; 31] = [
        Endpoint::OidcAuthorize,
        Endpoint::ExchangeAuthorizationCode,
        Endpoint::RefreshToken,
        Endpoint::User,
        Endpoint::Garage,
        Endpoint::GarageVehicle,
        Endpoint::Renders,
        Endpoint::Equipment,
        Endpoint::VehicleStatus,
        Endpoint::DrivingRange,
        Endpoint::ConnectionReadiness,
        Endpoint::WarningLights,
        Endpoint::TripStatistics,
        Endpoint::Maintenance,
        Endpoint::MaintenanceReport,
        Endpoint::Positions,
        Endpoint::Charging,
        Endpoint::ChargingHistory,
        Endpoint::ChargingStart,
        Endpoint::ChargingStop,
        Endpoint::ChargeLimit,
        Endpoint::AirConditioning,
        Endpoint::ClimateStart,
        Endpoint::ClimateStop,
        Endpoint::TargetTemperature,
        Endpoint::WindowHeatingStart,
        Endpoint::WindowHeatingStop,
        Endpoint::Lock,
        Endpoint::Unlock,
        Endpoint::HonkAndFlash,
        Endpoint::VehicleWakeup,
    ];

    pub fn spec(&self) -> &'static EndpointSpec {
        use ApiVersion::*;
        use Category as C;
        use HttpMethod::*;

        match self {
            Self::OidcAuthorize => &EndpointSpec {
                name: "oidc-authorize",
                method: Get,
                host: Host::Identity,
                version: None,
                path: "/oidc/v1/authorize",
                query: &[],
                category: C::Authentication,
                description: "Start of the OIDC authorization-code login; redirects back with a code",
                disabled: false,
            },
            Self::ExchangeAuthorizationCode => &EndpointSpec {
                name: "exchange-authorization-code",
                method: Post,
                host: Host::Api,
                version: Some(V1),
                path: "/authentication/exchange-authorization-code",
                query: CONNECT_TOKEN,
                category: C::Authentication,
                description: "Exchange the authorization code for access, refresh and ID tokens",
                disabled: false,
            },
            Self::RefreshToken => &EndpointSpec {
                name: "refresh-token",
                method: Post,
                host: Host::Api,
                version: Some(V1),
                path: "/authentication/refresh-token",
                query: CONNECT_TOKEN,
                category: C::Authentication,
                description: "Obtain a new access token with the refresh token",
                disabled: false,
            },
            Self::User => &EndpointSpec {
                name: "user",
                method: Get,
                host: Host::Api,
                version: Some(V1),
                path: "/users",
                query: &[],
                category: C::Authentication,
                description: "Account profile of the logged-in user",
                disabled: false,
            },
            Self::Garage => &EndpointSpec {
                name: "garage",
                method: Get,
                host: Host::Api,
                version: Some(V2),
                path: "/garage",
                query: CONNECTIVITY_GENERATIONS,
                category: C::Garage,
                description: "List of vehicles linked to the account",
                disabled: false,
            },
            Self::GarageVehicle => &EndpointSpec {
                name: "garage-vehicle",
                method: Get,
                host: Host::Api,
                version: Some(V2),
                path: "/garage/vehicles/{vin}",
                query: CONNECTIVITY_GENERATIONS,
                category: C::Garage,
                description: "Vehicle details: specification, service partner, renders, state",
                disabled: false,
            },
            Self::Renders => &EndpointSpec {
                name: "renders",
                method: Get,
                host: Host::Api,
                version: Some(V1),
                path: "/vehicle-information/{vin}/renders",
                query: &[],
                category: C::Garage,
                description: "URLs of vehicle render images",
                disabled: false,
            },
            Self::Equipment => &EndpointSpec {
                name: "equipment",
                method: Get,
                host: Host::Api,
                version: Some(V1),
                path: "/vehicle-information/{vin}/equipment",
                query: &[],
                category: C::Garage,
                description: "Factory equipment list of the vehicle",
                disabled: false,
            },
            Self::VehicleStatus => &EndpointSpec {
                name: "vehicle-status",
                method: Get,
                host: Host::Api,
                version: Some(V2),
                path: "/vehicle-status/{vin}",
                query: &[],
                category: C::VehicleStatus,
                description: "Doors, windows, lights and lock state",
                disabled: false,
            },
            Self::DrivingRange => &EndpointSpec {
                name: "driving-range",
                method: Get,
                host: Host::Api,
                version: Some(V2),
                path: "/vehicle-status/{vin}/driving-range",
                query: &[],
                category: C::VehicleStatus,
                description: "Remaining range and fuel or battery level per engine",
                disabled: false,
            },
            Self::ConnectionReadiness => &EndpointSpec {
                name: "connection-readiness",
                method: Get,
                host: Host::Api,
                version: Some(V2),
                path: "/connection-status/{vin}/readiness",
                query: &[],
                category: C::VehicleStatus,
                description: "Whether the vehicle is online and ready for commands",
                disabled: false,
            },
            Self::WarningLights => &EndpointSpec {
                name: "warning-lights",
                method: Get,
                host: Host::Api,
                version: Some(V1),
                path: "/vehicle-health-report/warning-lights/{vin}",
                query: &[],
                category: C::VehicleStatus,
                description: "Active dashboard warning lights",
                disabled: false,
            },
            Self::TripStatistics => &EndpointSpec {
                name: "trip-statistics",
                method: Get,
                host: Host::Api,
                version: Some(V1),
                path: "/trip-statistics/{vin}",
                query: &[("offsetType", "week"), ("timezone", "UTC")],
                category: C::VehicleStatus,
                description: "Trip statistics of the current week",
                disabled: false,
            },
            Self::Maintenance => &EndpointSpec {
                name: "maintenance",
                method: Get,
                host: Host::Api,
                version: Some(V3),
                path: "/vehicle-maintenance/vehicles/{vin}",
                query: &[],
                category: C::Maintenance,
                description: "Service schedule, predictive maintenance and preferred partner",
                disabled: false,
            },
            Self::MaintenanceReport => &EndpointSpec {
                name: "maintenance-report",
                method: Get,
                host: Host::Api,
                version: Some(V3),
                path: "/vehicle-maintenance/vehicles/{vin}/report",
                query: &[],
                category: C::Maintenance,
                description: "Mileage and inspection due dates",
                disabled: false,
            },
            Self::Positions => &EndpointSpec {
                name: "positions",
                method: Get,
                host: Host::Api,
                version: Some(V1),
                path: "/maps/positions",
                query: &[("vin", VIN_PLACEHOLDER)],
                category: C::Position,
                description: "Last known parking position",
                disabled: false,
            },
            Self::Charging => &EndpointSpec {
                name: "charging",
                method: Get,
                host: Host::Api,
                version: Some(V1),
                path: "/charging/{vin}",
                query: &[],
                category: C::Charging,
                description: "Charging state, settings and battery status",
                disabled: false,
            },
            Self::ChargingHistory => &EndpointSpec {
                name: "charging-history",
                method: Get,
                host: Host::Api,
                version: Some(V1),
                path: "/charging/{vin}/history",
                query: &[("userTimezone", "UTC"), ("limit", "50")],
                category: C::Charging,
                description: "Recent charging sessions",
                disabled: false,
            },
            Self::ChargingStart => &EndpointSpec {
                name: "charging-start",
                method: Post,
                host: Host::Api,
                version: Some(V1),
                path: "/charging/{vin}/start",
                query: &[],
                category: C::Charging,
                description: "Start charging",
                disabled: false,
            },
            Self::ChargingStop => &EndpointSpec {
                name: "charging-stop",
                method: Post,
                host: Host::Api,
                version: Some(V1),
                path: "/charging/{vin}/stop",
                query: &[],
                category: C::Charging,
                description: "Stop charging",
                disabled: false,
            },
            Self::ChargeLimit => &EndpointSpec {
                name: "charge-limit",
                method: Put,
                host: Host::Api,
                version: Some(V1),
                path: "/charging/{vin}/set-charge-limit",
                query: &[],
                category: C::Charging,
                description: "Set the target state of charge in percent",
                disabled: false,
            },
            Self::AirConditioning => &EndpointSpec {
                name: "air-conditioning",
                method: Get,
                host: Host::Api,
                version: Some(V2),
                path: "/air-conditioning/{vin}",
                query: &[],
                category: C::Climate,
                description: "Climatisation state, target temperature, window heating, steering wheel side",
                disabled: false,
            },
            Self::ClimateStart => &EndpointSpec {
                name: "climate-start",
                method: Post,
                host: Host::Api,
                version: Some(V2),
                path: "/air-conditioning/{vin}/start",
                query: &[],
                category: C::Climate,
                description: "Start climatisation",
                disabled: false,
            },
            Self::ClimateStop => &EndpointSpec {
                name: "climate-stop",
                method: Post,
                host: Host::Api,
                version: Some(V2),
                path: "/air-conditioning/{vin}/stop",
                query: &[],
                category: C::Climate,
                description: "Stop climatisation",
                disabled: false,
            },
            Self::TargetTemperature => &EndpointSpec {
                name: "target-temperature",
                method: Post,
                host: Host::Api,
                version: Some(V2),
                path: "/air-conditioning/{vin}/settings/target-temperature",
                query: &[],
                category: C::Climate,
                description: "Set the climatisation target temperature",
                disabled: false,
            },
            Self::WindowHeatingStart => &EndpointSpec {
                name: "window-heating-start",
                method: Post,
                host: Host::Api,
                version: Some(V2),
                path: "/air-conditioning/{vin}/start-window-heating",
                query: &[],
                category: C::Climate,
                description: "Start front and rear window heating",
                disabled: false,
            },
            Self::WindowHeatingStop => &EndpointSpec {
                name: "window-heating-stop",
                method: Post,
                host: Host::Api,
                version: Some(V2),
                path: "/air-conditioning/{vin}/stop-window-heating",
                query: &[],
                category: C::Climate,
                description: "Stop window heating",
                disabled: false,
            },
            Self::Lock => &EndpointSpec {
                name: "lock",
                method: Post,
                host: Host::Api,
                version: Some(V1),
                path: "/vehicle-access/{vin}/lock",
                query: &[],
                category: C::Access,
                description: "Lock the vehicle (requires S-PIN)",
                disabled: false,
            },
            Self::Unlock => &EndpointSpec {
                name: "unlock",
                method: Post,
                host: Host::Api,
                version: Some(V1),
                path: "/vehicle-access/{vin}/unlock",
                query: &[],
                category: C::Access,
                description: "Unlock the vehicle (requires S-PIN)",
                disabled: false,
            },
            Self::HonkAndFlash => &EndpointSpec {
                name: "honk-and-flash",
                method: Post,
                host: Host::Api,
                version: Some(V1),
                path: "/vehicle-access/{vin}/honk-and-flash",
                query: &[],
                category: C::Access,
                description: "Honk and/or flash the lights",
                disabled: false,
            },
            Self::VehicleWakeup => &EndpointSpec {
                name: "vehicle-wakeup",
                method: Post,
                host: Host::Api,
                version: Some(V1),
                path: "/vehicle-wakeup/{vin}",
                query: &[("applyRequestLimiter", "true")],
                category: C::VehicleStatus,
                description: "Wake the vehicle to refresh its data; drains the 12V battery",
                disabled: true,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    pub fn is_disabled(&self) -> bool {
        self.spec().disabled
    }

    pub fn requires_vin(&self) -> bool {
        let spec = self.spec();
        spec.path.contains(VIN_PLACEHOLDER)
            || spec.query.iter().any(|(_, v)| v.contains(VIN_PLACEHOLDER))
    }

    /// Vehicle commands: anything that writes and targets a VIN.
    pub fn is_command(&self) -> bool {
        self.spec().method != HttpMethod::Get && self.requires_vin()
    }

    pub fn active() -> impl Iterator<Item = Endpoint> {
        Self::ALL.into_iter().filter(|e| !e.is_disabled())
    }

    pub fn disabled() -> impl Iterator<Item = Endpoint> {
        Self::ALL.into_iter().filter(|e| e.is_disabled())
    }

    /// Documentation form of the URL, `{vin}` left in place.
    pub fn url_template(&self, base: &ApiBase) -> String {
        let spec = self.spec();
        let mut out = String::from(base.for_host(spec.host));
        if let Some(version) = spec.version {
            out.push_str("/api/");
            out.push_str(&version.to_string());
        }
        out.push_str(spec.path);
        if !spec.query.is_empty() {
            let query = spec
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            out.push('?');
            out.push_str(&query);
        }
        out
    }

    /// Renders the request URL for `vin`. Endpoints without a VIN ignore it.
    pub fn url(&self, base: &ApiBase, vin: Option<&str>) -> Result<Url> {
        let spec = self.spec();
        let vin = if self.requires_vin() {
            let vin = vin.ok_or_else(|| ConnectorError::ValidationError {
                message: format!("Endpoint {} requires a VIN", spec.name),
            })?;
            validate_vin("vin", vin)?;
            Some(vin)
        } else {
            None
        };
        let fill = |template: &str| match vin {
            Some(vin) => template.replace(VIN_PLACEHOLDER, vin),
            None => template.to_string(),
        };

        let root = base.for_host(spec.host);
        let path = match spec.version {
            Some(version) => format!("/api/{}{}", version, fill(spec.path)),
            None => fill(spec.path),
        };
        let mut url = Url::parse(&format!("{}{}", root, path)).map_err(|e| {
            ConnectorError::InvalidConfigValueError {
                field: "api.base_url".to_string(),
                value: root.to_string(),
                reason: e.to_string(),
            }
        })?;

        if !spec.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in spec.query {
                pairs.append_pair(key, &fill(value));
            }
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| ConnectorError::ValidationError {
                message: format!("Unknown endpoint '{}'", s),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIN: &str = "TMBJJ7NE0L0000001";

    #[test]
    fn test_counts() {
        assert_eq!(Endpoint::active().count(), 30);
        assert_eq!(Endpoint::disabled().collect::<Vec<_>>(), vec![Endpoint::VehicleWakeup]);
    }

    #[test]
    fn test_name_round_trip_and_serde_agree() {
        for endpoint in Endpoint::ALL {
            assert_eq!(endpoint.name().parse::<Endpoint>().unwrap(), endpoint);
            let json = serde_json::to_string(&endpoint).unwrap();
            assert_eq!(json, format!("\"{}\"", endpoint.name()));
        }
        assert!("no-such-endpoint".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_garage_url_has_connectivity_generations() {
        let url = Endpoint::Garage.url(&ApiBase::default(), None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://mysmob.api.connect.skoda-auto.cz/api/v2/garage?connectivityGenerations=MOD1&connectivityGenerations=MOD2&connectivityGenerations=MOD3&connectivityGenerations=MOD4"
        );
    }

    #[test]
    fn test_vin_in_path_and_query() {
        let base = ApiBase::default();
        let status = Endpoint::VehicleStatus.url(&base, Some(VIN)).unwrap();
        assert_eq!(status.path(), format!("/api/v2/vehicle-status/{}", VIN));

        let positions = Endpoint::Positions.url(&base, Some(VIN)).unwrap();
        assert_eq!(positions.path(), "/api/v1/maps/positions");
        assert_eq!(positions.query(), Some(format!("vin={}", VIN).as_str()));
    }

    #[test]
    fn test_missing_or_invalid_vin() {
        let base = ApiBase::default();
        assert!(Endpoint::Charging.url(&base, None).is_err());
        assert!(Endpoint::Charging.url(&base, Some("../../users")).is_err());
        // a VIN passed to an account-level endpoint is ignored
        let user = Endpoint::User.url(&base, Some(VIN)).unwrap();
        assert_eq!(user.path(), "/api/v1/users");
    }

    #[test]
    fn test_identity_host_has_no_api_prefix() {
        let url = Endpoint::OidcAuthorize.url(&ApiBase::default(), None).unwrap();
        assert_eq!(url.as_str(), "https://identity.vwgroup.io/oidc/v1/authorize");
    }

    #[test]
    fn test_base_override_trailing_slash() {
        let base = ApiBase::new("http://127.0.0.1:8080/", DEFAULT_IDENTITY_BASE);
        let url = Endpoint::RefreshToken.url(&base, None).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/v1/authentication/refresh-token?tokenType=CONNECT"
        );
    }

    #[test]
    fn test_commands() {
        assert!(Endpoint::Lock.is_command());
        assert!(Endpoint::ChargeLimit.is_command());
        assert!(!Endpoint::RefreshToken.is_command());
        assert!(!Endpoint::Charging.is_command());
    }

    #[test]
    fn test_url_template() {
        assert_eq!(
            Endpoint::VehicleWakeup.url_template(&ApiBase::default()),
            "https://mysmob.api.connect.skoda-auto.cz/api/v1/vehicle-wakeup/{vin}?applyRequestLimiter=true"
        );
    }
}
