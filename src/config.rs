//! Client configuration parsed from environment variables.
//!
//! Every knob has a typed default so an empty environment yields a working
//! client pointed at a local server. Malformed numbers fall back to their
//! default; values that parse but make no sense are rejected.

use std::time::Duration;

use projection::ar::ArParams;

use crate::util::env_parse;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SENSOR_THROTTLE_MS: u64 = 500;
pub const DEFAULT_POSITION_PUSH_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_AR_MAX_DISTANCE_M: f64 = 100.0;
pub const DEFAULT_AR_PERSPECTIVE_PX: f64 = 1000.0;
pub const DEFAULT_QUERY_RADIUS_M: f64 = 500.0;
pub const DEFAULT_TRACKED_KINDS: &str = "gameobject_player,gameobject_item,gameobject_npc";
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: DEFAULT_VIEWPORT_WIDTH, height: DEFAULT_VIEWPORT_HEIGHT }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    /// Minimum spacing between accepted geolocation or orientation samples.
    pub throttle: Duration,
    /// Requested camera stream size.
    pub viewport: Viewport,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { throttle: Duration::from_millis(DEFAULT_SENSOR_THROTTLE_MS), viewport: Viewport::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Minimum spacing between position pushes to the server.
    pub push_interval: Duration,
    /// Radius of the query box around the player while no map viewport is set.
    pub query_radius_m: f64,
    /// Collections queried on every reconciliation cycle.
    pub tracked_kinds: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            push_interval: Duration::from_millis(DEFAULT_POSITION_PUSH_INTERVAL_MS),
            query_radius_m: DEFAULT_QUERY_RADIUS_M,
            tracked_kinds: parse_kinds(DEFAULT_TRACKED_KINDS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub http: HttpConfig,
    pub sensor: SensorConfig,
    pub sync: SyncConfig,
    pub ar: ArParams,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            sensor: SensorConfig::default(),
            sync: SyncConfig::default(),
            ar: ArParams { max_distance: DEFAULT_AR_MAX_DISTANCE_M, perspective: DEFAULT_AR_PERSPECTIVE_PX },
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `VERIPEDITUS_BASE_URL`: server root, trailing slash stripped
    /// - `VERIPEDITUS_REQUEST_TIMEOUT_SECS` / `VERIPEDITUS_CONNECT_TIMEOUT_SECS`
    /// - `SENSOR_THROTTLE_MS`: default 500
    /// - `POSITION_PUSH_INTERVAL_MS`: default 5000
    /// - `AR_MAX_DISTANCE_M` / `AR_PERSPECTIVE_PX`: default 100 / 1000
    /// - `QUERY_RADIUS_M`: default 500
    /// - `SYNC_TRACKED_KINDS`: comma-separated collection names
    /// - `VIEWPORT_WIDTH` / `VIEWPORT_HEIGHT`: default 1280x720
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for non-positive distances or an
    /// empty tracked-kind list.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("VERIPEDITUS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let http = HttpConfig {
            base_url,
            request_timeout: Duration::from_secs(env_parse(
                "VERIPEDITUS_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(env_parse(
                "VERIPEDITUS_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
        };

        let sensor = SensorConfig {
            throttle: Duration::from_millis(env_parse("SENSOR_THROTTLE_MS", DEFAULT_SENSOR_THROTTLE_MS)),
            viewport: Viewport {
                width: env_parse("VIEWPORT_WIDTH", DEFAULT_VIEWPORT_WIDTH),
                height: env_parse("VIEWPORT_HEIGHT", DEFAULT_VIEWPORT_HEIGHT),
            },
        };

        let tracked_kinds =
            parse_kinds(&std::env::var("SYNC_TRACKED_KINDS").unwrap_or_else(|_| DEFAULT_TRACKED_KINDS.to_owned()));
        if tracked_kinds.is_empty() {
            return Err(ConfigError::InvalidValue { var: "SYNC_TRACKED_KINDS", reason: "no collections listed".into() });
        }
        let sync = SyncConfig {
            push_interval: Duration::from_millis(env_parse(
                "POSITION_PUSH_INTERVAL_MS",
                DEFAULT_POSITION_PUSH_INTERVAL_MS,
            )),
            query_radius_m: positive("QUERY_RADIUS_M", env_parse("QUERY_RADIUS_M", DEFAULT_QUERY_RADIUS_M))?,
            tracked_kinds,
        };

        let ar = ArParams {
            max_distance: positive("AR_MAX_DISTANCE_M", env_parse("AR_MAX_DISTANCE_M", DEFAULT_AR_MAX_DISTANCE_M))?,
            perspective: positive("AR_PERSPECTIVE_PX", env_parse("AR_PERSPECTIVE_PX", DEFAULT_AR_PERSPECTIVE_PX))?,
        };

        Ok(Self { http, sensor, sync, ar })
    }
}

fn positive(var: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { var, reason: format!("expected a positive number, got {value}") })
    }
}

fn parse_kinds(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
