#![allow(clippy::float_cmp)]

use super::*;

const VARS: &[&str] = &[
    "VERIPEDITUS_BASE_URL",
    "VERIPEDITUS_REQUEST_TIMEOUT_SECS",
    "VERIPEDITUS_CONNECT_TIMEOUT_SECS",
    "SENSOR_THROTTLE_MS",
    "POSITION_PUSH_INTERVAL_MS",
    "AR_MAX_DISTANCE_M",
    "AR_PERSPECTIVE_PX",
    "QUERY_RADIUS_M",
    "SYNC_TRACKED_KINDS",
    "VIEWPORT_WIDTH",
    "VIEWPORT_HEIGHT",
];

/// Env mutation is process-wide; serialize every test that touches it.
static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// # Safety
/// Callers hold `ENV_LOCK`.
unsafe fn clear_env() {
    for var in VARS {
        unsafe { std::env::remove_var(var) };
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg, ClientConfig::default());
    assert_eq!(cfg.http.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.sensor.throttle, Duration::from_millis(500));
    assert_eq!(cfg.sync.push_interval, Duration::from_millis(5000));
    assert_eq!(cfg.sync.tracked_kinds, vec!["gameobject_player", "gameobject_item", "gameobject_npc"]);
    assert_eq!(cfg.ar.max_distance, 100.0);
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("VERIPEDITUS_BASE_URL", "https://game.example.test/");
        std::env::set_var("SENSOR_THROTTLE_MS", "250");
        std::env::set_var("POSITION_PUSH_INTERVAL_MS", "10000");
        std::env::set_var("AR_MAX_DISTANCE_M", "250.5");
        std::env::set_var("SYNC_TRACKED_KINDS", " gameobject_item , ,gameobject_npc ");
        std::env::set_var("VIEWPORT_WIDTH", "640");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.http.base_url, "https://game.example.test");
    assert_eq!(cfg.sensor.throttle, Duration::from_millis(250));
    assert_eq!(cfg.sensor.viewport, Viewport { width: 640, height: DEFAULT_VIEWPORT_HEIGHT });
    assert_eq!(cfg.sync.push_interval, Duration::from_secs(10));
    assert_eq!(cfg.sync.tracked_kinds, vec!["gameobject_item", "gameobject_npc"]);
    assert_eq!(cfg.ar.max_distance, 250.5);

    unsafe { clear_env() };
}

#[test]
fn from_env_malformed_number_uses_default() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("SENSOR_THROTTLE_MS", "soon");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.sensor.throttle, Duration::from_millis(DEFAULT_SENSOR_THROTTLE_MS));

    unsafe { clear_env() };
}

#[test]
fn from_env_rejects_non_positive_distance() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("AR_MAX_DISTANCE_M", "0");
    }

    let err = ClientConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { var: "AR_MAX_DISTANCE_M", .. }));

    unsafe { clear_env() };
}

#[test]
fn from_env_rejects_empty_kind_list() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_env();
        std::env::set_var("SYNC_TRACKED_KINDS", " , ");
    }

    let err = ClientConfig::from_env().unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidValue { var: "SYNC_TRACKED_KINDS", reason: "no collections listed".into() }
    );

    unsafe { clear_env() };
}
