use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use home_gateway::config::{BrightnessSource, DispatchSettings};
use home_gateway::devices::DeviceKind;
use home_gateway::devices::mock::{Call, MockDevice};

use crate::common::mock_app::MockApp;

mod common;

// ── control_lights ──

#[tokio::test]
async fn test_control_defaults_to_every_device() {
    let app = MockApp::new().await;

    let (status, body) = app.post("/control_lights", json!({ "action": "on" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kitchen_light"], json!("on successful"));
    assert_eq!(body["tv_light"], json!("on successful"));
    assert_eq!(body["living_room_plug"], json!("on successful"));
    assert_eq!(body["desk_light"], json!("device not found"));
    assert!(app.device("kitchen_light").is_on());
    assert!(app.device("living_room_plug").is_on());
    assert!(app.device("desk_light").calls().is_empty());
}

#[tokio::test]
async fn test_control_selected_devices_only() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post(
            "/control_lights",
            json!({ "action": "off", "lights": ["tv_light", "attic_light"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_object().unwrap().len(), 2);
    assert_eq!(body["tv_light"], json!("off successful"));
    assert_eq!(body["attic_light"], json!("device not found"));
    assert!(!app.device("tv_light").is_on());
    assert!(app.device("kitchen_light").calls().is_empty());
}

#[tokio::test]
async fn test_toggle_issues_complementary_call() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post(
            "/control_lights",
            json!({ "action": "toggle", "lights": ["tv_light", "kitchen_light"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tv_light"], json!("toggle successful"));

    // tv_light was on
    let tv = app.device("tv_light");
    assert_eq!(tv.count(&Call::Off), 1);
    assert_eq!(tv.count(&Call::On), 0);
    assert!(!tv.is_on());

    // kitchen_light was off
    let kitchen = app.device("kitchen_light");
    assert_eq!(kitchen.count(&Call::On), 1);
    assert_eq!(kitchen.count(&Call::Off), 0);
    assert!(kitchen.is_on());
}

#[tokio::test]
async fn test_one_failing_device_is_isolated() {
    let app = MockApp::build(
        vec![
            ("a", DeviceKind::Light, MockDevice::powered(false)),
            ("b", DeviceKind::Light, MockDevice::powered(false)),
            ("c", DeviceKind::Light, MockDevice::failing()),
            ("d", DeviceKind::Plug, MockDevice::powered(false)),
        ],
        DispatchSettings::default(),
    )
    .await;

    let (status, body) = app.post("/control_lights", json!({ "action": "on" })).await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_object().unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(
        results
            .values()
            .filter(|v| *v == &json!("on successful"))
            .count(),
        3
    );
    assert_eq!(body["c"], json!("mock: injected failure"));
    assert!(app.device("a").is_on() && app.device("b").is_on() && app.device("d").is_on());
}

#[tokio::test]
async fn test_empty_light_list_touches_nothing() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post("/control_lights", json!({ "action": "on", "lights": [] }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert_eq!(app.total_calls(), 0);
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let app = MockApp::new().await;

    let (status, _) = app.post("/control_lights", json!({ "action": "dim" })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.total_calls(), 0);
}

#[tokio::test]
async fn test_overlapping_toggles_do_not_interleave() {
    let lamp = MockDevice::slow(Duration::from_millis(50));
    let app = MockApp::build(
        vec![("lamp", DeviceKind::Light, lamp.clone())],
        DispatchSettings::default(),
    )
    .await;

    let toggle = json!({ "action": "toggle", "lights": ["lamp"] });
    let (first, second) = tokio::join!(
        app.post("/control_lights", toggle.clone()),
        app.post("/control_lights", toggle.clone())
    );

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_eq!(
        lamp.calls(),
        vec![Call::GetStatus, Call::On, Call::GetStatus, Call::Off]
    );
    assert!(!lamp.is_on());
}

#[tokio::test]
async fn test_slow_device_times_out_without_blocking_others() {
    let app = MockApp::build(
        vec![
            ("stuck", DeviceKind::Light, MockDevice::slow(Duration::from_secs(30))),
            ("fine", DeviceKind::Light, MockDevice::powered(false)),
        ],
        DispatchSettings {
            timeout_ms: Some(50),
            ..DispatchSettings::default()
        },
    )
    .await;

    let (status, body) = app.post("/control_lights", json!({ "action": "on" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fine"], json!("on successful"));
    assert_eq!(body["stuck"], json!("device did not respond within 50 ms"));
}

// ── set_properties ──

#[tokio::test]
async fn test_invalid_rgb_touches_no_device() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post(
            "/set_properties",
            json!({ "brightness": 50, "color": [255, 300, -1] }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid RGB values"));
    assert!(error.contains("300") && error.contains("-1"));
    assert_eq!(app.total_calls(), 0);
}

#[tokio::test]
async fn test_rgb_needs_three_channels() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post("/set_properties", json!({ "color": [255, 0] }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid RGB values"));
    assert_eq!(app.total_calls(), 0);
}

#[tokio::test]
async fn test_non_integer_rgb_gets_json_error() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post("/set_properties", json!({ "color": [1e20, 0, 12.5] }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid RGB values"));
    assert!(error.contains("12.5"));
    assert_eq!(app.total_calls(), 0);
}

#[tokio::test]
async fn test_brightness_out_of_range() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post("/set_properties", json!({ "brightness": 150 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("brightness"));
    assert_eq!(app.total_calls(), 0);
}

#[tokio::test]
async fn test_nothing_to_set() {
    let app = MockApp::new().await;

    let (status, _) = app
        .post("/set_properties", json!({ "lights": ["kitchen_light"] }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.total_calls(), 0);
}

#[tokio::test]
async fn test_color_sets_power_brightness_and_hue() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post(
            "/set_properties",
            json!({ "brightness": 20, "color": [0, 0, 255], "lights": ["kitchen_light", "living_room_plug"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kitchen_light"], json!("Properties set successfully"));
    assert_eq!(body["living_room_plug"], json!("Properties set successfully"));

    // Brightness comes from the colour's value channel by default.
    assert_eq!(
        app.device("kitchen_light").calls(),
        vec![
            Call::On,
            Call::SetBrightness(100),
            Call::SetHueSaturation(2.0 / 3.0, 1.0)
        ]
    );
    assert_eq!(app.device("living_room_plug").calls(), vec![Call::On]);
}

#[tokio::test]
async fn test_black_turns_lights_off() {
    let app = MockApp::new().await;

    let (status, _) = app
        .post(
            "/set_properties",
            json!({ "color": [0, 0, 0], "lights": ["tv_light"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let tv = app.device("tv_light");
    assert_eq!(tv.calls()[..2], [Call::Off, Call::SetBrightness(0)]);
    assert!(!tv.is_on());
}

#[tokio::test]
async fn test_explicit_brightness_source() {
    let app = MockApp::with_dispatch(DispatchSettings {
        brightness_source: BrightnessSource::Explicit,
        ..DispatchSettings::default()
    })
    .await;

    let (status, _) = app
        .post(
            "/set_properties",
            json!({ "brightness": 30, "color": [255, 0, 0], "lights": ["kitchen_light"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.device("kitchen_light").calls(),
        vec![
            Call::On,
            Call::SetBrightness(30),
            Call::SetHueSaturation(0.0, 1.0)
        ]
    );
}

#[tokio::test]
async fn test_brightness_only() {
    let app = MockApp::new().await;

    let (status, body) = app
        .post(
            "/set_properties",
            json!({ "brightness": 40, "lights": ["tv_light", "desk_light"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tv_light"], json!("Brightness set successfully"));
    assert_eq!(body["desk_light"], json!("device not found"));
    assert_eq!(
        app.device("tv_light").calls(),
        vec![Call::On, Call::SetBrightness(40)]
    );
}

// ── get_info ──

#[tokio::test]
async fn test_get_info_unknown_light() {
    let app = MockApp::new().await;

    let (status, body) = app.get("/get_info?lights=garage_light").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "garage_light": { "error": "Light not found" } }));
    assert_eq!(app.total_calls(), 0);
}

#[tokio::test]
async fn test_get_info_selected_lights() {
    let app = MockApp::new().await;

    let (status, body) = app
        .get("/get_info?lights=tv_light&lights=living_room_plug")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "tv_light": { "is_on": true, "hue": 0, "brightness": 100 },
            "living_room_plug": { "is_on": false, "hue": null, "brightness": null },
        })
    );
    assert!(app.device("kitchen_light").calls().is_empty());
}

#[tokio::test]
async fn test_get_info_defaults_to_every_device() {
    let app = MockApp::new().await;

    let (status, body) = app.get("/get_info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_object().unwrap().len(), 4);
    assert_eq!(body["desk_light"], json!({ "error": "Light not found" }));
    assert_eq!(body["kitchen_light"]["is_on"], json!(false));
}

#[tokio::test]
async fn test_get_info_reports_driver_failure() {
    let app = MockApp::build(
        vec![
            ("ok", DeviceKind::Light, MockDevice::powered(true)),
            ("broken", DeviceKind::Light, MockDevice::failing()),
        ],
        DispatchSettings::default(),
    )
    .await;

    let (status, body) = app.get("/get_info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["broken"], json!({ "error": "mock: injected failure" }));
    assert_eq!(body["ok"]["is_on"], json!(true));
}

// ── health ──

#[tokio::test]
async fn test_health_counts_connections() {
    let app = MockApp::new().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "devices": 4, "connected": 3 }));
}
