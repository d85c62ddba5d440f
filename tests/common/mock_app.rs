#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use home_gateway::app::create_app;
use home_gateway::config::{DeviceSettings, DispatchSettings};
use home_gateway::devices::DeviceKind;
use home_gateway::devices::mock::{MockDevice, MockDriver};
use home_gateway::models::AppState;
use home_gateway::registry::Registry;

pub struct MockApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub devices: HashMap<String, Arc<MockDevice>>,
}

impl MockApp {
    /// kitchen_light (off), tv_light (on), living_room_plug (off), desk_light (unreachable).
    pub async fn new() -> Self {
        Self::with_dispatch(DispatchSettings::default()).await
    }

    pub async fn with_dispatch(dispatch: DispatchSettings) -> Self {
        Self::build(
            vec![
                ("kitchen_light", DeviceKind::Light, MockDevice::powered(false)),
                ("tv_light", DeviceKind::Light, MockDevice::powered(true)),
                ("living_room_plug", DeviceKind::Plug, MockDevice::powered(false)),
                ("desk_light", DeviceKind::Light, MockDevice::unreachable()),
            ],
            dispatch,
        )
        .await
    }

    pub async fn build(
        fleet: Vec<(&str, DeviceKind, Arc<MockDevice>)>,
        dispatch: DispatchSettings,
    ) -> Self {
        let mut driver = MockDriver::new();
        let mut settings = Vec::new();
        let mut devices = HashMap::new();

        for (name, kind, device) in fleet {
            let address = format!("mock://{name}");
            driver = driver.with_device(&address, device.clone());
            settings.push(DeviceSettings {
                name: name.to_string(),
                kind,
                address,
            });
            devices.insert(name.to_string(), device);
        }

        let registry = Registry::initialize(&driver, &settings).await;
        let state = Arc::new(AppState::new(registry, dispatch));

        Self {
            router: create_app(state.clone()),
            state,
            devices,
        }
    }

    pub fn device(&self, name: &str) -> &Arc<MockDevice> {
        &self.devices[name]
    }

    /// Driver calls recorded across the whole fleet.
    pub fn total_calls(&self) -> usize {
        self.devices.values().map(|d| d.calls().len()).sum()
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .method(Method::GET)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::String(
                String::from_utf8_lossy(&body).into_owned(),
            ))
        };
        (status, value)
    }
}
