// handlers.rs

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum_extra::extract::Query;
use tracing::{error, info};
use validator::Validate;

use crate::{
    color,
    commands::{Control, QueryStatus, SetProperties},
    dispatch::{Outcome, dispatch},
    error::{AppError, DeviceError},
    models::{
        AppState, ControlRequest, DeviceInfo, ErrorBody, HealthResponse, InfoQuery,
        SetPropertiesRequest,
    },
};

const LIGHT_NOT_FOUND: &str = "Light not found";

fn messages(outcomes: HashMap<String, Outcome<String>>) -> HashMap<String, String> {
    outcomes
        .into_iter()
        .map(|(name, outcome)| match outcome {
            Outcome::Success(message) => (name, message),
            Outcome::Failure(e) => (name, e.to_string()),
        })
        .collect()
}

/// Turn devices on, off, or toggle them.
#[utoipa::path(
    post,
    path = "/control_lights",
    request_body = ControlRequest,
    responses(
        (status = 200, description = "Per-device result message keyed by device name")
    )
)]
pub async fn control_lights(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ControlRequest>,
) -> Json<HashMap<String, String>> {
    let targets = state.targets(request.lights);
    info!(action = %request.action, devices = targets.len(), "Control request");

    let outcomes = dispatch(
        &state.registry,
        &targets,
        Control::new(request.action),
        state.dispatch.timeout(),
    )
    .await;

    Json(messages(outcomes))
}

/// Set brightness and/or colour.
///
/// The colour is validated before any device is contacted; an invalid channel
/// rejects the whole request.
#[utoipa::path(
    post,
    path = "/set_properties",
    request_body = SetPropertiesRequest,
    responses(
        (status = 200, description = "Per-device result message keyed by device name"),
        (status = 400, description = "Invalid brightness or RGB values", body = ErrorBody)
    )
)]
pub async fn set_properties(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetPropertiesRequest>,
) -> Result<Json<HashMap<String, String>>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let hsv = match &request.color {
        Some(channels) => {
            let hsv = color::parse_rgb(channels)
                .inspect_err(|e| error!("Invalid RGB values {:?}: {}", channels, e))?;
            info!("RGB values: {:?}", channels);
            Some(hsv)
        }
        None => None,
    };

    let brightness = request.brightness.and_then(|b| u8::try_from(b).ok());
    let command = SetProperties::plan(brightness, hsv, state.dispatch.brightness_source)
        .ok_or_else(|| AppError::Validation("request must include brightness or color".into()))?;

    let targets = state.targets(request.lights);
    let outcomes = dispatch(&state.registry, &targets, command, state.dispatch.timeout()).await;

    Ok(Json(messages(outcomes)))
}

/// Report power state, hue and brightness.
#[utoipa::path(
    get,
    path = "/get_info",
    params(InfoQuery),
    responses(
        (status = 200, description = "Status or error keyed by device name", body = HashMap<String, DeviceInfo>)
    )
)]
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InfoQuery>,
) -> Json<HashMap<String, DeviceInfo>> {
    let requested = (!query.lights.is_empty()).then_some(query.lights);
    let targets = state.targets(requested);

    let outcomes = dispatch(&state.registry, &targets, QueryStatus, state.dispatch.timeout()).await;

    Json(
        outcomes
            .into_iter()
            .map(|(name, outcome)| {
                let info = match outcome {
                    Outcome::Success(status) => DeviceInfo::Status(status),
                    Outcome::Failure(DeviceError::NotFound) => DeviceInfo::Error {
                        error: LIGHT_NOT_FOUND.to_string(),
                    },
                    Outcome::Failure(e) => DeviceInfo::Error {
                        error: e.to_string(),
                    },
                };
                (name, info)
            })
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        devices: state.registry.len(),
        connected: state.registry.connected_count(),
    })
}
