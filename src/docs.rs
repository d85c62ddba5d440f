use utoipa::OpenApi;

use crate::{devices, handlers, models};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::control_lights,
        handlers::set_properties,
        handlers::get_info,
        handlers::health,
    ),
    components(
        schemas(
            models::Action,
            models::ControlRequest,
            models::SetPropertiesRequest,
            models::DeviceInfo,
            models::ErrorBody,
            models::HealthResponse,
            devices::DeviceStatus,
        )
    )
)]
pub struct ApiDoc;
