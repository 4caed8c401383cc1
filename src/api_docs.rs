use utoipa::OpenApi;
use crate::controllers::solar_controller;
use crate::models::solar;

#[derive(OpenApi)]
#[openapi(
    paths(
        solar_controller::calculate_solar_angles,
        solar_controller::list_calculations,
        solar_controller::health_check
    ),
    components(
        schemas(
            solar::CalculateRequest,
            solar::SolarResult,
            solar::CalculationRecord,
            solar::HealthResponse,
            solar::ErrorResponse
        )
    ),
    tags(
        (name = "solar-panel-calculator", description = "Optimal solar panel tilt, azimuth and yield")
    )
)]
pub struct ApiDoc;
