use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::passes::{PassRecord, PassesRequest, RequestValue};

#[derive(OpenApi)]
#[openapi(
    paths(super::api::passes::calculate_passes),
    components(schemas(PassesRequest, RequestValue, PassRecord, ErrorResponse)),
    info(
        title = "Pass-O-Mat API",
        description = "Visibility windows of Earth-orbiting objects over a ground location",
        version = "0.1.0"
    ),
    tags(
        (name = "passes", description = "Pass prediction")
    )
)]
pub struct ApiDoc;
