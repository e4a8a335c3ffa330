//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wastage Upload Server",
        version = "0.1.0",
        description = "API server for recording challan wastage entries (party/vehicle metadata, MOU report, photo uploads) and forwarding MOU averages to the inward challan system"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Wastage endpoints
        api::wastages::create_or_update_wastage,
        api::wastages::list_wastages,
        api::wastages::get_wastage_by_challan,
        api::wastages::delete_wastage,
    ),
    components(
        schemas(
            error::ErrorResponse,
            api::health::HealthResponse,
            api::health::ReadyResponse,
            models::WastageResponse,
            models::DeleteResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health checks"),
        (name = "Wastages", description = "Challan wastage entries")
    )
)]
pub struct ApiDoc;
