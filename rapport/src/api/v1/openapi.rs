use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rapport API",
        version = "1.0.0",
        description = "Relationship health scoring over a user's email traffic.",
    ),
    paths(
        handlers::health::health_check,
        handlers::relationships::track_event,
        handlers::relationships::list_contacts,
        handlers::relationships::get_stats,
        handlers::relationships::get_contact,
        handlers::relationships::recalculate_contact,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // Common
        dto::common::V1Direction,
        dto::common::V1SentimentLabel,
        dto::common::V1SentimentTrend,
        // Relationships
        dto::relationships::TrackEventRequest,
        dto::relationships::ListContactsQuery,
        dto::relationships::TrackResultResponse,
        dto::relationships::TrackEventResponse,
        dto::relationships::HealthBreakdownResponse,
        dto::relationships::ContactResponse,
        dto::relationships::InteractionResponse,
        dto::relationships::ContactDetailResponse,
        dto::relationships::ListContactsResponse,
        dto::relationships::StatsResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::SentimentStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "relationships", description = "Contact tracking, health scores and suggestions"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
