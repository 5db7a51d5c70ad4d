//! v1 Relationship handlers.

use axum::extract::{Path, State};
use axum_extra::extract::Query;

use crate::api::v1::dto::{
    ContactDetailResponse, ContactResponse, ListContactsQuery, ListContactsResponse,
    StatsResponse, TrackEventRequest, TrackEventResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};
use crate::api::{AppJson, AppState, UserId};
use crate::models::MessageEvent;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 200;

/// `POST /api/v1/relationships:track`
///
/// Malformed events (no direction, no addresses) succeed with no results.
#[utoipa::path(
    post,
    path = "/api/v1/relationships:track",
    tag = "relationships",
    operation_id = "relationships.track",
    params(("X-User-Id" = String, Header, description = "Owning user")),
    request_body = TrackEventRequest,
    responses(
        (status = 200, description = "Per-contact tracking results", body = TrackEventResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn track_event(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    AppJson(req): AppJson<TrackEventRequest>,
) -> ApiResponse<TrackEventResponse> {
    let event: MessageEvent = req.into();
    let results = state.relationships.track(&event, &user_id).await;

    ApiResponse::success(TrackEventResponse {
        results: results.into_iter().map(Into::into).collect(),
    })
}

/// `GET /api/v1/relationships`
#[utoipa::path(
    get,
    path = "/api/v1/relationships",
    tag = "relationships",
    operation_id = "relationships.list",
    params(
        ("X-User-Id" = String, Header, description = "Owning user"),
        ListContactsQuery,
    ),
    responses(
        (status = 200, description = "Contacts, healthiest first", body = ListContactsResponse),
    )
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<ListContactsQuery>,
) -> ApiResponse<ListContactsResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);

    match state.relationships.list_contacts(&user_id, limit).await {
        Ok(contacts) => {
            let total = contacts.len() as u64;
            ApiResponse::success_with_meta(
                ListContactsResponse {
                    contacts: contacts.into_iter().map(ContactResponse::from).collect(),
                },
                ResponseMeta { total: Some(total) },
            )
        }
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/relationships/stats`
#[utoipa::path(
    get,
    path = "/api/v1/relationships/stats",
    tag = "relationships",
    operation_id = "relationships.stats",
    params(("X-User-Id" = String, Header, description = "Owning user")),
    responses(
        (status = 200, description = "Health distribution", body = StatsResponse),
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResponse<StatsResponse> {
    match state.relationships.stats(&user_id).await {
        Ok(stats) => ApiResponse::success(stats.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/relationships/{contactId}`
#[utoipa::path(
    get,
    path = "/api/v1/relationships/{contactId}",
    tag = "relationships",
    operation_id = "relationships.get",
    params(
        ("contactId" = String, Path, description = "Contact ID"),
        ("X-User-Id" = String, Header, description = "Owning user"),
    ),
    responses(
        (status = 200, description = "Contact with recent interactions", body = ContactDetailResponse),
        (status = 404, description = "Contact not found", body = ApiError),
    )
)]
pub async fn get_contact(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(contact_id): Path<String>,
) -> ApiResponse<ContactDetailResponse> {
    match state.relationships.get_contact(&user_id, &contact_id).await {
        Ok(detail) => ApiResponse::success(detail.into()),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/relationships/{contactId}/recalculate`
#[utoipa::path(
    post,
    path = "/api/v1/relationships/{contactId}/recalculate",
    tag = "relationships",
    operation_id = "relationships.recalculate",
    params(
        ("contactId" = String, Path, description = "Contact ID"),
        ("X-User-Id" = String, Header, description = "Owning user"),
    ),
    responses(
        (status = 200, description = "Recomputed contact", body = ContactResponse),
        (status = 404, description = "Contact not found", body = ApiError),
    )
)]
pub async fn recalculate_contact(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(contact_id): Path<String>,
) -> ApiResponse<ContactResponse> {
    match state
        .relationships
        .recalculate(&user_id, &contact_id)
        .await
    {
        Ok(contact) => ApiResponse::success(contact.into()),
        Err(e) => e.into(),
    }
}
