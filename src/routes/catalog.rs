use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::services::{
        CreateServiceRequest, ReorderServicesRequest, ServiceList, ServiceStats,
        UpdateServiceRequest,
    },
    error::AppResult,
    middleware::{
        auth::{AuthUser, OptionalAuthUser, ensure_admin},
        validation::ValidatedJson,
    },
    models::Service,
    response::{ApiResponse, MessageData},
    routes::params::ServiceListQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_service).get(list_services))
        .route("/stats", get(service_stats))
        .route("/reorder", post(reorder_services))
        .route(
            "/{id}",
            get(get_service).patch(update_service).delete(delete_service),
        )
        .route("/{id}/activate", patch(activate_service))
}

#[utoipa::path(
    post,
    path = "/api/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Create service", body = ApiResponse<Service>),
        (status = 400, description = "Invalid input, e.g. deposit above price"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn create_service(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateServiceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Service>>)> {
    ensure_admin(&user)?;
    let resp = catalog_service::create(&state, payload, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// Anonymous and patient callers only ever see active services.
#[utoipa::path(
    get,
    path = "/api/services",
    params(ServiceListQuery),
    responses(
        (status = 200, description = "List services", body = ApiResponse<ServiceList>)
    ),
    tag = "Services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(mut query): Query<ServiceListQuery>,
) -> AppResult<Json<ApiResponse<ServiceList>>> {
    if !user.as_ref().is_some_and(AuthUser::is_admin) {
        query.is_active = Some(true);
    }
    let resp = catalog_service::find_all(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/stats",
    responses(
        (status = 200, description = "Catalog statistics", body = ApiResponse<ServiceStats>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn service_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ServiceStats>>> {
    ensure_admin(&user)?;
    let resp = catalog_service::stats(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/services/reorder",
    request_body = ReorderServicesRequest,
    responses(
        (status = 200, description = "Reorder services", body = ApiResponse<MessageData>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown service id")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn reorder_services(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ReorderServicesRequest>,
) -> AppResult<Json<ApiResponse<MessageData>>> {
    ensure_admin(&user)?;
    let resp = catalog_service::reorder(&state, payload, user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Get service", body = ApiResponse<Service>),
        (status = 404, description = "Service not found")
    ),
    tag = "Services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Service>>> {
    let resp = catalog_service::find_one(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Update service", body = ApiResponse<Service>),
        (status = 400, description = "Deposit above price"),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn update_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateServiceRequest>,
) -> AppResult<Json<ApiResponse<Service>>> {
    ensure_admin(&user)?;
    let resp = catalog_service::update(&state, id, payload, user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Deactivate service", body = ApiResponse<MessageData>),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MessageData>>> {
    ensure_admin(&user)?;
    let resp = catalog_service::remove(&state, id, user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/services/{id}/activate",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Activate service", body = ApiResponse<Service>),
        (status = 404, description = "Service not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Services"
)]
pub async fn activate_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Service>>> {
    ensure_admin(&user)?;
    let resp = catalog_service::activate(&state, id, user.user_id).await?;
    Ok(Json(resp))
}
