use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::appointments::{
        AdminCreateAppointmentRequest, AppointmentList, AppointmentStats, CancelAppointmentRequest,
        CreateAppointmentRequest, UpdateAppointmentRequest,
    },
    entity::sea_orm_active_enums::CancelledBy,
    error::AppResult,
    middleware::{
        auth::{AuthUser, OptionalAuthUser, ensure_admin, ensure_owner_or_admin},
        validation::ValidatedJson,
    },
    models::Appointment,
    response::ApiResponse,
    routes::params::{AppointmentListQuery, DateRangeQuery},
    services::appointment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_appointment).get(list_appointments))
        .route("/admin", post(admin_create_appointment))
        .route("/my-appointments", get(my_appointments))
        .route("/today", get(today_appointments))
        .route("/stats", get(appointment_stats))
        .route("/{id}", get(get_appointment).patch(update_appointment))
        .route("/{id}/cancel", post(cancel_appointment))
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Book an appointment, as a guest or signed in", body = ApiResponse<Appointment>),
        (status = 400, description = "Invalid input or inactive service"),
        (status = 404, description = "Service not found"),
        (status = 409, description = "Slot already booked")
    ),
    tag = "Appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    ValidatedJson(payload): ValidatedJson<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Appointment>>)> {
    let user_id = user.map(|u| u.user_id);
    let resp = appointment_service::create(&state, payload, user_id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/appointments/admin",
    request_body = AdminCreateAppointmentRequest,
    responses(
        (status = 201, description = "Book a confirmed appointment on behalf of a patient", body = ApiResponse<Appointment>),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Slot already booked")
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn admin_create_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<AdminCreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Appointment>>)> {
    ensure_admin(&user)?;
    let resp = appointment_service::create_as_admin(&state, payload, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/appointments",
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "List appointments", body = ApiResponse<AppointmentList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AppointmentListQuery>,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    ensure_admin(&user)?;
    let resp = appointment_service::find_all(&state, None, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/my-appointments",
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "Appointments of the current user", body = ApiResponse<AppointmentList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn my_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AppointmentListQuery>,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    let resp = appointment_service::find_all(&state, Some(user.user_id), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/today",
    responses(
        (status = 200, description = "Confirmed appointments for today", body = ApiResponse<AppointmentList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn today_appointments(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    ensure_admin(&user)?;
    let resp = appointment_service::today(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/stats",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Appointment counts by status", body = ApiResponse<AppointmentStats>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn appointment_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(range): Query<DateRangeQuery>,
) -> AppResult<Json<ApiResponse<AppointmentStats>>> {
    ensure_admin(&user)?;
    let resp = appointment_service::stats(&state, range).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Get appointment", body = ApiResponse<Appointment>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Appointment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let appointment = appointment_service::find_model(&state.orm, id).await?;
    ensure_owner_or_admin(&user, appointment.user_id)?;
    let resp = appointment_service::find_one(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Update appointment", body = ApiResponse<Appointment>),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Slot already booked")
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateAppointmentRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    ensure_admin(&user)?;
    let resp = appointment_service::update(&state, id, payload, user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/appointments/{id}/cancel",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = CancelAppointmentRequest,
    responses(
        (status = 200, description = "Cancel appointment", body = ApiResponse<Appointment>),
        (status = 400, description = "Already cancelled or finished"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CancelAppointmentRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let appointment = appointment_service::find_model(&state.orm, id).await?;
    ensure_owner_or_admin(&user, appointment.user_id)?;

    let actor = if user.is_admin() {
        CancelledBy::Admin
    } else {
        CancelledBy::Patient
    };
    let resp = appointment_service::cancel(&state, id, payload, actor, Some(user.user_id)).await?;
    Ok(Json(resp))
}
