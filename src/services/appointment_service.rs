use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        appointments::{
            AdminCreateAppointmentRequest, AppointmentList, AppointmentStats,
            CancelAppointmentRequest, CreateAppointmentRequest, UpdateAppointmentRequest,
        },
        rules::parse_slot_time,
    },
    entity::{
        Appointments, Services,
        appointments::{ActiveModel, Column, Model as AppointmentModel},
        sea_orm_active_enums::{AppointmentStatus, CancelledBy, PaymentStatus},
        services::Model as ServiceModel,
    },
    error::{AppError, AppResult},
    models::Appointment,
    response::{ApiResponse, Meta},
    routes::params::{AppointmentListQuery, DateRangeQuery},
    services::slot_checker::{ensure_slot_available, slot_write_error},
    state::AppState,
};

/// Public booking. `user_id` is `None` for guests.
pub async fn create(
    state: &AppState,
    payload: CreateAppointmentRequest,
    user_id: Option<Uuid>,
) -> AppResult<ApiResponse<Appointment>> {
    let time = slot_time(&payload.appointment_time)?;
    let txn = state.orm.begin().await?;

    let service = find_service(&txn, payload.service_id).await?;
    if !service.is_active {
        return Err(AppError::BadRequest("This service is not available".into()));
    }

    ensure_slot_available(&txn, payload.appointment_date, time, None).await?;

    let appointment = new_appointment(&payload, time, user_id)
        .insert(&txn)
        .await
        .map_err(slot_write_error)?;

    txn.commit().await?;

    tracing::info!(
        appointment_id = %appointment.id,
        date = %appointment.appointment_date,
        time = %appointment.appointment_time,
        guest = user_id.is_none(),
        "appointment created"
    );
    log_audit(
        &state.orm,
        user_id,
        "appointment_create",
        Some("appointments"),
        Some(serde_json::json!({ "appointment_id": appointment.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Appointment created",
        Appointment::from_entity(appointment, Some(service)),
        None,
    ))
}

/// Staff booking: confirmed straight away and allowed on inactive services.
/// Payment starts pending like any booking; staff record it through `update`.
pub async fn create_as_admin(
    state: &AppState,
    payload: AdminCreateAppointmentRequest,
    admin_id: Uuid,
) -> AppResult<ApiResponse<Appointment>> {
    let AdminCreateAppointmentRequest {
        appointment: booking,
        notes,
    } = payload;

    let time = slot_time(&booking.appointment_time)?;
    let txn = state.orm.begin().await?;

    let service = find_service(&txn, booking.service_id).await?;
    ensure_slot_available(&txn, booking.appointment_date, time, None).await?;

    let mut active = new_appointment(&booking, time, None);
    active.status = Set(AppointmentStatus::Confirmed);
    active.created_by_admin = Set(true);
    active.notes = Set(notes);

    let appointment = active.insert(&txn).await.map_err(slot_write_error)?;
    txn.commit().await?;

    tracing::info!(
        appointment_id = %appointment.id,
        admin_id = %admin_id,
        "appointment created by admin"
    );
    log_audit(
        &state.orm,
        Some(admin_id),
        "appointment_admin_create",
        Some("appointments"),
        Some(serde_json::json!({ "appointment_id": appointment.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Appointment created",
        Appointment::from_entity(appointment, Some(service)),
        None,
    ))
}

/// Filtered listing ordered by slot. `user_id` scopes it to one patient.
pub async fn find_all(
    state: &AppState,
    user_id: Option<Uuid>,
    query: AppointmentListQuery,
) -> AppResult<ApiResponse<AppointmentList>> {
    let pagination = query.pagination();

    let mut condition = date_range_condition(query.start_date, query.end_date);
    if let Some(user_id) = user_id {
        condition = condition.add(Column::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }

    let finder = Appointments::find()
        .filter(condition)
        .order_by_asc(Column::AppointmentDate)
        .order_by_asc(Column::AppointmentTime);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_services(&state.orm, models).await?;

    let meta = Meta::new(pagination.page, pagination.limit, total);
    Ok(ApiResponse::success(
        "Appointments",
        AppointmentList { items },
        Some(meta),
    ))
}

pub async fn find_one(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Appointment>> {
    let (appointment, service) = Appointments::find_by_id(id)
        .find_also_related(Services)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment"))?;

    Ok(ApiResponse::success(
        "Appointment",
        Appointment::from_entity(appointment, service),
        None,
    ))
}

/// Admin patch. Moving the appointment re-checks the slot, ignoring itself.
pub async fn update(
    state: &AppState,
    id: Uuid,
    patch: UpdateAppointmentRequest,
    admin_id: Uuid,
) -> AppResult<ApiResponse<Appointment>> {
    let txn = state.orm.begin().await?;
    let current = find_model(&txn, id).await?;

    if let Some(status) = patch.status {
        if status != current.status && current.status.is_terminal() {
            return Err(AppError::BadRequest(format!(
                "A {} appointment cannot change status",
                status_label(current.status)
            )));
        }
    }

    if patch.touches_slot() {
        let date = patch.appointment_date.unwrap_or(current.appointment_date);
        let time = match patch.appointment_time.as_deref() {
            Some(raw) => slot_time(raw)?,
            None => current.appointment_time,
        };
        ensure_slot_available(&txn, date, time, Some(id)).await?;
    }

    let mut service = None;
    if let Some(service_id) = patch.service_id {
        service = Some(find_service(&txn, service_id).await?);
    }

    let moved_to_cancelled =
        patch.status == Some(AppointmentStatus::Cancelled) && current.status != AppointmentStatus::Cancelled;

    let mut active: ActiveModel = current.into();
    apply_patch(&mut active, patch)?;
    if moved_to_cancelled {
        active.cancelled_by = Set(Some(CancelledBy::Admin));
        active.cancelled_at = Set(Some(Utc::now().fixed_offset()));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let updated = active.update(&txn).await.map_err(slot_write_error)?;
    if service.is_none() {
        service = Services::find_by_id(updated.service_id).one(&txn).await?;
    }
    txn.commit().await?;

    tracing::info!(appointment_id = %updated.id, "appointment updated");
    log_audit(
        &state.orm,
        Some(admin_id),
        "appointment_update",
        Some("appointments"),
        Some(serde_json::json!({ "appointment_id": updated.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Appointment updated",
        Appointment::from_entity(updated, service),
        None,
    ))
}

/// Terminal appointments cannot be cancelled. Cancelling frees the slot.
pub async fn cancel(
    state: &AppState,
    id: Uuid,
    payload: CancelAppointmentRequest,
    actor: CancelledBy,
    actor_id: Option<Uuid>,
) -> AppResult<ApiResponse<Appointment>> {
    let current = find_model(&state.orm, id).await?;

    match current.status {
        AppointmentStatus::Cancelled => {
            return Err(AppError::BadRequest(
                "Appointment is already cancelled".into(),
            ));
        }
        AppointmentStatus::Completed => {
            return Err(AppError::BadRequest(
                "A completed appointment cannot be cancelled".into(),
            ));
        }
        AppointmentStatus::NoShow => {
            return Err(AppError::BadRequest(
                "A no-show appointment cannot be cancelled".into(),
            ));
        }
        AppointmentStatus::Pending | AppointmentStatus::Confirmed => {}
    }

    let now = Utc::now().fixed_offset();
    let mut active: ActiveModel = current.into();
    active.status = Set(AppointmentStatus::Cancelled);
    active.cancellation_reason = Set(payload.reason);
    active.cancelled_by = Set(Some(actor));
    active.cancelled_at = Set(Some(now));
    active.updated_at = Set(now);
    let cancelled = active.update(&state.orm).await?;

    tracing::info!(
        appointment_id = %cancelled.id,
        cancelled_by = ?actor,
        "appointment cancelled"
    );
    log_audit(
        &state.orm,
        actor_id,
        "appointment_cancel",
        Some("appointments"),
        Some(serde_json::json!({ "appointment_id": cancelled.id })),
    )
    .await;

    let service = Services::find_by_id(cancelled.service_id)
        .one(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Appointment cancelled",
        Appointment::from_entity(cancelled, service),
        None,
    ))
}

/// Confirmed appointments for the current UTC date, earliest first.
pub async fn today(state: &AppState) -> AppResult<ApiResponse<AppointmentList>> {
    today_on(state, Utc::now().date_naive()).await
}

pub async fn today_on(state: &AppState, date: NaiveDate) -> AppResult<ApiResponse<AppointmentList>> {
    let models = Appointments::find()
        .filter(Column::AppointmentDate.eq(date))
        .filter(Column::Status.eq(AppointmentStatus::Confirmed))
        .order_by_asc(Column::AppointmentTime)
        .all(&state.orm)
        .await?;
    let items = with_services(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Today's appointments",
        AppointmentList { items },
        None,
    ))
}

pub async fn stats(
    state: &AppState,
    range: DateRangeQuery,
) -> AppResult<ApiResponse<AppointmentStats>> {
    let base = date_range_condition(range.start_date, range.end_date);

    let count_status = |status: AppointmentStatus| {
        Appointments::find()
            .filter(base.clone())
            .filter(Column::Status.eq(status))
            .count(&state.orm)
    };

    let stats = AppointmentStats {
        total: Appointments::find().filter(base.clone()).count(&state.orm).await? as i64,
        pending: count_status(AppointmentStatus::Pending).await? as i64,
        confirmed: count_status(AppointmentStatus::Confirmed).await? as i64,
        cancelled: count_status(AppointmentStatus::Cancelled).await? as i64,
        completed: count_status(AppointmentStatus::Completed).await? as i64,
        no_show: count_status(AppointmentStatus::NoShow).await? as i64,
    };

    Ok(ApiResponse::success("Appointment stats", stats, None))
}

/// Raw row lookup, used by handlers that check ownership before acting.
pub async fn find_model<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<AppointmentModel> {
    Appointments::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment"))
}

async fn find_service<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ServiceModel> {
    Services::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Service"))
}

async fn with_services<C: ConnectionTrait>(
    conn: &C,
    models: Vec<AppointmentModel>,
) -> AppResult<Vec<Appointment>> {
    let services = models.load_one(Services, conn).await?;
    Ok(models
        .into_iter()
        .zip(services)
        .map(|(appointment, service)| Appointment::from_entity(appointment, service))
        .collect())
}

fn new_appointment(
    payload: &CreateAppointmentRequest,
    time: NaiveTime,
    user_id: Option<Uuid>,
) -> ActiveModel {
    let now = Utc::now().fixed_offset();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        service_id: Set(payload.service_id),
        gift_card_id: Set(None),
        patient_name: Set(payload.patient_name.clone()),
        patient_email: Set(payload.patient_email.clone()),
        patient_phone: Set(payload.patient_phone.clone()),
        patient_dni: Set(payload.patient_dni.clone()),
        appointment_date: Set(payload.appointment_date),
        appointment_time: Set(time),
        status: Set(AppointmentStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        deposit_paid: Set(0),
        payment_id: Set(None),
        payment_method: Set(None),
        notes: Set(None),
        patient_notes: Set(payload.patient_notes.clone()),
        cancellation_reason: Set(None),
        created_by_admin: Set(false),
        cancelled_by: Set(None),
        reminder_24h_sent: Set(false),
        reminder_2h_sent: Set(false),
        confirmation_sent: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        cancelled_at: Set(None),
    }
}

fn apply_patch(active: &mut ActiveModel, patch: UpdateAppointmentRequest) -> AppResult<()> {
    if let Some(service_id) = patch.service_id {
        active.service_id = Set(service_id);
    }
    if let Some(date) = patch.appointment_date {
        active.appointment_date = Set(date);
    }
    if let Some(raw) = patch.appointment_time.as_deref() {
        active.appointment_time = Set(slot_time(raw)?);
    }
    if let Some(status) = patch.status {
        active.status = Set(status);
    }
    if let Some(payment_status) = patch.payment_status {
        active.payment_status = Set(payment_status);
    }
    if let Some(payment_method) = patch.payment_method {
        active.payment_method = Set(Some(payment_method));
    }
    if let Some(payment_id) = patch.payment_id {
        active.payment_id = Set(Some(payment_id));
    }
    if let Some(deposit_paid) = patch.deposit_paid {
        active.deposit_paid = Set(deposit_paid);
    }
    if let Some(name) = patch.patient_name {
        active.patient_name = Set(name);
    }
    if let Some(email) = patch.patient_email {
        active.patient_email = Set(email);
    }
    if let Some(phone) = patch.patient_phone {
        active.patient_phone = Set(phone);
    }
    if let Some(notes) = patch.notes {
        active.notes = Set(Some(notes));
    }
    if let Some(patient_notes) = patch.patient_notes {
        active.patient_notes = Set(Some(patient_notes));
    }
    Ok(())
}

fn date_range_condition(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Condition {
    let mut condition = Condition::all();
    if let Some(start) = start {
        condition = condition.add(Column::AppointmentDate.gte(start));
    }
    if let Some(end) = end {
        condition = condition.add(Column::AppointmentDate.lte(end));
    }
    condition
}

fn slot_time(raw: &str) -> AppResult<NaiveTime> {
    parse_slot_time(raw)
        .ok_or_else(|| AppError::BadRequest("Time must use the HH:mm format (e.g. 14:30)".into()))
}

fn status_label(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Pending => "pending",
        AppointmentStatus::Confirmed => "confirmed",
        AppointmentStatus::Cancelled => "cancelled",
        AppointmentStatus::Completed => "completed",
        AppointmentStatus::NoShow => "no-show",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_time_rejects_malformed_input() {
        assert!(slot_time("14:30").is_ok());
        assert!(matches!(slot_time("2pm"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn patch_sets_only_given_fields() {
        let mut active = ActiveModel {
            patient_name: Set("Ana".into()),
            ..Default::default()
        };
        let patch = UpdateAppointmentRequest {
            notes: Some("VIP".into()),
            appointment_time: Some("09:15".into()),
            ..Default::default()
        };
        apply_patch(&mut active, patch).unwrap();

        assert_eq!(active.patient_name, Set("Ana".to_string()));
        assert_eq!(active.notes, Set(Some("VIP".to_string())));
        assert_eq!(
            active.appointment_time,
            Set(NaiveTime::from_hms_opt(9, 15, 0).unwrap())
        );
    }
}
