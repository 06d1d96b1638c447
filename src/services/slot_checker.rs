use chrono::{NaiveDate, NaiveTime};
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{Appointments, appointments::Column, sea_orm_active_enums::AppointmentStatus},
    error::{AppError, AppResult},
};

pub const SLOT_TAKEN: &str = "This time slot is already booked";

/// Fails with `Conflict` when a non-cancelled appointment other than
/// `exclude_id` already holds `(date, time)`.
pub async fn ensure_slot_available<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
    time: NaiveTime,
    exclude_id: Option<Uuid>,
) -> AppResult<()> {
    let mut condition = Condition::all()
        .add(Column::AppointmentDate.eq(date))
        .add(Column::AppointmentTime.eq(time))
        .add(Column::Status.ne(AppointmentStatus::Cancelled));
    if let Some(id) = exclude_id {
        condition = condition.add(Column::Id.ne(id));
    }

    let taken = Appointments::find().filter(condition).count(conn).await?;
    if taken > 0 {
        return Err(AppError::Conflict(SLOT_TAKEN.into()));
    }
    Ok(())
}

/// The partial unique index on the slot catches races the read above cannot.
pub fn slot_write_error(err: DbErr) -> AppError {
    AppError::unique_violation_as(err, SLOT_TAKEN)
}
