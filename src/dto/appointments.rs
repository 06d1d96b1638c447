use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::rules::{validate_dni, validate_slot_time};
use crate::{
    entity::sea_orm_active_enums::{AppointmentStatus, PaymentMethod, PaymentStatus},
    models::Appointment,
};

/// Public booking. Works for guests and signed-in patients alike.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateAppointmentRequest {
    pub service_id: Uuid,
    #[validate(length(min = 3, max = 255, message = "Patient name must be 3 to 255 characters"))]
    pub patient_name: String,
    #[validate(email(message = "Patient email must be valid"))]
    pub patient_email: String,
    #[validate(length(min = 8, message = "Patient phone must have at least 8 characters"))]
    pub patient_phone: String,
    #[validate(custom(function = "validate_dni"))]
    pub patient_dni: Option<String>,
    #[schema(value_type = String, format = Date, example = "2025-03-15")]
    pub appointment_date: NaiveDate,
    #[schema(example = "14:30")]
    #[validate(custom(function = "validate_slot_time"))]
    pub appointment_time: String,
    #[validate(length(max = 1000, message = "Patient notes cannot exceed 1000 characters"))]
    pub patient_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AdminCreateAppointmentRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub appointment: CreateAppointmentRequest,
    /// Staff-only notes, never shown to the patient.
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateAppointmentRequest {
    pub service_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Date)]
    pub appointment_date: Option<NaiveDate>,
    #[validate(custom(function = "validate_slot_time"))]
    pub appointment_time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_id: Option<String>,
    #[validate(range(min = 0, message = "Deposit paid cannot be negative"))]
    pub deposit_paid: Option<i64>,
    #[validate(length(min = 3, max = 255, message = "Patient name must be 3 to 255 characters"))]
    pub patient_name: Option<String>,
    #[validate(email(message = "Patient email must be valid"))]
    pub patient_email: Option<String>,
    #[validate(length(min = 8, message = "Patient phone must have at least 8 characters"))]
    pub patient_phone: Option<String>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
    #[validate(length(max = 1000, message = "Patient notes cannot exceed 1000 characters"))]
    pub patient_notes: Option<String>,
}

impl UpdateAppointmentRequest {
    pub fn touches_slot(&self) -> bool {
        self.appointment_date.is_some() || self.appointment_time.is_some()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CancelAppointmentRequest {
    #[validate(length(max = 500, message = "Cancellation reason cannot exceed 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentList {
    pub items: Vec<Appointment>,
}

#[derive(Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct AppointmentStats {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub completed: i64,
    pub no_show: i64,
}
