use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    appointments::Model as AppointmentModel,
    sea_orm_active_enums::{
        AppointmentStatus, AuthProvider, CancelledBy, PaymentMethod, PaymentStatus, UserRole,
    },
    services::Model as ServiceModel,
    users::Model as UserModel,
};

/// User as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub auth_provider: AuthProvider,
    pub email_verified: bool,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub dni: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            role: model.role,
            auth_provider: model.auth_provider,
            email_verified: model.email_verified,
            avatar_url: model.avatar_url,
            phone: model.phone,
            dni: model.dni,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Compact user view embedded in auth responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub avatar_url: Option<String>,
}

impl From<&UserModel> for PublicUser {
    fn from(model: &UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email.clone(),
            full_name: model.full_name.clone(),
            role: model.role,
            email_verified: model.email_verified,
            avatar_url: model.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub price: i64,
    pub deposit_amount: i64,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceModel> for Service {
    fn from(model: ServiceModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            duration_minutes: model.duration_minutes,
            price: model.price,
            deposit_amount: model.deposit_amount,
            is_active: model.is_active,
            display_order: model.display_order,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub service_id: Uuid,
    pub service: Option<Service>,
    pub gift_card_id: Option<Uuid>,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub patient_dni: Option<String>,
    pub appointment_date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub deposit_paid: i64,
    pub payment_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub patient_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_by_admin: bool,
    pub cancelled_by: Option<CancelledBy>,
    pub confirmation_sent: bool,
    pub reminder_24h_sent: bool,
    pub reminder_2h_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn from_entity(model: AppointmentModel, service: Option<ServiceModel>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            service_id: model.service_id,
            service: service.map(Service::from),
            gift_card_id: model.gift_card_id,
            patient_name: model.patient_name,
            patient_email: model.patient_email,
            patient_phone: model.patient_phone,
            patient_dni: model.patient_dni,
            appointment_date: model.appointment_date,
            appointment_time: model.appointment_time,
            status: model.status,
            payment_status: model.payment_status,
            deposit_paid: model.deposit_paid,
            payment_id: model.payment_id,
            payment_method: model.payment_method,
            notes: model.notes,
            patient_notes: model.patient_notes,
            cancellation_reason: model.cancellation_reason,
            created_by_admin: model.created_by_admin,
            cancelled_by: model.cancelled_by,
            confirmation_sent: model.confirmation_sent,
            reminder_24h_sent: model.reminder_24h_sent,
            reminder_2h_sent: model.reminder_2h_sent,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            cancelled_at: model.cancelled_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl From<AppointmentModel> for Appointment {
    fn from(model: AppointmentModel) -> Self {
        Appointment::from_entity(model, None)
    }
}
