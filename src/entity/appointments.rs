use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::{AppointmentStatus, CancelledBy, PaymentMethod, PaymentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub service_id: Uuid,
    pub gift_card_id: Option<Uuid>,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub patient_dni: Option<String>,
    pub appointment_date: Date,
    pub appointment_time: Time,
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
    #[sea_orm(column_name = "reminder_24h_sent")]
    pub reminder_24h_sent: bool,
    #[sea_orm(column_name = "reminder_2h_sent")]
    pub reminder_2h_sent: bool,
    pub confirmation_sent: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub cancelled_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::services::Entity",
        from = "Column::ServiceId",
        to = "super::services::Column::Id",
        on_delete = "Cascade"
    )]
    Services,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Services.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
