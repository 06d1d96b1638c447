use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::Service;

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_deposit_within_price"))]
pub struct CreateServiceRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be 3 to 255 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 15, message = "Duration must be at least 15 minutes"))]
    pub duration_minutes: i32,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: i64,
    #[validate(range(min = 0, message = "Deposit cannot be negative"))]
    pub deposit_amount: i64,
    pub is_active: Option<bool>,
    #[validate(range(min = 0, message = "Display order cannot be negative"))]
    pub display_order: Option<i32>,
}

fn validate_deposit_within_price(req: &CreateServiceRequest) -> Result<(), ValidationError> {
    if req.deposit_amount > req.price {
        let mut err = ValidationError::new("deposit_exceeds_price");
        err.message = Some("Deposit cannot exceed the service price".into());
        return Err(err);
    }
    Ok(())
}

/// Partial update. Deposit against price is checked in the service layer,
/// where the stored values are known.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 3, max = 255, message = "Name must be 3 to 255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 15, message = "Duration must be at least 15 minutes"))]
    pub duration_minutes: Option<i32>,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: Option<i64>,
    #[validate(range(min = 0, message = "Deposit cannot be negative"))]
    pub deposit_amount: Option<i64>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0, message = "Display order cannot be negative"))]
    pub display_order: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReorderServicesRequest {
    /// Service ids in their new display order.
    #[validate(length(min = 1, message = "At least one service id is required"))]
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceList {
    pub items: Vec<Service>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct ServiceStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub average_price: i64,
    pub average_deposit: i64,
}
