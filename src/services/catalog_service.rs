use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::services::{
        CreateServiceRequest, ReorderServicesRequest, ServiceList, ServiceStats,
        UpdateServiceRequest,
    },
    entity::{
        Services,
        services::{ActiveModel, Column, Model as ServiceModel},
    },
    error::{AppError, AppResult},
    models::Service,
    response::{ApiResponse, MessageData, Meta},
    routes::params::ServiceListQuery,
    state::AppState,
};

const DEPOSIT_ABOVE_PRICE: &str = "Deposit cannot exceed the service price";

pub async fn create(
    state: &AppState,
    payload: CreateServiceRequest,
    admin_id: Uuid,
) -> AppResult<ApiResponse<Service>> {
    ensure_deposit_within_price(payload.deposit_amount, payload.price)?;

    let now = Utc::now().fixed_offset();
    let service = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        duration_minutes: Set(payload.duration_minutes),
        price: Set(payload.price),
        deposit_amount: Set(payload.deposit_amount),
        is_active: Set(payload.is_active.unwrap_or(true)),
        display_order: Set(payload.display_order.unwrap_or(0)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(service_id = %service.id, name = %service.name, "service created");
    log_audit(
        &state.orm,
        Some(admin_id),
        "service_create",
        Some("services"),
        Some(serde_json::json!({ "service_id": service.id })),
    )
    .await;

    Ok(ApiResponse::success("Service created", Service::from(service), None))
}

/// Catalog ordered by `display_order`, then name.
pub async fn find_all(
    state: &AppState,
    query: ServiceListQuery,
) -> AppResult<ApiResponse<ServiceList>> {
    let pagination = query.pagination();

    let mut finder = Services::find();
    if let Some(is_active) = query.is_active {
        finder = finder.filter(Column::IsActive.eq(is_active));
    }
    let finder = finder
        .order_by_asc(Column::DisplayOrder)
        .order_by_asc(Column::Name);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Service::from)
        .collect();

    let meta = Meta::new(pagination.page, pagination.limit, total);
    Ok(ApiResponse::success("Services", ServiceList { items }, Some(meta)))
}

pub async fn find_one(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Service>> {
    let service = find_model(state, id).await?;
    Ok(ApiResponse::success("Service", Service::from(service), None))
}

/// Deposit is checked against the merged result, so lowering only the price
/// below the stored deposit is rejected too.
pub async fn update(
    state: &AppState,
    id: Uuid,
    payload: UpdateServiceRequest,
    admin_id: Uuid,
) -> AppResult<ApiResponse<Service>> {
    let current = find_model(state, id).await?;

    let price = payload.price.unwrap_or(current.price);
    let deposit = payload.deposit_amount.unwrap_or(current.deposit_amount);
    ensure_deposit_within_price(deposit, price)?;

    let mut active: ActiveModel = current.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(duration) = payload.duration_minutes {
        active.duration_minutes = Set(duration);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(display_order) = payload.display_order {
        active.display_order = Set(display_order);
    }
    active.price = Set(price);
    active.deposit_amount = Set(deposit);
    active.updated_at = Set(Utc::now().fixed_offset());

    let service = active.update(&state.orm).await?;

    tracing::info!(service_id = %service.id, "service updated");
    log_audit(
        &state.orm,
        Some(admin_id),
        "service_update",
        Some("services"),
        Some(serde_json::json!({ "service_id": service.id })),
    )
    .await;

    Ok(ApiResponse::success("Service updated", Service::from(service), None))
}

/// Soft delete: the service is deactivated, never removed.
pub async fn remove(
    state: &AppState,
    id: Uuid,
    admin_id: Uuid,
) -> AppResult<ApiResponse<MessageData>> {
    let service = set_active(state, id, false).await?;

    tracing::info!(service_id = %service.id, "service deactivated");
    log_audit(
        &state.orm,
        Some(admin_id),
        "service_delete",
        Some("services"),
        Some(serde_json::json!({ "service_id": service.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Service deactivated",
        MessageData::new(format!("Service {} deactivated", service.name)),
        None,
    ))
}

pub async fn activate(
    state: &AppState,
    id: Uuid,
    admin_id: Uuid,
) -> AppResult<ApiResponse<Service>> {
    let service = set_active(state, id, true).await?;

    tracing::info!(service_id = %service.id, "service activated");
    log_audit(
        &state.orm,
        Some(admin_id),
        "service_activate",
        Some("services"),
        Some(serde_json::json!({ "service_id": service.id })),
    )
    .await;

    Ok(ApiResponse::success("Service activated", Service::from(service), None))
}

pub async fn stats(state: &AppState) -> AppResult<ApiResponse<ServiceStats>> {
    let services = Services::find().all(&state.orm).await?;
    Ok(ApiResponse::success(
        "Service stats",
        compute_stats(&services),
        None,
    ))
}

/// Rewrites `display_order` to each id's position in the list, all or nothing.
pub async fn reorder(
    state: &AppState,
    payload: ReorderServicesRequest,
    admin_id: Uuid,
) -> AppResult<ApiResponse<MessageData>> {
    if payload.service_ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one service id is required".into(),
        ));
    }

    let txn = state.orm.begin().await?;
    let now = Utc::now().fixed_offset();
    for (index, id) in payload.service_ids.iter().enumerate() {
        let result = Services::update_many()
            .col_expr(Column::DisplayOrder, Expr::value(index as i32))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(*id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Service {id} not found")));
        }
    }
    txn.commit().await?;

    let count = payload.service_ids.len();
    tracing::info!(count, "services reordered");
    log_audit(
        &state.orm,
        Some(admin_id),
        "service_reorder",
        Some("services"),
        Some(serde_json::json!({ "service_ids": payload.service_ids })),
    )
    .await;

    Ok(ApiResponse::success(
        "Services reordered",
        MessageData::new(format!("{count} services reordered")),
        None,
    ))
}

async fn find_model(state: &AppState, id: Uuid) -> AppResult<ServiceModel> {
    Services::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Service"))
}

async fn set_active(state: &AppState, id: Uuid, is_active: bool) -> AppResult<ServiceModel> {
    let current = find_model(state, id).await?;
    let mut active: ActiveModel = current.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now().fixed_offset());
    Ok(active.update(&state.orm).await?)
}

fn ensure_deposit_within_price(deposit: i64, price: i64) -> AppResult<()> {
    if deposit > price {
        return Err(AppError::BadRequest(DEPOSIT_ABOVE_PRICE.into()));
    }
    Ok(())
}

fn compute_stats(services: &[ServiceModel]) -> ServiceStats {
    let total = services.len() as i64;
    let active = services.iter().filter(|s| s.is_active).count() as i64;
    let average = |sum: i64| {
        if total == 0 {
            0
        } else {
            (sum as f64 / total as f64).round() as i64
        }
    };

    ServiceStats {
        total,
        active,
        inactive: total - active,
        average_price: average(services.iter().map(|s| s.price).sum()),
        average_deposit: average(services.iter().map(|s| s.deposit_amount).sum()),
    }
}
