use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList, UserStats},
    entity::{
        Users,
        sea_orm_active_enums::{AuthProvider, UserRole},
        users::{ActiveModel, Column, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, MessageData, Meta},
    routes::params::UserListQuery,
    state::AppState,
};

pub const EMAIL_TAKEN: &str = "Email is already registered";
pub const DNI_TAKEN: &str = "DNI is already registered";
/// Insert-time fallback when a concurrent write wins a unique column.
pub const ACCOUNT_TAKEN: &str = "Email or DNI is already registered";

pub async fn find_by_email<C: ConnectionTrait>(conn: &C, email: &str) -> AppResult<Option<UserModel>> {
    Ok(Users::find().filter(Column::Email.eq(email)).one(conn).await?)
}

pub async fn find_by_dni<C: ConnectionTrait>(conn: &C, dni: &str) -> AppResult<Option<UserModel>> {
    Ok(Users::find().filter(Column::Dni.eq(dni)).one(conn).await?)
}

pub async fn find_by_google_id<C: ConnectionTrait>(
    conn: &C,
    google_id: &str,
) -> AppResult<Option<UserModel>> {
    Ok(Users::find()
        .filter(Column::GoogleId.eq(google_id))
        .one(conn)
        .await?)
}

/// Soft-deleted accounts are invisible here.
pub async fn find_active<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn ensure_email_free<C: ConnectionTrait>(conn: &C, email: &str) -> AppResult<()> {
    if find_by_email(conn, email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }
    Ok(())
}

/// `owner` is the user allowed to keep the DNI, if any.
pub async fn ensure_dni_free<C: ConnectionTrait>(
    conn: &C,
    dni: &str,
    owner: Option<Uuid>,
) -> AppResult<()> {
    match find_by_dni(conn, dni).await? {
        Some(existing) if Some(existing.id) != owner => {
            Err(AppError::Conflict(DNI_TAKEN.into()))
        }
        _ => Ok(()),
    }
}

/// Fresh patient row. Admins are only ever created by the seed binary.
pub fn new_patient(
    email: String,
    full_name: String,
    password_hash: Option<String>,
    auth_provider: AuthProvider,
) -> ActiveModel {
    let now = Utc::now().fixed_offset();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        email_verified: Set(false),
        google_id: Set(None),
        avatar_url: Set(None),
        auth_provider: Set(auth_provider),
        role: Set(UserRole::Patient),
        full_name: Set(full_name),
        phone: Set(None),
        dni: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

pub async fn create(
    state: &AppState,
    payload: CreateUserRequest,
    admin_id: Uuid,
) -> AppResult<ApiResponse<User>> {
    ensure_email_free(&state.orm, &payload.email).await?;
    if let Some(dni) = payload.dni.as_deref() {
        ensure_dni_free(&state.orm, dni, None).await?;
    }

    let mut active = new_patient(payload.email, payload.full_name, None, AuthProvider::Local);
    active.phone = Set(payload.phone);
    active.dni = Set(payload.dni);
    let user = active
        .insert(&state.orm)
        .await
        .map_err(|e| AppError::unique_violation_as(e, ACCOUNT_TAKEN))?;

    log_audit(
        &state.orm,
        Some(admin_id),
        "user_create",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success("User created", User::from(user), None))
}

/// Active users, newest first.
pub async fn find_all(state: &AppState, query: UserListQuery) -> AppResult<ApiResponse<UserList>> {
    let pagination = query.pagination();

    let mut finder = Users::find().filter(Column::IsActive.eq(true));
    if let Some(role) = query.role {
        finder = finder.filter(Column::Role.eq(role));
    }
    let finder = finder.order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(pagination.limit as u64)
        .offset(pagination.offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let meta = Meta::new(pagination.page, pagination.limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn find_one(state: &AppState, id: Uuid) -> AppResult<ApiResponse<User>> {
    let user = find_active(&state.orm, id).await?;
    Ok(ApiResponse::success("User", User::from(user), None))
}

pub async fn update(
    state: &AppState,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let current = find_active(&state.orm, id).await?;

    if let Some(dni) = payload.dni.as_deref() {
        if current.dni.as_deref() != Some(dni) {
            ensure_dni_free(&state.orm, dni, Some(id)).await?;
        }
    }

    let mut active: ActiveModel = current.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(dni) = payload.dni {
        active.dni = Set(Some(dni));
    }
    if let Some(avatar_url) = payload.avatar_url {
        active.avatar_url = Set(Some(avatar_url));
    }
    active.updated_at = Set(Utc::now().fixed_offset());

    let user = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::unique_violation_as(e, DNI_TAKEN))?;

    Ok(ApiResponse::success("User updated", User::from(user), None))
}

/// Soft delete. Admin accounts cannot be removed.
pub async fn remove(
    state: &AppState,
    id: Uuid,
    admin_id: Uuid,
) -> AppResult<ApiResponse<MessageData>> {
    let current = find_active(&state.orm, id).await?;
    if current.is_admin() {
        return Err(AppError::BadRequest(
            "Administrator accounts cannot be deleted".into(),
        ));
    }

    let mut active: ActiveModel = current.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().fixed_offset());
    let user = active.update(&state.orm).await?;

    log_audit(
        &state.orm,
        Some(admin_id),
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "User deleted",
        MessageData::new("User deactivated"),
        None,
    ))
}

pub async fn stats(state: &AppState) -> AppResult<ApiResponse<UserStats>> {
    let active = || Users::find().filter(Column::IsActive.eq(true));

    let stats = UserStats {
        total: active().count(&state.orm).await? as i64,
        patients: active()
            .filter(Column::Role.eq(UserRole::Patient))
            .count(&state.orm)
            .await? as i64,
        admins: active()
            .filter(Column::Role.eq(UserRole::Admin))
            .count(&state.orm)
            .await? as i64,
        verified: active()
            .filter(Column::EmailVerified.eq(true))
            .count(&state.orm)
            .await? as i64,
        google_users: active()
            .filter(Column::GoogleId.is_not_null())
            .count(&state.orm)
            .await? as i64,
    };

    Ok(ApiResponse::success("User stats", stats, None))
}
