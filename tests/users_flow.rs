mod common;

use clinic_booking_api::{
    dto::users::{CreateUserRequest, UpdateUserRequest},
    entity::sea_orm_active_enums::{AuthProvider, UserRole},
    error::AppError,
    services::user_service::{self, ACCOUNT_TAKEN},
};
use common::{create_admin, create_patient, setup, unique_email};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

fn unique_dni() -> String {
    format!("{:08}", Uuid::new_v4().as_u128() % 100_000_000)
}

#[tokio::test]
async fn admin_created_patient_has_no_password() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = create_admin(&app.state).await?;
    let email = unique_email("walkin");

    let user = user_service::create(
        &app.state,
        CreateUserRequest {
            email: email.clone(),
            full_name: "Walk In".into(),
            phone: Some("1155550000".into()),
            dni: None,
        },
        admin.id,
    )
    .await?
    .data
    .expect("user");
    assert_eq!(user.role, UserRole::Patient);
    assert_eq!(user.auth_provider, AuthProvider::Local);

    let stored = user_service::find_by_email(&app.state.orm, &email)
        .await?
        .expect("stored user");
    assert!(stored.password_hash.is_none());

    let duplicate = user_service::create(
        &app.state,
        CreateUserRequest {
            email,
            full_name: "Walk In".into(),
            phone: None,
            dni: None,
        },
        admin.id,
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn update_keeps_dni_unique() -> anyhow::Result<()> {
    let app = setup().await?;
    let first = create_patient(&app.state, &unique_email("first")).await?;
    let second = create_patient(&app.state, &unique_email("second")).await?;
    let dni = unique_dni();

    user_service::update(
        &app.state,
        first.id,
        UpdateUserRequest {
            dni: Some(dni.clone()),
            ..Default::default()
        },
    )
    .await?;

    // Re-sending one's own DNI is fine.
    let same = user_service::update(
        &app.state,
        first.id,
        UpdateUserRequest {
            dni: Some(dni.clone()),
            full_name: Some("Renamed Patient".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(same.full_name, "Renamed Patient");

    let taken = user_service::update(
        &app.state,
        second.id,
        UpdateUserRequest {
            dni: Some(dni),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(taken, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn remove_soft_deletes_patients_but_not_admins() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = create_admin(&app.state).await?;
    let patient = create_patient(&app.state, &unique_email("gone")).await?;

    let before = user_service::stats(&app.state).await?.data.expect("stats");

    user_service::remove(&app.state, patient.id, admin.id).await?;
    let lookup = user_service::find_one(&app.state, patient.id).await;
    assert!(matches!(lookup, Err(AppError::NotFound(_))));

    let after = user_service::stats(&app.state).await?.data.expect("stats");
    assert_eq!(after.total, before.total - 1);
    assert_eq!(after.patients, before.patients - 1);

    let protected = user_service::remove(&app.state, admin.id, admin.id).await;
    assert!(matches!(protected, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn racing_dni_insert_gets_neutral_conflict() -> anyhow::Result<()> {
    let app = setup().await?;
    let dni = unique_dni();

    let mut first = user_service::new_patient(
        unique_email("race-a"),
        "First Patient".into(),
        None,
        AuthProvider::Local,
    );
    first.dni = Set(Some(dni.clone()));
    first.insert(&app.state.orm).await?;

    // Same DNI, fresh email: only the store's unique index can catch it.
    let mut second = user_service::new_patient(
        unique_email("race-b"),
        "Second Patient".into(),
        None,
        AuthProvider::Local,
    );
    second.dni = Set(Some(dni));
    let result = second
        .insert(&app.state.orm)
        .await
        .map_err(|e| AppError::unique_violation_as(e, ACCOUNT_TAKEN));
    assert!(matches!(result, Err(AppError::Conflict(msg)) if msg == ACCOUNT_TAKEN));
    Ok(())
}
