mod common;

use clinic_booking_api::{
    dto::services::{CreateServiceRequest, ReorderServicesRequest, UpdateServiceRequest},
    error::AppError,
    routes::params::ServiceListQuery,
    services::catalog_service,
};
use common::{create_admin, create_service, setup};
use uuid::Uuid;

fn unique_name(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}

#[tokio::test]
async fn deposit_cannot_exceed_price() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = create_admin(&app.state).await?;

    let create = catalog_service::create(
        &app.state,
        CreateServiceRequest {
            name: unique_name("Facial"),
            description: None,
            duration_minutes: 60,
            price: 1000,
            deposit_amount: 1500,
            is_active: None,
            display_order: None,
        },
        admin.id,
    )
    .await;
    assert!(matches!(create, Err(AppError::BadRequest(_))));

    let service = create_service(&app.state, admin.id, &unique_name("Facial"), 15000, 3000).await?;

    let raise_deposit = catalog_service::update(
        &app.state,
        service.id,
        UpdateServiceRequest {
            deposit_amount: Some(20000),
            ..Default::default()
        },
        admin.id,
    )
    .await;
    assert!(matches!(raise_deposit, Err(AppError::BadRequest(_))));

    let lower_price = catalog_service::update(
        &app.state,
        service.id,
        UpdateServiceRequest {
            price: Some(2000),
            ..Default::default()
        },
        admin.id,
    )
    .await;
    assert!(matches!(lower_price, Err(AppError::BadRequest(_))));

    let both = catalog_service::update(
        &app.state,
        service.id,
        UpdateServiceRequest {
            price: Some(2000),
            deposit_amount: Some(500),
            ..Default::default()
        },
        admin.id,
    )
    .await?
    .data
    .expect("service");
    assert_eq!(both.price, 2000);
    assert_eq!(both.deposit_amount, 500);
    Ok(())
}

#[tokio::test]
async fn reorder_rewrites_display_order() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = create_admin(&app.state).await?;
    let a = create_service(&app.state, admin.id, &unique_name("A"), 1000, 0).await?;
    let b = create_service(&app.state, admin.id, &unique_name("B"), 1000, 0).await?;
    let c = create_service(&app.state, admin.id, &unique_name("C"), 1000, 0).await?;

    catalog_service::reorder(
        &app.state,
        ReorderServicesRequest {
            service_ids: vec![b.id, a.id, c.id],
        },
        admin.id,
    )
    .await?;

    for (expected, id) in [(0, b.id), (1, a.id), (2, c.id)] {
        let service = catalog_service::find_one(&app.state, id)
            .await?
            .data
            .expect("service");
        assert_eq!(service.display_order, expected);
    }

    let listed = catalog_service::find_all(
        &app.state,
        ServiceListQuery {
            limit: Some(100),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    let position = |id: Uuid| listed.items.iter().position(|s| s.id == id);
    if let (Some(pb), Some(pa), Some(pc)) = (position(b.id), position(a.id), position(c.id)) {
        assert!(pb < pa && pa < pc);
    }
    Ok(())
}

#[tokio::test]
async fn reorder_with_unknown_id_changes_nothing() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = create_admin(&app.state).await?;
    let a = create_service(&app.state, admin.id, &unique_name("A"), 1000, 0).await?;
    let b = create_service(&app.state, admin.id, &unique_name("B"), 1000, 0).await?;
    catalog_service::reorder(
        &app.state,
        ReorderServicesRequest {
            service_ids: vec![a.id, b.id],
        },
        admin.id,
    )
    .await?;

    let result = catalog_service::reorder(
        &app.state,
        ReorderServicesRequest {
            service_ids: vec![b.id, Uuid::new_v4(), a.id],
        },
        admin.id,
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let b_after = catalog_service::find_one(&app.state, b.id)
        .await?
        .data
        .expect("service");
    assert_eq!(b_after.display_order, 1);

    let empty = catalog_service::reorder(
        &app.state,
        ReorderServicesRequest { service_ids: vec![] },
        admin.id,
    )
    .await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn remove_deactivates_and_activate_restores() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = create_admin(&app.state).await?;
    let service = create_service(&app.state, admin.id, &unique_name("Peel"), 5000, 1000).await?;

    catalog_service::remove(&app.state, service.id, admin.id).await?;
    let hidden = catalog_service::find_one(&app.state, service.id)
        .await?
        .data
        .expect("service");
    assert!(!hidden.is_active);

    let active_only = catalog_service::find_all(
        &app.state,
        ServiceListQuery {
            limit: Some(100),
            is_active: Some(true),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    assert!(active_only.items.iter().all(|s| s.id != service.id));

    let restored = catalog_service::activate(&app.state, service.id, admin.id)
        .await?
        .data
        .expect("service");
    assert!(restored.is_active);

    let missing = catalog_service::remove(&app.state, Uuid::new_v4(), admin.id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn stats_split_active_and_inactive() -> anyhow::Result<()> {
    let app = setup().await?;
    let admin = create_admin(&app.state).await?;

    let before = catalog_service::stats(&app.state).await?.data.expect("stats");
    let service = create_service(&app.state, admin.id, &unique_name("Stat"), 1000, 100).await?;
    create_service(&app.state, admin.id, &unique_name("Stat"), 3000, 300).await?;
    catalog_service::remove(&app.state, service.id, admin.id).await?;

    let after = catalog_service::stats(&app.state).await?.data.expect("stats");
    assert_eq!(after.total, before.total + 2);
    assert_eq!(after.active, before.active + 1);
    assert_eq!(after.inactive, before.inactive + 1);
    assert_eq!(after.total, after.active + after.inactive);
    Ok(())
}
