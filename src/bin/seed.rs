use chrono::Utc;
use clinic_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        Services, Users,
        sea_orm_active_enums::{AuthProvider, UserRole},
        services::{ActiveModel as ServiceActive, Column as ServiceCol},
        users::{ActiveModel as UserActive, Column as UserCol},
    },
    services::password::hash_password,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

struct StarterService {
    name: &'static str,
    description: &'static str,
    duration_minutes: i32,
    price: i64,
    deposit_amount: i64,
}

const STARTER_SERVICES: &[StarterService] = &[
    StarterService {
        name: "Initial consultation",
        description: "Assessment and treatment plan",
        duration_minutes: 30,
        price: 10000,
        deposit_amount: 2000,
    },
    StarterService {
        name: "Deep cleansing facial",
        description: "Exfoliation, extraction and hydrating mask",
        duration_minutes: 60,
        price: 15000,
        deposit_amount: 3000,
    },
    StarterService {
        name: "Relaxing massage",
        description: "Full body massage",
        duration_minutes: 60,
        price: 18000,
        deposit_amount: 4000,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "Admin123!".to_string());
    let admin_id = ensure_admin(&orm, &email, &password).await?;
    let created = seed_services(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, services created: {created}");
    Ok(())
}

/// The only path that creates or promotes an admin account.
async fn ensure_admin(orm: &DatabaseConnection, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;
    let now = Utc::now().fixed_offset();

    let existing = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?;

    let admin = match existing {
        Some(user) => {
            let mut active: UserActive = user.into();
            active.role = Set(UserRole::Admin);
            active.password_hash = Set(Some(password_hash));
            active.is_active = Set(true);
            active.email_verified = Set(true);
            active.updated_at = Set(now);
            active.update(orm).await?
        }
        None => {
            UserActive {
                id: Set(Uuid::new_v4()),
                email: Set(email.to_string()),
                password_hash: Set(Some(password_hash)),
                email_verified: Set(true),
                google_id: Set(None),
                avatar_url: Set(None),
                auth_provider: Set(AuthProvider::Local),
                role: Set(UserRole::Admin),
                full_name: Set("Administrator".to_string()),
                phone: Set(None),
                dni: Set(None),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(orm)
            .await?
        }
    };

    println!("Ensured admin {email}");
    Ok(admin.id)
}

async fn seed_services(orm: &DatabaseConnection) -> anyhow::Result<usize> {
    let mut created = 0;
    for (index, starter) in STARTER_SERVICES.iter().enumerate() {
        let exists = Services::find()
            .filter(ServiceCol::Name.eq(starter.name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let now = Utc::now().fixed_offset();
        ServiceActive {
            id: Set(Uuid::new_v4()),
            name: Set(starter.name.to_string()),
            description: Set(Some(starter.description.to_string())),
            duration_minutes: Set(starter.duration_minutes),
            price: Set(starter.price),
            deposit_amount: Set(starter.deposit_amount),
            is_active: Set(true),
            display_order: Set(index as i32),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(orm)
        .await?;
        created += 1;
    }
    Ok(created)
}
