use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        appointments::{
            AdminCreateAppointmentRequest, AppointmentList, AppointmentStats,
            CancelAppointmentRequest, CreateAppointmentRequest, UpdateAppointmentRequest,
        },
        auth::{
            AuthResponse, ForgotPasswordRequest, GoogleAuthRequest, LoginRequest,
            RegisterRequest, ResetPasswordRequest, VerifyEmailRequest,
        },
        services::{
            CreateServiceRequest, ReorderServicesRequest, ServiceList, ServiceStats,
            UpdateServiceRequest,
        },
        users::{CreateUserRequest, UpdateUserRequest, UserList, UserStats},
    },
    entity::sea_orm_active_enums::{
        AppointmentStatus, AuthProvider, CancelledBy, PaymentMethod, PaymentStatus, UserRole,
    },
    models::{Appointment, PublicUser, Service, User},
    response::{ApiResponse, MessageData, Meta},
    routes::{appointments, auth, catalog, health, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Clinic Booking API", description = "Accounts, service catalog and appointment booking"),
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::google_login,
        auth::verify_email,
        auth::forgot_password,
        auth::reset_password,
        auth::profile,
        auth::resend_verification,
        appointments::create_appointment,
        appointments::admin_create_appointment,
        appointments::list_appointments,
        appointments::my_appointments,
        appointments::today_appointments,
        appointments::appointment_stats,
        appointments::get_appointment,
        appointments::update_appointment,
        appointments::cancel_appointment,
        catalog::create_service,
        catalog::list_services,
        catalog::service_stats,
        catalog::reorder_services,
        catalog::get_service,
        catalog::update_service,
        catalog::delete_service,
        catalog::activate_service,
        users::list_users,
        users::create_user,
        users::user_stats,
        users::current_user,
        users::get_user,
        users::update_user,
        users::delete_user
    ),
    components(
        schemas(
            User,
            PublicUser,
            Service,
            Appointment,
            UserRole,
            AuthProvider,
            AppointmentStatus,
            PaymentStatus,
            PaymentMethod,
            CancelledBy,
            RegisterRequest,
            LoginRequest,
            GoogleAuthRequest,
            VerifyEmailRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            AuthResponse,
            CreateAppointmentRequest,
            AdminCreateAppointmentRequest,
            UpdateAppointmentRequest,
            CancelAppointmentRequest,
            AppointmentList,
            AppointmentStats,
            CreateServiceRequest,
            UpdateServiceRequest,
            ReorderServicesRequest,
            ServiceList,
            ServiceStats,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            UserStats,
            MessageData,
            Meta,
            ApiResponse<AuthResponse>,
            ApiResponse<Appointment>,
            ApiResponse<AppointmentList>,
            ApiResponse<Service>,
            ApiResponse<ServiceList>,
            ApiResponse<User>,
            ApiResponse<MessageData>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and account recovery"),
        (name = "Appointments", description = "Slot booking and appointment lifecycle"),
        (name = "Services", description = "Bookable service catalog"),
        (name = "Users", description = "Patient and staff accounts"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
