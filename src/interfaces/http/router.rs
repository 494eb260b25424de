//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    HistoryService, LotService, OccupancyService, ReportService, UserService,
};
use crate::domain::Storage;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::health::HealthState;
use crate::interfaces::http::modules::{
    analytics, auth, health, history, lots, parking, reports, users,
};

/// Shared state for all API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub storage: Arc<dyn Storage>,
    pub jwt_config: JwtConfig,
    pub lots: Arc<LotService>,
    pub occupancy: Arc<OccupancyService>,
    pub history: Arc<HistoryService>,
    pub users: Arc<UserService>,
    pub reports: Arc<ReportService>,
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::handlers::health_check,
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::get_current_user,
        // Lots
        lots::handlers::list_lots,
        lots::handlers::search_lots,
        lots::handlers::get_lot,
        lots::handlers::create_lot,
        lots::handlers::update_lot,
        lots::handlers::delete_lot,
        lots::handlers::add_slot,
        lots::handlers::delete_slot,
        // Parking
        parking::handlers::occupy_slot,
        parking::handlers::release_slot,
        // History
        history::handlers::get_history,
        history::handlers::get_summary,
        // Analytics
        analytics::handlers::admin_summary,
        // Users
        users::handlers::list_users,
        users::handlers::ban_user,
        users::handlers::unban_user,
        users::handlers::get_profile,
        users::handlers::update_profile,
        // Reports
        reports::handlers::request_export,
        reports::handlers::export_status,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            // Auth
            auth::dto::RegisterRequest,
            auth::dto::LoginRequest,
            auth::dto::LoginResponse,
            auth::dto::UserInfo,
            // Lots
            lots::dto::CreateLotRequest,
            lots::dto::UpdateLotRequest,
            lots::dto::LotResponse,
            lots::dto::LotDetailResponse,
            lots::dto::SlotResponse,
            lots::dto::SlotCreatedResponse,
            // Parking
            parking::dto::OccupyRequest,
            parking::dto::OccupyResponse,
            parking::dto::ReleaseResponse,
            // History
            history::dto::HistoryEntryResponse,
            history::dto::SummaryResponse,
            // Analytics
            analytics::dto::LotOccupancyResponse,
            // Users
            users::dto::UserResponse,
            users::dto::UpdateProfileRequest,
            // Reports
            reports::dto::ExportRequest,
            reports::dto::ExportTaskResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Authentication", description = "User registration and JWT sign-in"),
        (name = "Lots", description = "Parking lot and slot administration"),
        (name = "Parking", description = "Slot occupancy: occupy and release"),
        (name = "History", description = "Per-user parking history and summary"),
        (name = "Analytics", description = "Admin occupancy dashboard"),
        (name = "Users", description = "Profiles and account administration"),
        (name = "Reports", description = "Asynchronous usage-report exports"),
    ),
    info(
        title = "ParkHub API",
        version = "1.0.0",
        description = "REST API for the ParkHub parking reservation backend",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: ApiState, health_state: HealthState) -> Router {
    let auth_state = AuthState {
        jwt_config: state.jwt_config.clone(),
        storage: state.storage.clone(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(auth::handlers::register))
        .route("/api/v1/auth/login", post(auth::handlers::login))
        .with_state(state.clone());

    // Everything else requires a signed-in caller; role checks live in
    // the services, keyed by the explicit Caller value.
    let protected_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::handlers::get_current_user))
        // Lots
        .route(
            "/api/v1/lots",
            get(lots::handlers::list_lots).post(lots::handlers::create_lot),
        )
        .route("/api/v1/lots/search", get(lots::handlers::search_lots))
        .route(
            "/api/v1/lots/{id}",
            get(lots::handlers::get_lot)
                .put(lots::handlers::update_lot)
                .delete(lots::handlers::delete_lot),
        )
        .route("/api/v1/lots/{id}/slots", post(lots::handlers::add_slot))
        .route(
            "/api/v1/lots/{id}/slots/{number}",
            delete(lots::handlers::delete_slot),
        )
        // Parking
        .route(
            "/api/v1/lots/{id}/slots/{number}/occupy",
            post(parking::handlers::occupy_slot),
        )
        .route(
            "/api/v1/lots/{id}/slots/{number}/release",
            post(parking::handlers::release_slot),
        )
        // History
        .route("/api/v1/history", get(history::handlers::get_history))
        .route("/api/v1/summary", get(history::handlers::get_summary))
        // Analytics
        .route(
            "/api/v1/analytics/summary",
            get(analytics::handlers::admin_summary),
        )
        // Users
        .route("/api/v1/users", get(users::handlers::list_users))
        .route("/api/v1/users/{id}/ban", post(users::handlers::ban_user))
        .route(
            "/api/v1/users/{id}/unban",
            post(users::handlers::unban_user),
        )
        .route(
            "/api/v1/profile",
            get(users::handlers::get_profile).put(users::handlers::update_profile),
        )
        // Reports
        .route(
            "/api/v1/reports/export",
            post(reports::handlers::request_export),
        )
        .route(
            "/api/v1/reports/export/{id}",
            get(reports::handlers::export_status),
        )
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(state);

    let health_routes = Router::new()
        .route("/health", get(health::handlers::health_check))
        .with_state(health_state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
