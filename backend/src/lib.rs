//! # Clinic Membership Backend
//!
//! Backend for the clinic's membership/loyalty program.
//!
//! The crate follows a layered architecture:
//! ```text
//! UI Layer (out of scope)
//!     |
//! IO Layer (REST API, handlers, mappers)
//!     |
//! Domain Layer (benefit engine, services)
//!     |
//! Storage Layer (file-backed repositories)
//! ```
//!
//! The domain layer never touches HTTP or the filesystem directly: services
//! speak to the storage traits, and the benefit engine is pure.

pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::domain::{MembershipService, PatientService};
use crate::io::rest::{membership_apis, patient_apis};
use crate::storage::csv::CsvConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub membership_service: MembershipService,
    pub patient_service: PatientService,
}

/// Initialize the backend with all required services
pub fn initialize_backend(csv_conn: Arc<CsvConnection>) -> Result<AppState> {
    info!("Setting up domain services");
    let membership_service = MembershipService::new(csv_conn.clone());
    let patient_service = PatientService::new(csv_conn);

    Ok(AppState {
        membership_service,
        patient_service,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow the dashboard frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/patients",
            get(patient_apis::list_patients).post(patient_apis::register_patient),
        )
        .route(
            "/patients/:patient_id",
            get(patient_apis::get_patient).put(patient_apis::update_patient),
        )
        .route(
            "/members",
            get(membership_apis::list_members).post(membership_apis::enroll_member),
        )
        .route("/members/:member_id", get(membership_apis::get_member))
        .route("/members/:member_id/spend", post(membership_apis::record_spend))
        .route("/members/:member_id/redeem", post(membership_apis::redeem_points))
        .route(
            "/members/:member_id/decay",
            get(membership_apis::get_pending_decay).post(membership_apis::apply_decay),
        )
        .route(
            "/members/:member_id/progress",
            get(membership_apis::get_tier_progress),
        )
        .route(
            "/members/:member_id/benefits",
            get(membership_apis::get_member_benefits),
        )
        .route(
            "/members/:member_id/birthday-gift",
            post(membership_apis::claim_birthday_gift),
        )
        .route(
            "/members/:member_id/active",
            put(membership_apis::set_member_active),
        )
        .route("/membership/stats", get(membership_apis::get_membership_stats))
        .route("/membership/tiers", get(membership_apis::get_tier_table))
        .route(
            "/membership/decay-sweep",
            post(membership_apis::decay_sweep),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
