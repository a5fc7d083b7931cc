//! # Domain Layer
//!
//! Business logic for the clinic membership program: the pure benefit
//! engine, the services orchestrating it against storage, and the domain
//! models and command types they share.

pub mod benefit_engine;
pub mod commands;
pub mod membership_service;
pub mod models;
pub mod patient_service;
pub mod stats;

pub use membership_service::MembershipService;
pub use patient_service::PatientService;
