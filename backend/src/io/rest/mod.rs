//! # REST API Interface Layer
//!
//! Provides HTTP REST endpoints for the clinic membership backend. This
//! layer handles:
//! - HTTP request/response serialization and deserialization
//! - Error translation from domain to HTTP status codes
//! - Request logging
//!
//! Business logic stays in the domain layer; handlers only translate
//! between the shared DTOs and domain commands via the [`mappers`].

pub mod mappers;
pub mod membership_apis;
pub mod patient_apis;
