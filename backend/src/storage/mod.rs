//! # Storage Layer
//!
//! Data persistence for the membership backend. The domain layer talks to
//! the traits defined in [`traits`]; the file-based implementation lives in
//! [`csv`].

pub mod csv;
pub mod traits;

pub use traits::{LoyaltyStorage, MemberStorage, PatientStorage};
