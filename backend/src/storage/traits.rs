//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::loyalty::LoyaltyTransaction;
use crate::domain::models::member::Member as DomainMember;
use crate::domain::models::patient::Patient as DomainPatient;

/// Trait defining the interface for member storage operations
///
/// This trait abstracts away the specific storage implementation details,
/// allowing the domain layer to work with different storage backends
/// (file-based, SQL databases, in-memory fixtures) without modification.
#[async_trait]
pub trait MemberStorage: Send + Sync {
    /// Store a new member
    async fn store_member(&self, member: &DomainMember) -> Result<()>;

    /// Retrieve a specific member by ID
    async fn get_member(&self, member_id: &str) -> Result<Option<DomainMember>>;

    /// Retrieve the membership linked to a patient, if any
    async fn get_member_by_patient(&self, patient_id: &str) -> Result<Option<DomainMember>>;

    /// Retrieve a member by their referral code
    async fn get_member_by_referral_code(&self, code: &str) -> Result<Option<DomainMember>>;

    /// List all members ordered by membership number
    async fn list_members(&self) -> Result<Vec<DomainMember>>;

    /// Update an existing member
    async fn update_member(&self, member: &DomainMember) -> Result<()>;

    /// Number of stored members (used for membership number assignment)
    async fn member_count(&self) -> Result<usize>;
}

/// Trait defining the interface for patient storage operations
#[async_trait]
pub trait PatientStorage: Send + Sync {
    /// Store a new patient
    async fn store_patient(&self, patient: &DomainPatient) -> Result<()>;

    /// Retrieve a specific patient by ID
    async fn get_patient(&self, patient_id: &str) -> Result<Option<DomainPatient>>;

    /// List all patients ordered by name
    async fn list_patients(&self) -> Result<Vec<DomainPatient>>;

    /// Update an existing patient
    async fn update_patient(&self, patient: &DomainPatient) -> Result<()>;

    /// Number of registered patients (used for registration number assignment)
    async fn patient_count(&self) -> Result<usize>;
}

/// Trait defining the interface for the append-only loyalty ledger
#[async_trait]
pub trait LoyaltyStorage: Send + Sync {
    /// Append an entry to a member's ledger
    async fn append_entry(&self, entry: &LoyaltyTransaction) -> Result<()>;

    /// List a member's ledger entries in insertion order
    async fn list_entries(&self, member_id: &str) -> Result<Vec<LoyaltyTransaction>>;
}
