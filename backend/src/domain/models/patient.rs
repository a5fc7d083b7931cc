use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Domain model representing a patient registered with the clinic.
///
/// Only the fields the membership module needs; the clinical record lives
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    /// Unique clinic registration number
    pub registration_number: String,
    pub name: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Generate a unique ID for a patient
    pub fn generate_id(timestamp_millis: u64) -> String {
        format!("patient::{}", timestamp_millis)
    }
}
