use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tier::Tier;

/// Domain model representing a clinic membership.
///
/// Invariants: `points` is never negative, `total_spent` only increases and
/// `last_point_decay` never lies in the future at evaluation time. The tier
/// may lag behind `total_spent` until a spend event triggers recalculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub patient_id: String,
    /// Unique, immutable membership number
    pub membership_number: String,
    pub tier: Tier,
    pub points: i64,
    /// Cumulative lifetime spend in IDR (smallest unit)
    pub total_spent: i64,
    pub join_date: DateTime<Utc>,
    pub last_point_decay: DateTime<Utc>,
    pub birthday_gift_claimed: bool,
    /// Patient IDs of linked family members
    pub family_members: Vec<String>,
    pub referral_code: String,
    pub referred_by: Option<String>,
    pub is_active: bool,
}

impl Member {
    /// Generate a unique ID for a member
    pub fn generate_id(timestamp_millis: u64) -> String {
        format!("member::{}", timestamp_millis)
    }
}
