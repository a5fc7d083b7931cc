use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a patient registered with the clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    /// Clinic-assigned registration number (unique)
    pub registration_number: String,
    pub name: String,
    pub phone: String,
    /// ISO 8601 date format (YYYY-MM-DD)
    pub birth_date: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

/// Request for registering a new patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterPatientRequest {
    pub name: String,
    pub phone: String,
    /// ISO 8601 date format (YYYY-MM-DD)
    pub birth_date: String,
}

/// Request for updating an existing patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
}

/// Response after creating or updating a patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientResponse {
    pub patient: Patient,
    pub success_message: String,
}

/// Response containing a list of patients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientListResponse {
    pub patients: Vec<Patient>,
}

/// Member ID in format: "member::epoch_millis"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    /// ID of the patient this membership belongs to
    pub patient_id: String,
    /// Clinic-assigned membership number (unique, immutable)
    pub membership_number: String,
    /// Membership tier: "bronze", "silver", "gold" or "platinum"
    pub tier: String,
    /// Loyalty points balance (never negative)
    pub points: i64,
    /// Cumulative lifetime spend in IDR (smallest unit, only increases)
    pub total_spent: i64,
    /// RFC 3339 timestamp
    pub join_date: String,
    /// RFC 3339 timestamp of the last applied points decay
    pub last_point_decay: String,
    pub birthday_gift_claimed: bool,
    /// Patient IDs of linked family members
    pub family_members: Vec<String>,
    pub referral_code: String,
    /// Referral code of the member who referred this one
    pub referred_by: Option<String>,
    pub is_active: bool,
}

/// Request for enrolling a patient into the membership program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollMemberRequest {
    pub patient_id: String,
    /// Referral code of the referring member, if any
    pub referred_by: Option<String>,
}

/// Response after creating or updating a member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberResponse {
    pub member: Member,
    pub success_message: String,
}

/// Birthday gift granted by a membership tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BirthdayGift {
    /// "voucher", "treatment" or "product"
    pub kind: String,
    /// Gift value in IDR
    pub value: i64,
    pub description: String,
}

/// Benefit package attached to a membership tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierBenefit {
    pub tier: String,
    pub points_multiplier: f64,
    pub discount_percentage: u8,
    pub birthday_gift: BirthdayGift,
    pub family_benefits: Vec<String>,
    pub exclusive_offers: bool,
    pub priority_booking: bool,
}

/// Response containing the full tier benefit table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierBenefitsResponse {
    pub tiers: Vec<TierBenefit>,
}

/// Progress of a member toward the next membership tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierProgress {
    /// None when the member already holds the top tier
    pub next_tier: Option<String>,
    /// Clamped to the range [0, 100]
    pub progress_percent: f64,
    /// Additional spend needed to reach the next tier (never negative)
    pub amount_needed: i64,
}

/// A member joined with display data for the membership directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberSummary {
    pub member: Member,
    pub patient_name: String,
    /// Points that would be removed if decay were applied now
    pub pending_decay: i64,
    pub progress: TierProgress,
}

/// Request for listing/filtering members
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberListRequest {
    /// Free-text search over patient name, membership number and referral code
    pub search: Option<String>,
    /// Restrict to a single tier
    pub tier: Option<String>,
    /// Restrict to active (true) or inactive (false) members
    pub is_active: Option<bool>,
}

/// Response containing the membership directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberListResponse {
    pub members: Vec<MemberSummary>,
}

/// Request for recording completed spend against a membership
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordSpendRequest {
    /// Amount in IDR (smallest unit, must be positive)
    pub amount: i64,
    pub description: String,
}

/// Response after recording spend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordSpendResponse {
    pub member: Member,
    pub points_earned: i64,
    /// True when the spend promoted the member to a higher tier
    pub tier_changed: bool,
    pub success_message: String,
}

/// Request for redeeming loyalty points
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedeemPointsRequest {
    /// Points to redeem (must be positive, at most the current balance)
    pub points: i64,
    pub description: String,
}

/// Response after redeeming points
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedeemPointsResponse {
    pub member: Member,
    pub success_message: String,
}

/// Response reporting the decay that would apply to a member right now
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingDecayResponse {
    pub member_id: String,
    pub pending_decay: i64,
}

/// Response after applying points decay to a member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplyDecayResponse {
    pub member: Member,
    pub points_decayed: i64,
    pub success_message: String,
}

/// Response after running a decay sweep across all members
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecaySweepResponse {
    pub members_evaluated: usize,
    pub members_decayed: usize,
    pub points_decayed: i64,
    pub success_message: String,
}

/// Response after claiming a birthday gift
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimBirthdayGiftResponse {
    pub member: Member,
    pub gift: BirthdayGift,
    pub success_message: String,
}

/// Request for toggling a member's active flag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetMemberActiveRequest {
    pub is_active: bool,
}

/// Member counts per tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierDistribution {
    pub bronze: usize,
    pub silver: usize,
    pub gold: usize,
    pub platinum: usize,
}

/// Aggregate statistics over the membership program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipStatsResponse {
    pub total_members: usize,
    pub active_members: usize,
    pub tier_distribution: TierDistribution,
    pub total_spent: i64,
    pub total_points: i64,
}

impl Member {
    /// Generate a member ID based on timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("member::{}", epoch_millis)
    }

    /// Parse a member ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, MemberIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 2 || parts[0] != "member" {
            return Err(MemberIdError::InvalidFormat);
        }

        parts[1].parse::<u64>().map_err(|_| MemberIdError::InvalidTimestamp)
    }

    /// Extract timestamp from member ID
    pub fn extract_timestamp(&self) -> Result<u64, MemberIdError> {
        Self::parse_id(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for MemberIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberIdError::InvalidFormat => write!(f, "Invalid member ID format"),
            MemberIdError::InvalidTimestamp => write!(f, "Invalid timestamp in member ID"),
        }
    }
}

impl std::error::Error for MemberIdError {}

impl Patient {
    /// Generate a patient ID based on timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("patient::{}", epoch_millis)
    }

    /// Parse a patient ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, PatientIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 2 || parts[0] != "patient" {
            return Err(PatientIdError::InvalidFormat);
        }

        parts[1].parse::<u64>().map_err(|_| PatientIdError::InvalidTimestamp)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatientIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for PatientIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientIdError::InvalidFormat => write!(f, "Invalid patient ID format"),
            PatientIdError::InvalidTimestamp => write!(f, "Invalid timestamp in patient ID"),
        }
    }
}

impl std::error::Error for PatientIdError {}
