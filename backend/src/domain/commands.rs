//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping
//! the public DTOs defined in the `shared` crate to these internal types.

pub mod patients {
    /// Input for registering a new patient.
    #[derive(Debug, Clone)]
    pub struct RegisterPatientCommand {
        pub name: String,
        pub phone: String,
        /// ISO 8601 date (YYYY-MM-DD)
        pub birth_date: String,
    }

    /// Input for updating an existing patient.
    #[derive(Debug, Clone)]
    pub struct UpdatePatientCommand {
        pub name: Option<String>,
        pub phone: Option<String>,
        pub birth_date: Option<String>,
    }
}

pub mod members {
    use crate::domain::benefit_engine::TierProgress;
    use crate::domain::models::member::Member;
    use crate::domain::models::tier::{BirthdayGift, Tier};

    /// Input for enrolling a patient into the membership program.
    #[derive(Debug, Clone)]
    pub struct EnrollMemberCommand {
        pub patient_id: String,
        pub referred_by: Option<String>,
    }

    /// Query parameters for listing the membership directory.
    #[derive(Debug, Clone, Default)]
    pub struct MemberListQuery {
        pub search: Option<String>,
        pub tier: Option<Tier>,
        pub is_active: Option<bool>,
    }

    /// A directory row: member joined with display data.
    #[derive(Debug, Clone)]
    pub struct MemberDirectoryEntry {
        pub member: Member,
        pub patient_name: String,
        pub pending_decay: i64,
        pub progress: TierProgress,
    }

    /// Result of listing the membership directory.
    #[derive(Debug, Clone)]
    pub struct MemberListResult {
        pub entries: Vec<MemberDirectoryEntry>,
    }

    /// Input for recording completed spend against a membership.
    #[derive(Debug, Clone)]
    pub struct RecordSpendCommand {
        pub member_id: String,
        pub amount: i64,
        pub description: String,
    }

    /// Result of recording spend.
    #[derive(Debug, Clone)]
    pub struct RecordSpendResult {
        pub member: Member,
        pub points_earned: i64,
        pub tier_changed: bool,
        pub success_message: String,
    }

    /// Input for redeeming loyalty points.
    #[derive(Debug, Clone)]
    pub struct RedeemPointsCommand {
        pub member_id: String,
        pub points: i64,
        pub description: String,
    }

    /// Result of applying decay to a single member.
    #[derive(Debug, Clone)]
    pub struct ApplyDecayResult {
        pub member: Member,
        pub points_decayed: i64,
    }

    /// Result of a decay sweep across all members.
    #[derive(Debug, Clone)]
    pub struct DecaySweepResult {
        pub members_evaluated: usize,
        pub members_decayed: usize,
        pub points_decayed: i64,
    }

    /// Result of claiming a birthday gift.
    #[derive(Debug, Clone)]
    pub struct ClaimBirthdayGiftResult {
        pub member: Member,
        pub gift: BirthdayGift,
    }
}
