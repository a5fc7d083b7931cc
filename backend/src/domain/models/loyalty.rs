use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of loyalty point event recorded in a member's ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyKind {
    Earn,
    Redeem,
    Decay,
    Bonus,
    Birthday,
}

impl LoyaltyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoyaltyKind::Earn => "earn",
            LoyaltyKind::Redeem => "redeem",
            LoyaltyKind::Decay => "decay",
            LoyaltyKind::Bonus => "bonus",
            LoyaltyKind::Birthday => "birthday",
        }
    }

    /// Parse the stored string form back into a kind
    pub fn parse(s: &str) -> Option<LoyaltyKind> {
        match s {
            "earn" => Some(LoyaltyKind::Earn),
            "redeem" => Some(LoyaltyKind::Redeem),
            "decay" => Some(LoyaltyKind::Decay),
            "bonus" => Some(LoyaltyKind::Bonus),
            "birthday" => Some(LoyaltyKind::Birthday),
            _ => None,
        }
    }
}

/// A single entry in a member's append-only loyalty ledger.
///
/// `points` is a signed delta: positive for earn/bonus, negative for
/// redeem/decay, zero for informational entries such as birthday claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub id: String,
    pub member_id: String,
    pub kind: LoyaltyKind,
    pub points: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LoyaltyTransaction {
    /// Generate a ledger entry ID from kind and timestamp
    pub fn generate_id(kind: LoyaltyKind, epoch_millis: u64) -> String {
        format!("loyalty::{}::{}", kind.as_str(), epoch_millis)
    }
}
