//! Aggregate statistics over the membership program.

use serde::{Deserialize, Serialize};

use super::models::member::Member;
use super::models::tier::Tier;

/// Member counts per tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierDistribution {
    pub bronze: usize,
    pub silver: usize,
    pub gold: usize,
    pub platinum: usize,
}

/// Aggregate membership statistics derived from the member collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipStats {
    pub total_members: usize,
    pub active_members: usize,
    pub tier_distribution: TierDistribution,
    pub total_spent: i64,
    pub total_points: i64,
}

/// Fold membership statistics from an explicit member slice
pub fn membership_stats(members: &[Member]) -> MembershipStats {
    let mut stats = MembershipStats {
        total_members: members.len(),
        ..Default::default()
    };

    for member in members {
        if member.is_active {
            stats.active_members += 1;
        }
        match member.tier {
            Tier::Bronze => stats.tier_distribution.bronze += 1,
            Tier::Silver => stats.tier_distribution.silver += 1,
            Tier::Gold => stats.tier_distribution.gold += 1,
            Tier::Platinum => stats.tier_distribution.platinum += 1,
        }
        stats.total_spent += member.total_spent;
        stats.total_points += member.points;
    }

    stats
}
