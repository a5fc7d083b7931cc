//! Membership benefit engine.
//!
//! Pure functions deriving tier benefits, next-tier progress and loyalty
//! point decay from a member record and the static tier benefit table.
//! Nothing in this module performs I/O; the only mutating operation is
//! [`apply_decay`], and callers decide when to persist the result.

use chrono::{DateTime, Datelike, Months, Utc};
use serde::{Deserialize, Serialize};

use super::models::member::Member;
use super::models::tier::{Tier, TierBenefit};

/// Fraction of the points balance removed by one annual decay: 30%.
const DECAY_NUMERATOR: i64 = 3;
const DECAY_DENOMINATOR: i64 = 10;

/// Whole months that must elapse before decay becomes due
const DECAY_INTERVAL_MONTHS: i32 = 12;

/// Progress of a member toward the next tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierProgress {
    /// None when the member already holds the top tier
    pub next_tier: Option<Tier>,
    /// Clamped to [0, 100]
    pub progress_percent: f64,
    /// Additional spend needed to reach the next tier (never negative)
    pub amount_needed: i64,
}

/// Look up the immutable benefit record for a tier.
///
/// Total over the [`Tier`] enum. Raw tier strings from storage or the API
/// are validated by `Tier::from_str`, which rejects unknown values with
/// `UnknownTierError` instead of defaulting.
pub fn resolve_tier_benefits(tier: Tier) -> &'static TierBenefit {
    TierBenefit::for_tier(tier)
}

/// Points that would be removed if decay were applied at `now`.
///
/// Read-only: reports `floor(points * 0.30)` once at least twelve whole
/// calendar months have elapsed since the member's last decay, otherwise 0.
/// Month arithmetic uses calendar year/month components only, matching the
/// anniversary-based billing cycle.
pub fn compute_pending_decay(member: &Member, now: DateTime<Utc>) -> i64 {
    if months_between(member.last_point_decay, now) < DECAY_INTERVAL_MONTHS {
        return 0;
    }
    member.points * DECAY_NUMERATOR / DECAY_DENOMINATOR
}

/// Apply pending decay to a member, returning the points removed.
///
/// No-op when nothing is pending. Otherwise subtracts the pending amount
/// (floored at zero) and advances `last_point_decay` by the number of full
/// twelve-month periods elapsed. The anniversary date is preserved: the
/// timestamp moves forward in whole-year steps rather than jumping to
/// `now`, and a multi-year gap still costs a single 30% cut.
pub fn apply_decay(member: &mut Member, now: DateTime<Utc>) -> i64 {
    let pending = compute_pending_decay(member, now);
    if pending == 0 {
        return 0;
    }

    let elapsed_periods = months_between(member.last_point_decay, now) / DECAY_INTERVAL_MONTHS;
    let advance = Months::new((elapsed_periods * DECAY_INTERVAL_MONTHS) as u32);

    member.points = (member.points - pending).max(0);
    if let Some(advanced) = member.last_point_decay.checked_add_months(advance) {
        member.last_point_decay = advanced;
    }

    pending
}

/// Progress of a member toward the next tier.
///
/// Terminal for Platinum members. A member whose spend already meets the
/// next threshold (stale tier) reports 100% / 0 needed; promoting them is
/// the caller's decision via [`recalculate_tier`]. This function never
/// mutates state.
pub fn compute_next_tier_progress(member: &Member) -> TierProgress {
    let next_tier = match member.tier.next() {
        Some(tier) => tier,
        None => {
            return TierProgress {
                next_tier: None,
                progress_percent: 100.0,
                amount_needed: 0,
            };
        }
    };

    let current_threshold = member.tier.threshold();
    let next_threshold = next_tier.threshold();
    let span = (next_threshold - current_threshold) as f64;
    let progress = (member.total_spent - current_threshold) as f64 / span * 100.0;

    TierProgress {
        next_tier: Some(next_tier),
        progress_percent: progress.clamp(0.0, 100.0),
        amount_needed: (next_threshold - member.total_spent).max(0),
    }
}

/// The highest tier whose spend threshold is met by the member.
///
/// Thresholds are inclusive lower bounds: exact equality promotes. Pure;
/// callers decide whether and when to assign the result (the membership
/// service does so on completed-spend events, never on reads).
pub fn recalculate_tier(member: &Member) -> Tier {
    let mut tier = Tier::Bronze;
    for candidate in Tier::ALL {
        if member.total_spent >= candidate.threshold() {
            tier = candidate;
        }
    }
    tier
}

/// Discount percentage granted by the member's current tier
pub fn effective_discount(member: &Member) -> u8 {
    resolve_tier_benefits(member.tier).discount_percentage
}

/// Whole calendar months between two instants, from year/month components
fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}
