//! Membership tiers and the static tier benefit table.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when a tier value outside the four defined tiers is supplied.
///
/// An unknown tier indicates a data-integrity problem upstream, so this is
/// surfaced to the caller unchanged rather than silently defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown membership tier: {0}")]
pub struct UnknownTierError(pub String);

/// Membership tier, ordered lowest to highest.
///
/// Tier eligibility is a function of cumulative lifetime spend against the
/// thresholds in [`Tier::threshold`]; thresholds are inclusive lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum];

    /// Minimum cumulative lifetime spend (IDR) required for this tier
    pub fn threshold(&self) -> i64 {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 5_000_000,
            Tier::Gold => 15_000_000,
            Tier::Platinum => 35_000_000,
        }
    }

    /// The next tier up, or None for the top tier
    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Bronze => Some(Tier::Silver),
            Tier::Silver => Some(Tier::Gold),
            Tier::Gold => Some(Tier::Platinum),
            Tier::Platinum => None,
        }
    }

    /// Lowercase string form used in storage and over the API
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = UnknownTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            "gold" => Ok(Tier::Gold),
            "platinum" => Ok(Tier::Platinum),
            other => Err(UnknownTierError(other.to_string())),
        }
    }
}

/// Kind of birthday gift a tier grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiftKind {
    Voucher,
    Treatment,
    Product,
}

impl GiftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftKind::Voucher => "voucher",
            GiftKind::Treatment => "treatment",
            GiftKind::Product => "product",
        }
    }
}

/// Birthday gift descriptor attached to a tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthdayGift {
    pub kind: GiftKind,
    /// Gift value in IDR
    pub value: i64,
    pub description: String,
}

/// Benefit package for a single membership tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBenefit {
    pub tier: Tier,
    /// Multiplier applied to base points earned on spend (>= 1)
    pub points_multiplier: f64,
    /// Treatment discount percentage (0-100)
    pub discount_percentage: u8,
    pub birthday_gift: BirthdayGift,
    pub family_benefits: Vec<String>,
    pub exclusive_offers: bool,
    pub priority_booking: bool,
}

/// Static benefit table, one entry per tier.
static TIER_BENEFITS: Lazy<BTreeMap<Tier, TierBenefit>> = Lazy::new(|| {
    let mut table = BTreeMap::new();
    table.insert(
        Tier::Bronze,
        TierBenefit {
            tier: Tier::Bronze,
            points_multiplier: 1.0,
            discount_percentage: 5,
            birthday_gift: BirthdayGift {
                kind: GiftKind::Voucher,
                value: 100_000,
                description: "Voucher Rp 100K".to_string(),
            },
            family_benefits: vec!["Basic family consultation discount".to_string()],
            exclusive_offers: false,
            priority_booking: false,
        },
    );
    table.insert(
        Tier::Silver,
        TierBenefit {
            tier: Tier::Silver,
            points_multiplier: 1.5,
            discount_percentage: 10,
            birthday_gift: BirthdayGift {
                kind: GiftKind::Treatment,
                value: 300_000,
                description: "Free Basic Facial".to_string(),
            },
            family_benefits: vec![
                "Family discount 5%".to_string(),
                "Free consultation for spouse".to_string(),
            ],
            exclusive_offers: true,
            priority_booking: false,
        },
    );
    table.insert(
        Tier::Gold,
        TierBenefit {
            tier: Tier::Gold,
            points_multiplier: 2.0,
            discount_percentage: 15,
            birthday_gift: BirthdayGift {
                kind: GiftKind::Treatment,
                value: 500_000,
                description: "Free Premium Facial".to_string(),
            },
            family_benefits: vec![
                "Family discount 10%".to_string(),
                "Free consultation for family (max 3)".to_string(),
            ],
            exclusive_offers: true,
            priority_booking: true,
        },
    );
    table.insert(
        Tier::Platinum,
        TierBenefit {
            tier: Tier::Platinum,
            points_multiplier: 3.0,
            discount_percentage: 20,
            birthday_gift: BirthdayGift {
                kind: GiftKind::Treatment,
                value: 1_000_000,
                description: "Free Premium Treatment".to_string(),
            },
            family_benefits: vec![
                "Family discount 15%".to_string(),
                "Unlimited family consultations".to_string(),
            ],
            exclusive_offers: true,
            priority_booking: true,
        },
    );
    table
});

impl TierBenefit {
    /// Look up the benefit record for a tier.
    ///
    /// Total over the enum; invalid tier strings are rejected earlier by
    /// [`Tier::from_str`] at the storage/API boundary.
    pub fn for_tier(tier: Tier) -> &'static TierBenefit {
        &TIER_BENEFITS[&tier]
    }
}
