use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::domain::benefit_engine::TierProgress as DomainTierProgress;
use crate::domain::commands::members::MemberDirectoryEntry;
use crate::domain::models::member::Member as DomainMember;
use crate::domain::models::tier::{
    BirthdayGift as DomainBirthdayGift, Tier, TierBenefit as DomainTierBenefit,
};
use crate::domain::stats::MembershipStats;
use shared::{
    BirthdayGift, Member as SharedMember, MemberListResponse, MemberResponse, MemberSummary,
    MembershipStatsResponse, TierBenefit, TierDistribution, TierProgress,
};

/// Mapper to convert between shared Member DTOs and domain Member models.
pub struct MemberMapper;

impl MemberMapper {
    /// Converts a shared Member DTO to a domain Member model.
    ///
    /// The tier string is validated here; an unknown tier surfaces as
    /// `UnknownTierError` in the error chain rather than defaulting.
    pub fn to_domain(dto: SharedMember) -> Result<DomainMember> {
        let tier: Tier = dto.tier.parse()?;
        let join_date = DateTime::parse_from_rfc3339(&dto.join_date)
            .context("Failed to parse join_date from shared DTO")?
            .with_timezone(&Utc);
        let last_point_decay = DateTime::parse_from_rfc3339(&dto.last_point_decay)
            .context("Failed to parse last_point_decay from shared DTO")?
            .with_timezone(&Utc);

        Ok(DomainMember {
            id: dto.id,
            patient_id: dto.patient_id,
            membership_number: dto.membership_number,
            tier,
            points: dto.points,
            total_spent: dto.total_spent,
            join_date,
            last_point_decay,
            birthday_gift_claimed: dto.birthday_gift_claimed,
            family_members: dto.family_members,
            referral_code: dto.referral_code,
            referred_by: dto.referred_by,
            is_active: dto.is_active,
        })
    }

    /// Converts a domain Member model to a shared Member DTO.
    pub fn to_dto(domain: DomainMember) -> SharedMember {
        SharedMember {
            id: domain.id,
            patient_id: domain.patient_id,
            membership_number: domain.membership_number,
            tier: domain.tier.as_str().to_string(),
            points: domain.points,
            total_spent: domain.total_spent,
            join_date: domain.join_date.to_rfc3339(),
            last_point_decay: domain.last_point_decay.to_rfc3339(),
            birthday_gift_claimed: domain.birthday_gift_claimed,
            family_members: domain.family_members,
            referral_code: domain.referral_code,
            referred_by: domain.referred_by,
            is_active: domain.is_active,
        }
    }

    pub fn to_member_response_dto(domain: DomainMember, message: &str) -> MemberResponse {
        MemberResponse {
            member: Self::to_dto(domain),
            success_message: message.to_string(),
        }
    }

    pub fn to_tier_progress_dto(progress: DomainTierProgress) -> TierProgress {
        TierProgress {
            next_tier: progress.next_tier.map(|t| t.as_str().to_string()),
            progress_percent: progress.progress_percent,
            amount_needed: progress.amount_needed,
        }
    }

    pub fn to_birthday_gift_dto(gift: DomainBirthdayGift) -> BirthdayGift {
        BirthdayGift {
            kind: gift.kind.as_str().to_string(),
            value: gift.value,
            description: gift.description,
        }
    }

    pub fn to_tier_benefit_dto(benefit: DomainTierBenefit) -> TierBenefit {
        TierBenefit {
            tier: benefit.tier.as_str().to_string(),
            points_multiplier: benefit.points_multiplier,
            discount_percentage: benefit.discount_percentage,
            birthday_gift: Self::to_birthday_gift_dto(benefit.birthday_gift),
            family_benefits: benefit.family_benefits,
            exclusive_offers: benefit.exclusive_offers,
            priority_booking: benefit.priority_booking,
        }
    }

    pub fn to_stats_dto(stats: MembershipStats) -> MembershipStatsResponse {
        MembershipStatsResponse {
            total_members: stats.total_members,
            active_members: stats.active_members,
            tier_distribution: TierDistribution {
                bronze: stats.tier_distribution.bronze,
                silver: stats.tier_distribution.silver,
                gold: stats.tier_distribution.gold,
                platinum: stats.tier_distribution.platinum,
            },
            total_spent: stats.total_spent,
            total_points: stats.total_points,
        }
    }

    pub fn to_member_list_dto(entries: Vec<MemberDirectoryEntry>) -> MemberListResponse {
        MemberListResponse {
            members: entries
                .into_iter()
                .map(|entry| MemberSummary {
                    member: Self::to_dto(entry.member),
                    patient_name: entry.patient_name,
                    pending_decay: entry.pending_decay,
                    progress: Self::to_tier_progress_dto(entry.progress),
                })
                .collect(),
        }
    }
}
