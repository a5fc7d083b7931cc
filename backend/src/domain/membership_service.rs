//! Membership service domain logic for the clinic membership program.
//!
//! This module contains the business operations around the member
//! lifecycle: enrollment, spend accrual with point earning, point
//! redemption, annual point decay, tier re-evaluation, birthday gifts and
//! derived statistics. The tier/points arithmetic itself lives in
//! [`crate::domain::benefit_engine`]; this service wires it to storage and
//! the loyalty ledger.
//!
//! ## Business Rules
//!
//! - One membership per patient
//! - Points are earned at 1 base point per Rp 10,000 of completed spend,
//!   scaled by the tier's points multiplier
//! - Tier is re-evaluated on spend events only and never demoted
//! - Points never go negative: redemption is capped by the balance and
//!   decay floors at zero
//! - Birthday gifts are claimable once per flag cycle, by active members only

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::benefit_engine::{self, TierProgress};
use crate::domain::commands::members::{
    ApplyDecayResult, ClaimBirthdayGiftResult, DecaySweepResult, EnrollMemberCommand,
    MemberDirectoryEntry, MemberListQuery, MemberListResult, RecordSpendCommand,
    RecordSpendResult, RedeemPointsCommand,
};
use crate::domain::models::loyalty::{LoyaltyKind, LoyaltyTransaction};
use crate::domain::models::member::Member;
use crate::domain::models::tier::{Tier, TierBenefit};
use crate::domain::stats::{membership_stats, MembershipStats};
use crate::storage::csv::{CsvConnection, LoyaltyRepository, MemberRepository, PatientRepository};
use crate::storage::{LoyaltyStorage, MemberStorage, PatientStorage};

/// Rupiah of completed spend per base loyalty point
const SPEND_PER_POINT: i64 = 10_000;

/// Service for managing memberships and loyalty points
#[derive(Clone)]
pub struct MembershipService {
    member_repository: MemberRepository,
    patient_repository: PatientRepository,
    loyalty_repository: LoyaltyRepository,
}

impl MembershipService {
    /// Create a new MembershipService
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        let member_repository = MemberRepository::new((*csv_conn).clone());
        let patient_repository = PatientRepository::new((*csv_conn).clone());
        let loyalty_repository = LoyaltyRepository::new((*csv_conn).clone());
        Self {
            member_repository,
            patient_repository,
            loyalty_repository,
        }
    }

    /// Enroll a patient into the membership program
    pub async fn enroll_member(&self, command: EnrollMemberCommand) -> Result<Member> {
        info!("Enrolling member for patient: {}", command.patient_id);

        let patient = self
            .patient_repository
            .get_patient(&command.patient_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Patient not found: {}", command.patient_id))?;

        if self
            .member_repository
            .get_member_by_patient(&command.patient_id)
            .await?
            .is_some()
        {
            return Err(anyhow::anyhow!(
                "Patient {} is already enrolled in the membership program",
                command.patient_id
            ));
        }

        // A referral code, when given, must belong to an existing member
        let referred_by = match command.referred_by {
            Some(code) => {
                let referrer = self
                    .member_repository
                    .get_member_by_referral_code(&code)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Unknown referral code: {}", code))?;
                Some(referrer.referral_code)
            }
            None => None,
        };

        let now = Utc::now();
        let timestamp_millis = now.timestamp_millis() as u64;
        let member_count = self.member_repository.member_count().await?;

        let member = Member {
            id: Member::generate_id(timestamp_millis),
            patient_id: patient.id.clone(),
            membership_number: format!("MBR{:06}", member_count + 1),
            tier: Tier::Bronze,
            points: 0,
            total_spent: 0,
            join_date: now,
            last_point_decay: now,
            birthday_gift_claimed: false,
            family_members: Vec::new(),
            referral_code: self.generate_referral_code(&patient.name, now, member_count).await?,
            referred_by,
            is_active: true,
        };

        self.member_repository.store_member(&member).await?;

        info!(
            "Enrolled member {} ({}) for patient {}",
            member.membership_number, member.id, patient.name
        );
        Ok(member)
    }

    /// Get a member by ID
    pub async fn get_member(&self, member_id: &str) -> Result<Option<Member>> {
        info!("Getting member: {}", member_id);

        let member = self.member_repository.get_member(member_id).await?;

        if member.is_none() {
            warn!("Member not found: {}", member_id);
        }

        Ok(member)
    }

    /// List the membership directory, applying search and filters
    pub async fn list_members(&self, query: MemberListQuery) -> Result<MemberListResult> {
        info!("Listing members: {:?}", query);

        let members = self.member_repository.list_members().await?;
        let now = Utc::now();
        let search = query.search.as_deref().map(str::to_lowercase);

        let mut entries = Vec::new();
        for member in members {
            let patient = match self.patient_repository.get_patient(&member.patient_id).await? {
                Some(patient) => patient,
                None => {
                    warn!(
                        "Member {} references missing patient {}",
                        member.id, member.patient_id
                    );
                    continue;
                }
            };

            if let Some(tier) = query.tier {
                if member.tier != tier {
                    continue;
                }
            }
            if let Some(is_active) = query.is_active {
                if member.is_active != is_active {
                    continue;
                }
            }
            if let Some(ref needle) = search {
                let matches = patient.name.to_lowercase().contains(needle)
                    || member.membership_number.to_lowercase().contains(needle)
                    || member.referral_code.to_lowercase().contains(needle);
                if !matches {
                    continue;
                }
            }

            let pending_decay = benefit_engine::compute_pending_decay(&member, now);
            let progress = benefit_engine::compute_next_tier_progress(&member);
            entries.push(MemberDirectoryEntry {
                member,
                patient_name: patient.name,
                pending_decay,
                progress,
            });
        }

        info!("Found {} matching members", entries.len());
        Ok(MemberListResult { entries })
    }

    /// Record completed spend against a membership.
    ///
    /// Adds to the lifetime spend, earns points at the tier's multiplier and
    /// promotes the member when the new total warrants a higher tier.
    pub async fn record_spend(&self, command: RecordSpendCommand) -> Result<RecordSpendResult> {
        info!(
            "Recording spend for member {}: {}",
            command.member_id, command.amount
        );

        if command.amount <= 0 {
            return Err(anyhow::anyhow!("Spend amount must be positive"));
        }
        Self::validate_description(&command.description)?;

        let mut member = self.require_member(&command.member_id).await?;

        member.total_spent += command.amount;

        // Points are earned at the multiplier of the tier held when the
        // spend completed; a promotion takes effect from the next spend
        let multiplier = benefit_engine::resolve_tier_benefits(member.tier).points_multiplier;
        let points_earned = ((command.amount / SPEND_PER_POINT) as f64 * multiplier).floor() as i64;
        member.points += points_earned;

        let recalculated = benefit_engine::recalculate_tier(&member);
        let tier_changed = recalculated > member.tier;
        if tier_changed {
            info!(
                "Member {} promoted: {} -> {}",
                member.membership_number, member.tier, recalculated
            );
            member.tier = recalculated;
        }

        self.member_repository.update_member(&member).await?;

        if points_earned > 0 {
            self.append_ledger_entry(
                &member.id,
                LoyaltyKind::Earn,
                points_earned,
                &command.description,
            )
            .await?;
        }

        Ok(RecordSpendResult {
            member,
            points_earned,
            tier_changed,
            success_message: "Spend recorded successfully".to_string(),
        })
    }

    /// Redeem loyalty points from a member's balance
    pub async fn redeem_points(&self, command: RedeemPointsCommand) -> Result<Member> {
        info!(
            "Redeeming {} points for member {}",
            command.points, command.member_id
        );

        if command.points <= 0 {
            return Err(anyhow::anyhow!("Redemption amount must be positive"));
        }
        Self::validate_description(&command.description)?;

        let mut member = self.require_member(&command.member_id).await?;

        if member.points < command.points {
            return Err(anyhow::anyhow!(
                "Insufficient points: balance is {}, requested {}",
                member.points,
                command.points
            ));
        }

        member.points -= command.points;
        self.member_repository.update_member(&member).await?;

        self.append_ledger_entry(
            &member.id,
            LoyaltyKind::Redeem,
            -command.points,
            &command.description,
        )
        .await?;

        Ok(member)
    }

    /// Points that would decay for a member if evaluated at `now`
    pub async fn pending_decay(&self, member_id: &str, now: DateTime<Utc>) -> Result<i64> {
        let member = self.require_member(member_id).await?;
        Ok(benefit_engine::compute_pending_decay(&member, now))
    }

    /// Apply annual point decay to a single member
    pub async fn apply_decay(
        &self,
        member_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ApplyDecayResult> {
        info!("Applying point decay for member: {}", member_id);

        let mut member = self.require_member(member_id).await?;

        let points_decayed = benefit_engine::apply_decay(&mut member, now);
        if points_decayed == 0 {
            return Ok(ApplyDecayResult {
                member,
                points_decayed: 0,
            });
        }

        self.member_repository.update_member(&member).await?;
        self.append_ledger_entry(
            &member.id,
            LoyaltyKind::Decay,
            -points_decayed,
            "Annual loyalty point decay",
        )
        .await?;

        info!(
            "Decayed {} points from member {}",
            points_decayed, member.membership_number
        );
        Ok(ApplyDecayResult {
            member,
            points_decayed,
        })
    }

    /// Apply annual point decay across the whole membership
    pub async fn decay_sweep(&self, now: DateTime<Utc>) -> Result<DecaySweepResult> {
        info!("Running decay sweep");

        let members = self.member_repository.list_members().await?;
        let mut result = DecaySweepResult {
            members_evaluated: members.len(),
            members_decayed: 0,
            points_decayed: 0,
        };

        for member in members {
            let applied = self.apply_decay(&member.id, now).await?;
            if applied.points_decayed > 0 {
                result.members_decayed += 1;
                result.points_decayed += applied.points_decayed;
            }
        }

        info!(
            "Decay sweep complete: {}/{} members decayed, {} points removed",
            result.members_decayed, result.members_evaluated, result.points_decayed
        );
        Ok(result)
    }

    /// Progress of a member toward the next tier
    pub async fn tier_progress(&self, member_id: &str) -> Result<TierProgress> {
        let member = self.require_member(member_id).await?;
        Ok(benefit_engine::compute_next_tier_progress(&member))
    }

    /// Benefit package for a member's current tier
    pub async fn member_benefits(&self, member_id: &str) -> Result<TierBenefit> {
        let member = self.require_member(member_id).await?;
        Ok(benefit_engine::resolve_tier_benefits(member.tier).clone())
    }

    /// Claim the member's birthday gift for the current year
    pub async fn claim_birthday_gift(&self, member_id: &str) -> Result<ClaimBirthdayGiftResult> {
        info!("Claiming birthday gift for member: {}", member_id);

        let mut member = self.require_member(member_id).await?;

        if !member.is_active {
            return Err(anyhow::anyhow!(
                "Inactive members cannot claim birthday gifts"
            ));
        }
        if member.birthday_gift_claimed {
            return Err(anyhow::anyhow!(
                "Birthday gift already claimed this year for member {}",
                member.membership_number
            ));
        }

        member.birthday_gift_claimed = true;
        self.member_repository.update_member(&member).await?;

        let gift = benefit_engine::resolve_tier_benefits(member.tier)
            .birthday_gift
            .clone();
        self.append_ledger_entry(&member.id, LoyaltyKind::Birthday, 0, &gift.description)
            .await?;

        Ok(ClaimBirthdayGiftResult { member, gift })
    }

    /// Toggle a member's active flag (members are never deleted)
    pub async fn set_member_active(&self, member_id: &str, is_active: bool) -> Result<Member> {
        info!("Setting member {} active={}", member_id, is_active);

        let mut member = self.require_member(member_id).await?;
        member.is_active = is_active;
        self.member_repository.update_member(&member).await?;

        Ok(member)
    }

    /// Aggregate statistics over the whole membership
    pub async fn membership_stats(&self) -> Result<MembershipStats> {
        let members = self.member_repository.list_members().await?;
        Ok(membership_stats(&members))
    }

    /// Load a member or fail with a not-found error
    async fn require_member(&self, member_id: &str) -> Result<Member> {
        self.member_repository
            .get_member(member_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Member not found: {}", member_id))
    }

    /// Append an entry to the member's loyalty ledger
    async fn append_ledger_entry(
        &self,
        member_id: &str,
        kind: LoyaltyKind,
        points: i64,
        description: &str,
    ) -> Result<()> {
        let now = Utc::now();
        let entry = LoyaltyTransaction {
            id: LoyaltyTransaction::generate_id(kind, now.timestamp_millis() as u64),
            member_id: member_id.to_string(),
            kind,
            points,
            description: description.to_string(),
            created_at: now,
        };
        self.loyalty_repository.append_entry(&entry).await
    }

    /// Generate a referral code from the patient's name and join year.
    ///
    /// Uses the first five alphanumeric characters of the name, uppercased,
    /// followed by the join year; a numeric suffix disambiguates clashes.
    async fn generate_referral_code(
        &self,
        patient_name: &str,
        now: DateTime<Utc>,
        member_count: usize,
    ) -> Result<String> {
        let prefix: String = patient_name
            .chars()
            .filter(|c| c.is_alphanumeric())
            .take(5)
            .collect::<String>()
            .to_uppercase();
        let prefix = if prefix.is_empty() { "MEMBER".to_string() } else { prefix };

        let candidate = format!("{}{}", prefix, now.year());
        if self
            .member_repository
            .get_member_by_referral_code(&candidate)
            .await?
            .is_none()
        {
            return Ok(candidate);
        }

        Ok(format!("{}{}", candidate, member_count + 1))
    }

    /// Validate a ledger description
    fn validate_description(description: &str) -> Result<()> {
        if description.trim().is_empty() {
            return Err(anyhow::anyhow!("Description cannot be empty"));
        }
        if description.len() > 256 {
            return Err(anyhow::anyhow!("Description cannot exceed 256 characters"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::patients::RegisterPatientCommand;
    use crate::domain::patient_service::PatientService;
    use chrono::Months;
    use tempfile::TempDir;

    struct TestContext {
        service: MembershipService,
        patient_service: PatientService,
        _temp_dir: TempDir,
    }

    fn setup_test() -> TestContext {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let csv_conn = Arc::new(CsvConnection::new(temp_dir.path()).expect("Failed to init storage"));
        TestContext {
            service: MembershipService::new(csv_conn.clone()),
            patient_service: PatientService::new(csv_conn),
            _temp_dir: temp_dir,
        }
    }

    async fn register_patient(ctx: &TestContext, name: &str) -> String {
        let command = RegisterPatientCommand {
            name: name.to_string(),
            phone: "+62-812-0000-0000".to_string(),
            birth_date: "1990-05-15".to_string(),
        };
        ctx.patient_service
            .register_patient(command)
            .await
            .expect("Failed to register patient")
            .id
    }

    async fn enroll(ctx: &TestContext, patient_id: &str) -> Member {
        ctx.service
            .enroll_member(EnrollMemberCommand {
                patient_id: patient_id.to_string(),
                referred_by: None,
            })
            .await
            .expect("Failed to enroll member")
    }

    /// Back-date a member's last decay timestamp by whole months
    async fn backdate_last_decay(ctx: &TestContext, member_id: &str, months: u32) -> Member {
        let mut member = ctx
            .service
            .member_repository
            .get_member(member_id)
            .await
            .expect("Failed to get member")
            .expect("Member should exist");
        member.last_point_decay = member
            .last_point_decay
            .checked_sub_months(Months::new(months))
            .expect("Failed to back-date member");
        ctx.service
            .member_repository
            .update_member(&member)
            .await
            .expect("Failed to update member");
        member
    }

    #[tokio::test]
    async fn test_enroll_member() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;

        let member = enroll(&ctx, &patient_id).await;

        assert_eq!(member.patient_id, patient_id);
        assert_eq!(member.membership_number, "MBR000001");
        assert_eq!(member.tier, Tier::Bronze);
        assert_eq!(member.points, 0);
        assert_eq!(member.total_spent, 0);
        assert!(!member.birthday_gift_claimed);
        assert!(member.is_active);
        assert!(member.referral_code.starts_with("MARIA"));
    }

    #[tokio::test]
    async fn test_enroll_unknown_patient_fails() {
        let ctx = setup_test();

        let result = ctx
            .service
            .enroll_member(EnrollMemberCommand {
                patient_id: "patient::nonexistent".to_string(),
                referred_by: None,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_enroll_twice_fails() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        enroll(&ctx, &patient_id).await;

        let result = ctx
            .service
            .enroll_member(EnrollMemberCommand {
                patient_id: patient_id.clone(),
                referred_by: None,
            })
            .await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("already enrolled"));
    }

    #[tokio::test]
    async fn test_enroll_with_referral() {
        let ctx = setup_test();
        let referrer_patient = register_patient(&ctx, "Maria Garcia").await;
        let referrer = enroll(&ctx, &referrer_patient).await;

        let patient_id = register_patient(&ctx, "Sarah Lim").await;
        let member = ctx
            .service
            .enroll_member(EnrollMemberCommand {
                patient_id,
                referred_by: Some(referrer.referral_code.to_lowercase()),
            })
            .await
            .expect("Failed to enroll referred member");

        assert_eq!(member.referred_by, Some(referrer.referral_code));
    }

    #[tokio::test]
    async fn test_enroll_with_unknown_referral_fails() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Sarah Lim").await;

        let result = ctx
            .service
            .enroll_member(EnrollMemberCommand {
                patient_id,
                referred_by: Some("NOBODY2024".to_string()),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_record_spend_earns_points() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        // Bronze multiplier is 1.0: 250,000 IDR -> 25 points
        let result = ctx
            .service
            .record_spend(RecordSpendCommand {
                member_id: member.id.clone(),
                amount: 250_000,
                description: "Basic facial".to_string(),
            })
            .await
            .expect("Failed to record spend");

        assert_eq!(result.points_earned, 25);
        assert_eq!(result.member.points, 25);
        assert_eq!(result.member.total_spent, 250_000);
        assert!(!result.tier_changed);

        // An earn entry landed in the ledger
        let entries = ctx
            .service
            .loyalty_repository
            .list_entries(&member.id)
            .await
            .expect("Failed to list ledger");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, LoyaltyKind::Earn);
        assert_eq!(entries[0].points, 25);
    }

    #[tokio::test]
    async fn test_record_spend_promotes_at_exact_threshold() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        let result = ctx
            .service
            .record_spend(RecordSpendCommand {
                member_id: member.id.clone(),
                amount: 5_000_000,
                description: "Treatment package".to_string(),
            })
            .await
            .expect("Failed to record spend");

        assert!(result.tier_changed);
        assert_eq!(result.member.tier, Tier::Silver);
    }

    #[tokio::test]
    async fn test_record_spend_uses_pre_promotion_multiplier() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        // Spend lands the member in Gold, but points accrue at the Bronze
        // multiplier held when the spend completed
        let result = ctx
            .service
            .record_spend(RecordSpendCommand {
                member_id: member.id.clone(),
                amount: 20_000_000,
                description: "Annual package".to_string(),
            })
            .await
            .expect("Failed to record spend");

        assert_eq!(result.member.tier, Tier::Gold);
        assert_eq!(result.points_earned, 2_000);

        // The next spend earns at the Gold multiplier (2.0)
        let result = ctx
            .service
            .record_spend(RecordSpendCommand {
                member_id: member.id.clone(),
                amount: 100_000,
                description: "Follow-up visit".to_string(),
            })
            .await
            .expect("Failed to record spend");
        assert_eq!(result.points_earned, 20);
    }

    #[tokio::test]
    async fn test_record_spend_never_demotes_stale_high_tier() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        // Seed a tier above what the spend warrants
        let mut seeded = ctx
            .service
            .member_repository
            .get_member(&member.id)
            .await
            .unwrap()
            .unwrap();
        seeded.tier = Tier::Gold;
        ctx.service.member_repository.update_member(&seeded).await.unwrap();

        let result = ctx
            .service
            .record_spend(RecordSpendCommand {
                member_id: member.id.clone(),
                amount: 100_000,
                description: "Small visit".to_string(),
            })
            .await
            .expect("Failed to record spend");

        assert_eq!(result.member.tier, Tier::Gold);
        assert!(!result.tier_changed);
    }

    #[tokio::test]
    async fn test_record_spend_rejects_non_positive_amount() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        for amount in [0, -5_000] {
            let result = ctx
                .service
                .record_spend(RecordSpendCommand {
                    member_id: member.id.clone(),
                    amount,
                    description: "Invalid".to_string(),
                })
                .await;
            assert!(result.is_err());
        }
    }

    #[tokio::test]
    async fn test_redeem_points() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        ctx.service
            .record_spend(RecordSpendCommand {
                member_id: member.id.clone(),
                amount: 1_000_000,
                description: "Treatment".to_string(),
            })
            .await
            .expect("Failed to record spend");

        let updated = ctx
            .service
            .redeem_points(RedeemPointsCommand {
                member_id: member.id.clone(),
                points: 40,
                description: "Discount voucher".to_string(),
            })
            .await
            .expect("Failed to redeem points");
        assert_eq!(updated.points, 60);

        // Redeeming more than the balance must fail, balance unchanged
        let result = ctx
            .service
            .redeem_points(RedeemPointsCommand {
                member_id: member.id.clone(),
                points: 1_000,
                description: "Too much".to_string(),
            })
            .await;
        assert!(result.is_err());

        let member = ctx.service.get_member(&member.id).await.unwrap().unwrap();
        assert_eq!(member.points, 60);
    }

    #[tokio::test]
    async fn test_decay_applies_after_fourteen_months() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        ctx.service
            .record_spend(RecordSpendCommand {
                member_id: member.id.clone(),
                amount: 10_000_000,
                description: "Treatments".to_string(),
            })
            .await
            .expect("Failed to record spend");

        let backdated = backdate_last_decay(&ctx, &member.id, 14).await;
        let now = Utc::now();

        let pending = ctx
            .service
            .pending_decay(&member.id, now)
            .await
            .expect("Failed to compute pending decay");
        assert_eq!(pending, 300);

        let applied = ctx
            .service
            .apply_decay(&member.id, now)
            .await
            .expect("Failed to apply decay");
        assert_eq!(applied.points_decayed, 300);
        assert_eq!(applied.member.points, 700);
        assert_eq!(
            applied.member.last_point_decay,
            backdated
                .last_point_decay
                .checked_add_months(Months::new(12))
                .unwrap()
        );

        // Second application is a no-op and leaves no ledger entry behind
        let again = ctx
            .service
            .apply_decay(&member.id, now)
            .await
            .expect("Failed to apply decay");
        assert_eq!(again.points_decayed, 0);
        assert_eq!(again.member, applied.member);

        let decay_entries: Vec<_> = ctx
            .service
            .loyalty_repository
            .list_entries(&member.id)
            .await
            .expect("Failed to list ledger")
            .into_iter()
            .filter(|e| e.kind == LoyaltyKind::Decay)
            .collect();
        assert_eq!(decay_entries.len(), 1);
        assert_eq!(decay_entries[0].points, -300);
    }

    #[tokio::test]
    async fn test_decay_sweep() {
        let ctx = setup_test();

        let due_patient = register_patient(&ctx, "Maria Garcia").await;
        let due_member = enroll(&ctx, &due_patient).await;
        ctx.service
            .record_spend(RecordSpendCommand {
                member_id: due_member.id.clone(),
                amount: 1_000_000,
                description: "Treatment".to_string(),
            })
            .await
            .expect("Failed to record spend");
        backdate_last_decay(&ctx, &due_member.id, 13).await;

        let fresh_patient = register_patient(&ctx, "Sarah Lim").await;
        let fresh_member = enroll(&ctx, &fresh_patient).await;
        ctx.service
            .record_spend(RecordSpendCommand {
                member_id: fresh_member.id.clone(),
                amount: 1_000_000,
                description: "Treatment".to_string(),
            })
            .await
            .expect("Failed to record spend");

        let sweep = ctx
            .service
            .decay_sweep(Utc::now())
            .await
            .expect("Failed to run decay sweep");

        assert_eq!(sweep.members_evaluated, 2);
        assert_eq!(sweep.members_decayed, 1);
        assert_eq!(sweep.points_decayed, 30);
    }

    #[tokio::test]
    async fn test_tier_progress_via_service() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        ctx.service
            .record_spend(RecordSpendCommand {
                member_id: member.id.clone(),
                amount: 20_000_000,
                description: "Annual package".to_string(),
            })
            .await
            .expect("Failed to record spend");

        let progress = ctx
            .service
            .tier_progress(&member.id)
            .await
            .expect("Failed to compute progress");

        assert_eq!(progress.next_tier, Some(Tier::Platinum));
        assert_eq!(progress.amount_needed, 15_000_000);
        assert_eq!(progress.progress_percent, 25.0);
    }

    #[tokio::test]
    async fn test_claim_birthday_gift_once() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        let claim = ctx
            .service
            .claim_birthday_gift(&member.id)
            .await
            .expect("Failed to claim gift");
        assert!(claim.member.birthday_gift_claimed);
        assert_eq!(claim.gift.description, "Voucher Rp 100K");

        let again = ctx.service.claim_birthday_gift(&member.id).await;
        assert!(again.is_err());
        assert!(again.unwrap_err().to_string().contains("already claimed"));
    }

    #[tokio::test]
    async fn test_inactive_member_cannot_claim_gift() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        ctx.service
            .set_member_active(&member.id, false)
            .await
            .expect("Failed to deactivate member");

        assert!(ctx.service.claim_birthday_gift(&member.id).await.is_err());
    }

    #[tokio::test]
    async fn test_member_benefits() {
        let ctx = setup_test();
        let patient_id = register_patient(&ctx, "Maria Garcia").await;
        let member = enroll(&ctx, &patient_id).await;

        let benefits = ctx
            .service
            .member_benefits(&member.id)
            .await
            .expect("Failed to resolve benefits");
        assert_eq!(benefits.tier, Tier::Bronze);
        assert_eq!(benefits.discount_percentage, 5);
    }

    #[tokio::test]
    async fn test_list_members_search_and_filters() {
        let ctx = setup_test();

        let maria = register_patient(&ctx, "Maria Garcia").await;
        let maria_member = enroll(&ctx, &maria).await;
        ctx.service
            .record_spend(RecordSpendCommand {
                member_id: maria_member.id.clone(),
                amount: 8_500_000,
                description: "Treatments".to_string(),
            })
            .await
            .expect("Failed to record spend");

        let sarah = register_patient(&ctx, "Sarah Lim").await;
        let sarah_member = enroll(&ctx, &sarah).await;
        ctx.service
            .set_member_active(&sarah_member.id, false)
            .await
            .expect("Failed to deactivate member");

        // Free-text search over patient name
        let result = ctx
            .service
            .list_members(MemberListQuery {
                search: Some("maria".to_string()),
                ..Default::default()
            })
            .await
            .expect("Failed to list members");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].patient_name, "Maria Garcia");
        assert_eq!(result.entries[0].progress.next_tier, Some(Tier::Gold));

        // Search over membership number
        let result = ctx
            .service
            .list_members(MemberListQuery {
                search: Some("mbr000002".to_string()),
                ..Default::default()
            })
            .await
            .expect("Failed to list members");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].patient_name, "Sarah Lim");

        // Tier filter
        let result = ctx
            .service
            .list_members(MemberListQuery {
                tier: Some(Tier::Silver),
                ..Default::default()
            })
            .await
            .expect("Failed to list members");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].member.id, maria_member.id);

        // Status filter
        let result = ctx
            .service
            .list_members(MemberListQuery {
                is_active: Some(false),
                ..Default::default()
            })
            .await
            .expect("Failed to list members");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].member.id, sarah_member.id);
    }

    #[tokio::test]
    async fn test_membership_stats() {
        let ctx = setup_test();

        let maria = register_patient(&ctx, "Maria Garcia").await;
        let maria_member = enroll(&ctx, &maria).await;
        ctx.service
            .record_spend(RecordSpendCommand {
                member_id: maria_member.id.clone(),
                amount: 8_500_000,
                description: "Treatments".to_string(),
            })
            .await
            .expect("Failed to record spend");

        let sarah = register_patient(&ctx, "Sarah Lim").await;
        let sarah_member = enroll(&ctx, &sarah).await;
        ctx.service
            .set_member_active(&sarah_member.id, false)
            .await
            .expect("Failed to deactivate member");

        let stats = ctx
            .service
            .membership_stats()
            .await
            .expect("Failed to compute stats");

        assert_eq!(stats.total_members, 2);
        assert_eq!(stats.active_members, 1);
        assert_eq!(stats.tier_distribution.bronze, 1);
        assert_eq!(stats.tier_distribution.silver, 1);
        assert_eq!(stats.total_spent, 8_500_000);
        assert_eq!(stats.total_points, 850);
    }
}
