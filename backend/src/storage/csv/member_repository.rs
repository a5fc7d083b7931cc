use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use tracing::{debug, info, warn};

use super::connection::CsvConnection;
use crate::domain::models::member::Member as DomainMember;
use crate::io::rest::mappers::member_mapper::MemberMapper;
use shared::Member as SharedMember;

/// File-based member repository using filesystem discovery.
///
/// Each member owns a directory under `members/` named by their membership
/// number, holding `member.yaml` plus the loyalty ledger.
#[derive(Clone)]
pub struct MemberRepository {
    connection: CsvConnection,
}

impl MemberRepository {
    /// Create a new member repository
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Discover all members by scanning the members directory
    async fn discover_members(&self) -> Result<Vec<DomainMember>> {
        let members_dir = self.connection.members_directory();

        if !members_dir.exists() {
            debug!("Members directory doesn't exist, returning empty member list");
            return Ok(Vec::new());
        }

        let mut members = Vec::new();

        for entry in fs::read_dir(&members_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_dir() {
                continue;
            }

            let yaml_path = path.join("member.yaml");
            if !yaml_path.exists() {
                debug!("Directory {:?} doesn't contain a member record", path);
                continue;
            }

            match Self::load_member_file(&yaml_path) {
                Ok(member) => members.push(member),
                Err(e) => {
                    warn!("Error loading member from {:?}: {}", yaml_path, e);
                }
            }
        }

        // Sort by membership number for consistent ordering
        members.sort_by(|a, b| a.membership_number.cmp(&b.membership_number));

        debug!("Discovered {} members", members.len());
        Ok(members)
    }

    fn load_member_file(yaml_path: &std::path::Path) -> Result<DomainMember> {
        let yaml_content = fs::read_to_string(yaml_path)?;
        let shared_member: SharedMember = serde_yaml::from_str(&yaml_content)?;

        MemberMapper::to_domain(shared_member)
            .context("Failed to map shared member to domain member")
    }

    /// Save a member record to their directory
    fn save_member(&self, member: &DomainMember) -> Result<()> {
        let member_dir = self.connection.member_directory(&member.membership_number);
        if !member_dir.exists() {
            fs::create_dir_all(&member_dir)?;
            info!("Created member directory: {:?}", member_dir);
        }

        let yaml_path = self.connection.member_yaml_path(&member.membership_number);
        let shared_member = MemberMapper::to_dto(member.clone());
        let yaml_content = serde_yaml::to_string(&shared_member)?;

        // Atomic write using temp file
        let temp_path = yaml_path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &yaml_path)?;

        info!("Saved member {} ({})", member.membership_number, member.id);
        Ok(())
    }
}

#[async_trait]
impl crate::storage::MemberStorage for MemberRepository {
    /// Store a new member
    async fn store_member(&self, member: &DomainMember) -> Result<()> {
        self.save_member(member)
    }

    /// Retrieve a specific member by ID
    async fn get_member(&self, member_id: &str) -> Result<Option<DomainMember>> {
        let members = self.discover_members().await?;
        Ok(members.into_iter().find(|m| m.id == member_id))
    }

    /// Retrieve the membership linked to a patient, if any
    async fn get_member_by_patient(&self, patient_id: &str) -> Result<Option<DomainMember>> {
        let members = self.discover_members().await?;
        Ok(members.into_iter().find(|m| m.patient_id == patient_id))
    }

    /// Retrieve a member by their referral code
    async fn get_member_by_referral_code(&self, code: &str) -> Result<Option<DomainMember>> {
        let members = self.discover_members().await?;
        Ok(members
            .into_iter()
            .find(|m| m.referral_code.eq_ignore_ascii_case(code)))
    }

    /// List all members ordered by membership number
    async fn list_members(&self) -> Result<Vec<DomainMember>> {
        self.discover_members().await
    }

    /// Update an existing member
    async fn update_member(&self, member: &DomainMember) -> Result<()> {
        let yaml_path = self.connection.member_yaml_path(&member.membership_number);
        if !yaml_path.exists() {
            return Err(anyhow::anyhow!("Member not found: {}", member.id));
        }

        self.save_member(member)
    }

    /// Number of stored members
    async fn member_count(&self) -> Result<usize> {
        Ok(self.discover_members().await?.len())
    }
}
