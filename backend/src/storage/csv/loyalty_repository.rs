use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{Reader, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};

use super::connection::CsvConnection;
use super::member_repository::MemberRepository;
use crate::domain::models::loyalty::{LoyaltyKind, LoyaltyTransaction};
use crate::storage::MemberStorage;

/// CSV-based loyalty ledger repository.
///
/// Each member's ledger is an append-only `loyalty.csv` in their data
/// directory.
#[derive(Clone)]
pub struct LoyaltyRepository {
    connection: CsvConnection,
    member_repository: MemberRepository,
}

impl LoyaltyRepository {
    /// Create a new CSV loyalty repository
    pub fn new(connection: CsvConnection) -> Self {
        let member_repository = MemberRepository::new(connection.clone());
        Self {
            connection,
            member_repository,
        }
    }

    /// Resolve the membership number for a member ID
    async fn membership_number(&self, member_id: &str) -> Result<String> {
        match self.member_repository.get_member(member_id).await? {
            Some(member) => Ok(member.membership_number),
            None => Err(anyhow::anyhow!("Member not found: {}", member_id)),
        }
    }

    /// Read all ledger entries from a member's CSV file
    fn read_entries(&self, membership_number: &str, member_id: &str) -> Result<Vec<LoyaltyTransaction>> {
        self.connection.ensure_loyalty_file_exists(membership_number)?;

        let file_path = self.connection.loyalty_file_path(membership_number);
        let file = File::open(&file_path)?;
        let reader = BufReader::new(file);
        let mut csv_reader = Reader::from_reader(reader);

        let mut entries = Vec::new();

        for result in csv_reader.records() {
            let record = result?;

            let kind = LoyaltyKind::parse(record.get(2).unwrap_or(""))
                .ok_or_else(|| anyhow::anyhow!("Invalid loyalty kind in ledger for {}", member_id))?;
            let created_at = DateTime::parse_from_rfc3339(record.get(5).unwrap_or(""))
                .map_err(|e| anyhow::anyhow!("Invalid timestamp in ledger for {}: {}", member_id, e))?
                .with_timezone(&Utc);

            entries.push(LoyaltyTransaction {
                id: record.get(0).unwrap_or("").to_string(),
                member_id: record.get(1).unwrap_or("").to_string(),
                kind,
                points: record.get(3).unwrap_or("0").parse::<i64>().unwrap_or(0),
                description: record.get(4).unwrap_or("").to_string(),
                created_at,
            });
        }

        Ok(entries)
    }
}

#[async_trait]
impl crate::storage::LoyaltyStorage for LoyaltyRepository {
    /// Append an entry to a member's ledger
    async fn append_entry(&self, entry: &LoyaltyTransaction) -> Result<()> {
        let membership_number = self.membership_number(&entry.member_id).await?;
        self.connection.ensure_loyalty_file_exists(&membership_number)?;

        let file_path = self.connection.loyalty_file_path(&membership_number);
        let file = OpenOptions::new().append(true).open(&file_path)?;
        let writer = BufWriter::new(file);

        // Header already written when the file was created
        let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(&[
            &entry.id,
            &entry.member_id,
            entry.kind.as_str(),
            &entry.points.to_string(),
            &entry.description,
            &entry.created_at.to_rfc3339(),
        ])?;
        csv_writer.flush()?;

        Ok(())
    }

    /// List a member's ledger entries in insertion order
    async fn list_entries(&self, member_id: &str) -> Result<Vec<LoyaltyTransaction>> {
        let membership_number = self.membership_number(member_id).await?;
        self.read_entries(&membership_number, member_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::member::Member as DomainMember;
    use crate::domain::models::tier::Tier;
    use crate::storage::LoyaltyStorage;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn setup_test_repo() -> (LoyaltyRepository, MemberRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let member_repo = MemberRepository::new(connection.clone());
        let repo = LoyaltyRepository::new(connection);
        (repo, member_repo, temp_dir)
    }

    async fn store_test_member(member_repo: &MemberRepository) -> String {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let member = DomainMember {
            id: "member::123".to_string(),
            patient_id: "patient::1".to_string(),
            membership_number: "MBR000001".to_string(),
            tier: Tier::Bronze,
            points: 0,
            total_spent: 0,
            join_date: ts,
            last_point_decay: ts,
            birthday_gift_claimed: false,
            family_members: vec![],
            referral_code: "TEST2024".to_string(),
            referred_by: None,
            is_active: true,
        };
        member_repo.store_member(&member).await.expect("Failed to store member");
        member.id
    }

    fn test_entry(id: &str, member_id: &str, kind: LoyaltyKind, points: i64) -> LoyaltyTransaction {
        LoyaltyTransaction {
            id: id.to_string(),
            member_id: member_id.to_string(),
            kind,
            points,
            description: "Facial treatment, invoice #42".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 2, 1, 14, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_append_and_list_entries() {
        let (repo, member_repo, _temp_dir) = setup_test_repo();
        let member_id = store_test_member(&member_repo).await;

        let earn = test_entry("loyalty::earn::1", &member_id, LoyaltyKind::Earn, 250);
        let redeem = test_entry("loyalty::redeem::2", &member_id, LoyaltyKind::Redeem, -100);

        repo.append_entry(&earn).await.expect("Failed to append entry");
        repo.append_entry(&redeem).await.expect("Failed to append entry");

        let entries = repo.list_entries(&member_id).await.expect("Failed to list entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], earn);
        assert_eq!(entries[1], redeem);
    }

    #[tokio::test]
    async fn test_list_entries_empty_ledger() {
        let (repo, member_repo, _temp_dir) = setup_test_repo();
        let member_id = store_test_member(&member_repo).await;

        let entries = repo.list_entries(&member_id).await.expect("Failed to list entries");
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_append_for_unknown_member_fails() {
        let (repo, _member_repo, _temp_dir) = setup_test_repo();

        let entry = test_entry("loyalty::earn::1", "member::missing", LoyaltyKind::Earn, 10);
        assert!(repo.append_entry(&entry).await.is_err());
    }

    #[tokio::test]
    async fn test_entries_with_commas_in_description_round_trip() {
        let (repo, member_repo, _temp_dir) = setup_test_repo();
        let member_id = store_test_member(&member_repo).await;

        let mut entry = test_entry("loyalty::bonus::3", &member_id, LoyaltyKind::Bonus, 50);
        entry.description = "Referral bonus, campaign \"friends, family\"".to_string();

        repo.append_entry(&entry).await.expect("Failed to append entry");

        let entries = repo.list_entries(&member_id).await.expect("Failed to list entries");
        assert_eq!(entries, vec![entry]);
    }
}
