use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// CsvConnection manages file paths and ensures data files exist for each
/// member. The on-disk layout is one directory per member (named by
/// membership number) holding `member.yaml` and `loyalty.csv`, plus a
/// `patients` directory of per-patient YAML records.
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: Arc<Mutex<PathBuf>>,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: Arc::new(Mutex::new(base_path)),
        })
    }

    /// Create a new CSV connection in the default data directory
    /// (~/Documents/Clinic Membership)
    pub fn new_default() -> Result<Self> {
        let home_dir = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;

        let documents_dir = PathBuf::from(home_dir).join("Documents");
        Self::new(documents_dir.join("Clinic Membership"))
    }

    /// Generate a safe filesystem identifier from a membership number
    pub fn safe_directory_name(membership_number: &str) -> String {
        membership_number
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect::<String>()
            .trim_matches('_')
            .to_string()
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> PathBuf {
        let base_dir = self.base_directory.lock().unwrap();
        base_dir.clone()
    }

    /// Directory holding one subdirectory per member
    pub fn members_directory(&self) -> PathBuf {
        self.base_directory().join("members")
    }

    /// Get the directory path for a member's data
    pub fn member_directory(&self, membership_number: &str) -> PathBuf {
        self.members_directory()
            .join(Self::safe_directory_name(membership_number))
    }

    /// Get the path to a member's YAML record
    pub fn member_yaml_path(&self, membership_number: &str) -> PathBuf {
        self.member_directory(membership_number).join("member.yaml")
    }

    /// Get the path to a member's loyalty ledger CSV
    pub fn loyalty_file_path(&self, membership_number: &str) -> PathBuf {
        self.member_directory(membership_number).join("loyalty.csv")
    }

    /// Ensure the loyalty CSV exists with proper header for the member
    pub fn ensure_loyalty_file_exists(&self, membership_number: &str) -> Result<()> {
        let member_dir = self.member_directory(membership_number);

        if !member_dir.exists() {
            fs::create_dir_all(&member_dir)?;
        }

        let file_path = member_dir.join("loyalty.csv");
        if !file_path.exists() {
            let header = "id,member_id,kind,points,description,created_at\n";
            fs::write(&file_path, header)?;
        }

        Ok(())
    }

    /// Directory holding one YAML record per patient
    pub fn patients_directory(&self) -> PathBuf {
        self.base_directory().join("patients")
    }

    /// Get the path to a patient's YAML record
    pub fn patient_yaml_path(&self, registration_number: &str) -> PathBuf {
        self.patients_directory()
            .join(format!("{}.yaml", Self::safe_directory_name(registration_number)))
    }
}
