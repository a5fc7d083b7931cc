use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::patients::{RegisterPatientCommand, UpdatePatientCommand};
use crate::domain::models::patient::Patient;
use crate::storage::csv::{CsvConnection, PatientRepository};
use crate::storage::PatientStorage;

/// Service for managing patients in the clinic membership system
#[derive(Clone)]
pub struct PatientService {
    patient_repository: PatientRepository,
}

impl PatientService {
    /// Create a new PatientService
    pub fn new(csv_conn: Arc<CsvConnection>) -> Self {
        let patient_repository = PatientRepository::new((*csv_conn).clone());
        Self { patient_repository }
    }

    /// Register a new patient
    pub async fn register_patient(&self, command: RegisterPatientCommand) -> Result<Patient> {
        info!("Registering patient: name={}", command.name);

        Self::validate_name(&command.name)?;
        Self::validate_phone(&command.phone)?;
        let birth_date = Self::parse_birth_date(&command.birth_date)?;

        let now = Utc::now();
        let timestamp_millis = now.timestamp_millis() as u64;

        let registration_number =
            format!("REG{:04}", self.patient_repository.patient_count().await? + 1);

        let patient = Patient {
            id: Patient::generate_id(timestamp_millis),
            registration_number,
            name: command.name.trim().to_string(),
            phone: command.phone.trim().to_string(),
            birth_date,
            created_at: now,
            updated_at: now,
        };

        self.patient_repository.store_patient(&patient).await?;

        info!("Registered patient: {} with ID: {}", patient.name, patient.id);
        Ok(patient)
    }

    /// Get a patient by ID
    pub async fn get_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
        info!("Getting patient: {}", patient_id);

        let patient = self.patient_repository.get_patient(patient_id).await?;

        if patient.is_none() {
            warn!("Patient not found: {}", patient_id);
        }

        Ok(patient)
    }

    /// List all patients
    pub async fn list_patients(&self) -> Result<Vec<Patient>> {
        info!("Listing all patients");

        let patients = self.patient_repository.list_patients().await?;

        info!("Found {} patients", patients.len());
        Ok(patients)
    }

    /// Update an existing patient
    pub async fn update_patient(
        &self,
        patient_id: &str,
        command: UpdatePatientCommand,
    ) -> Result<Patient> {
        info!("Updating patient: {}", patient_id);

        let mut patient = self
            .patient_repository
            .get_patient(patient_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Patient not found: {}", patient_id))?;

        if let Some(name) = command.name {
            Self::validate_name(&name)?;
            patient.name = name.trim().to_string();
        }
        if let Some(phone) = command.phone {
            Self::validate_phone(&phone)?;
            patient.phone = phone.trim().to_string();
        }
        if let Some(birth_date) = command.birth_date {
            patient.birth_date = Self::parse_birth_date(&birth_date)?;
        }

        patient.updated_at = Utc::now();

        self.patient_repository.update_patient(&patient).await?;

        info!("Updated patient: {} with ID: {}", patient.name, patient.id);
        Ok(patient)
    }

    /// Validate a patient name
    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow::anyhow!("Patient name cannot be empty"));
        }
        if name.len() > 100 {
            return Err(anyhow::anyhow!("Patient name cannot exceed 100 characters"));
        }
        Ok(())
    }

    /// Validate a phone number
    fn validate_phone(phone: &str) -> Result<()> {
        if phone.trim().is_empty() {
            return Err(anyhow::anyhow!("Patient phone cannot be empty"));
        }
        Ok(())
    }

    /// Parse a birth date in YYYY-MM-DD format
    fn parse_birth_date(birth_date: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(birth_date, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Birth date must be in YYYY-MM-DD format"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test() -> (PatientService, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let csv_conn = Arc::new(CsvConnection::new(temp_dir.path()).expect("Failed to init storage"));
        (PatientService::new(csv_conn), temp_dir)
    }

    #[tokio::test]
    async fn test_register_patient() {
        let (service, _temp_dir) = setup_test();

        let command = RegisterPatientCommand {
            name: "Maria Garcia".to_string(),
            phone: "+62-812-3456-7890".to_string(),
            birth_date: "1990-05-15".to_string(),
        };

        let patient = service.register_patient(command).await.expect("Failed to register patient");

        assert_eq!(patient.name, "Maria Garcia");
        assert_eq!(patient.registration_number, "REG0001");
        assert!(patient.id.starts_with("patient::"));
        assert_eq!(patient.birth_date, NaiveDate::from_ymd_opt(1990, 5, 15).unwrap());
    }

    #[tokio::test]
    async fn test_register_patient_validation() {
        let (service, _temp_dir) = setup_test();

        // Empty name
        let command = RegisterPatientCommand {
            name: "".to_string(),
            phone: "+62-812-3456-7890".to_string(),
            birth_date: "1990-05-15".to_string(),
        };
        assert!(service.register_patient(command).await.is_err());

        // Invalid birth date
        let command = RegisterPatientCommand {
            name: "Maria Garcia".to_string(),
            phone: "+62-812-3456-7890".to_string(),
            birth_date: "15/05/1990".to_string(),
        };
        assert!(service.register_patient(command).await.is_err());

        // Empty phone
        let command = RegisterPatientCommand {
            name: "Maria Garcia".to_string(),
            phone: "  ".to_string(),
            birth_date: "1990-05-15".to_string(),
        };
        assert!(service.register_patient(command).await.is_err());
    }

    #[tokio::test]
    async fn test_registration_numbers_are_sequential() {
        let (service, _temp_dir) = setup_test();

        for (i, name) in ["Maria Garcia", "Sarah Lim"].iter().enumerate() {
            let command = RegisterPatientCommand {
                name: name.to_string(),
                phone: "+62-812-0000-0000".to_string(),
                birth_date: "1985-01-01".to_string(),
            };
            let patient = service.register_patient(command).await.expect("Failed to register patient");
            assert_eq!(patient.registration_number, format!("REG{:04}", i + 1));
        }
    }

    #[tokio::test]
    async fn test_get_nonexistent_patient() {
        let (service, _temp_dir) = setup_test();

        let patient = service
            .get_patient("patient::nonexistent")
            .await
            .expect("Failed to query patient");
        assert!(patient.is_none());
    }

    #[tokio::test]
    async fn test_update_patient() {
        let (service, _temp_dir) = setup_test();

        let command = RegisterPatientCommand {
            name: "Maria Garcia".to_string(),
            phone: "+62-812-3456-7890".to_string(),
            birth_date: "1990-05-15".to_string(),
        };
        let patient = service.register_patient(command).await.expect("Failed to register patient");

        let update = UpdatePatientCommand {
            name: Some("Maria Garcia-Tan".to_string()),
            phone: None,
            birth_date: None,
        };
        let updated = service
            .update_patient(&patient.id, update)
            .await
            .expect("Failed to update patient");

        assert_eq!(updated.name, "Maria Garcia-Tan");
        assert_eq!(updated.phone, patient.phone);
        assert_eq!(updated.created_at, patient.created_at);
    }

    #[tokio::test]
    async fn test_update_nonexistent_patient() {
        let (service, _temp_dir) = setup_test();

        let update = UpdatePatientCommand {
            name: Some("New Name".to_string()),
            phone: None,
            birth_date: None,
        };
        assert!(service.update_patient("patient::nonexistent", update).await.is_err());
    }
}
