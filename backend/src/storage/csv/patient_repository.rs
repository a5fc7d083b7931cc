use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use tracing::{debug, info, warn};

use super::connection::CsvConnection;
use crate::domain::models::patient::Patient as DomainPatient;
use crate::io::rest::mappers::patient_mapper::PatientMapper;
use shared::Patient as SharedPatient;

/// File-based patient repository, one YAML record per patient under the
/// `patients` directory (named by registration number).
#[derive(Clone)]
pub struct PatientRepository {
    connection: CsvConnection,
}

impl PatientRepository {
    /// Create a new patient repository
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Discover all patients by scanning the patients directory
    async fn discover_patients(&self) -> Result<Vec<DomainPatient>> {
        let patients_dir = self.connection.patients_directory();

        if !patients_dir.exists() {
            debug!("Patients directory doesn't exist, returning empty patient list");
            return Ok(Vec::new());
        }

        let mut patients = Vec::new();

        for entry in fs::read_dir(&patients_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }

            match Self::load_patient_file(&path) {
                Ok(patient) => patients.push(patient),
                Err(e) => {
                    warn!("Error loading patient from {:?}: {}", path, e);
                }
            }
        }

        // Sort patients by name for consistent ordering
        patients.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("Discovered {} patients", patients.len());
        Ok(patients)
    }

    fn load_patient_file(yaml_path: &std::path::Path) -> Result<DomainPatient> {
        let yaml_content = fs::read_to_string(yaml_path)?;
        let shared_patient: SharedPatient = serde_yaml::from_str(&yaml_content)?;

        PatientMapper::to_domain(shared_patient)
            .context("Failed to map shared patient to domain patient")
    }

    /// Save a patient record
    fn save_patient(&self, patient: &DomainPatient) -> Result<()> {
        let patients_dir = self.connection.patients_directory();
        if !patients_dir.exists() {
            fs::create_dir_all(&patients_dir)?;
        }

        let yaml_path = self.connection.patient_yaml_path(&patient.registration_number);
        let shared_patient = PatientMapper::to_dto(patient.clone());
        let yaml_content = serde_yaml::to_string(&shared_patient)?;

        // Atomic write using temp file
        let temp_path = yaml_path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &yaml_path)?;

        info!("Saved patient {} ({})", patient.registration_number, patient.id);
        Ok(())
    }
}

#[async_trait]
impl crate::storage::PatientStorage for PatientRepository {
    /// Store a new patient
    async fn store_patient(&self, patient: &DomainPatient) -> Result<()> {
        self.save_patient(patient)
    }

    /// Retrieve a specific patient by ID
    async fn get_patient(&self, patient_id: &str) -> Result<Option<DomainPatient>> {
        let patients = self.discover_patients().await?;
        Ok(patients.into_iter().find(|p| p.id == patient_id))
    }

    /// List all patients ordered by name
    async fn list_patients(&self) -> Result<Vec<DomainPatient>> {
        self.discover_patients().await
    }

    /// Update an existing patient
    async fn update_patient(&self, patient: &DomainPatient) -> Result<()> {
        let yaml_path = self.connection.patient_yaml_path(&patient.registration_number);
        if !yaml_path.exists() {
            return Err(anyhow::anyhow!("Patient not found: {}", patient.id));
        }

        self.save_patient(patient)
    }

    /// Number of registered patients
    async fn patient_count(&self) -> Result<usize> {
        Ok(self.discover_patients().await?.len())
    }
}
