use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::models::patient::Patient as DomainPatient;
use shared::{Patient as SharedPatient, PatientListResponse, PatientResponse};

/// Mapper to convert between shared Patient DTOs and domain Patient models.
pub struct PatientMapper;

impl PatientMapper {
    /// Converts a shared Patient DTO to a domain Patient model.
    pub fn to_domain(dto: SharedPatient) -> Result<DomainPatient> {
        let birth_date = NaiveDate::parse_from_str(&dto.birth_date, "%Y-%m-%d")
            .context("Failed to parse birth_date from shared DTO")?;
        let created_at = DateTime::parse_from_rfc3339(&dto.created_at)
            .context("Failed to parse created_at from shared DTO")?
            .with_timezone(&Utc);
        let updated_at = DateTime::parse_from_rfc3339(&dto.updated_at)
            .context("Failed to parse updated_at from shared DTO")?
            .with_timezone(&Utc);

        Ok(DomainPatient {
            id: dto.id,
            registration_number: dto.registration_number,
            name: dto.name,
            phone: dto.phone,
            birth_date,
            created_at,
            updated_at,
        })
    }

    /// Converts a domain Patient model to a shared Patient DTO.
    pub fn to_dto(domain: DomainPatient) -> SharedPatient {
        SharedPatient {
            id: domain.id,
            registration_number: domain.registration_number,
            name: domain.name,
            phone: domain.phone,
            birth_date: domain.birth_date.format("%Y-%m-%d").to_string(),
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_patient_response_dto(domain: DomainPatient, message: &str) -> PatientResponse {
        PatientResponse {
            patient: Self::to_dto(domain),
            success_message: message.to_string(),
        }
    }

    pub fn to_patient_list_dto(domain_patients: Vec<DomainPatient>) -> PatientListResponse {
        PatientListResponse {
            patients: domain_patients.into_iter().map(Self::to_dto).collect(),
        }
    }
}
