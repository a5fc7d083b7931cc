//! # REST API for Patient Management
//!
//! Endpoints for registering, retrieving and updating patients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{error, info};

use crate::domain::commands::patients::{RegisterPatientCommand, UpdatePatientCommand};
use crate::io::rest::mappers::patient_mapper::PatientMapper;
use crate::AppState;
use shared::{RegisterPatientRequest, UpdatePatientRequest};

/// Register a new patient
pub async fn register_patient(
    State(state): State<AppState>,
    Json(request): Json<RegisterPatientRequest>,
) -> impl IntoResponse {
    info!("POST /api/patients - request: {:?}", request);

    let command = RegisterPatientCommand {
        name: request.name,
        phone: request.phone,
        birth_date: request.birth_date,
    };

    match state.patient_service.register_patient(command).await {
        Ok(patient) => (
            StatusCode::CREATED,
            Json(PatientMapper::to_patient_response_dto(
                patient,
                "Patient registered successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to register patient: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Get a patient by ID
pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/patients/{}", patient_id);

    match state.patient_service.get_patient(&patient_id).await {
        Ok(Some(patient)) => (StatusCode::OK, Json(PatientMapper::to_dto(patient))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Patient not found").into_response(),
        Err(e) => {
            error!("Failed to get patient: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving patient").into_response()
        }
    }
}

/// List all patients
pub async fn list_patients(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/patients");

    match state.patient_service.list_patients().await {
        Ok(patients) => (
            StatusCode::OK,
            Json(PatientMapper::to_patient_list_dto(patients)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to list patients: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing patients").into_response()
        }
    }
}

/// Update a patient
pub async fn update_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> impl IntoResponse {
    info!("PUT /api/patients/{} - request: {:?}", patient_id, request);

    let command = UpdatePatientCommand {
        name: request.name,
        phone: request.phone,
        birth_date: request.birth_date,
    };

    match state.patient_service.update_patient(&patient_id, command).await {
        Ok(patient) => (
            StatusCode::OK,
            Json(PatientMapper::to_patient_response_dto(
                patient,
                "Patient updated successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update patient: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, e.to_string()).into_response()
        }
    }
}
