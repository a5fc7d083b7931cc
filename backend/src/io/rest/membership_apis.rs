//! # REST API for Membership Management
//!
//! Endpoints for enrollment, the membership directory, loyalty points
//! (spend, redemption, decay), tier progress and benefits, birthday gifts
//! and program statistics.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::domain::benefit_engine;
use crate::domain::commands::members::{
    EnrollMemberCommand, MemberListQuery, RecordSpendCommand, RedeemPointsCommand,
};
use crate::domain::models::tier::Tier;
use crate::io::rest::mappers::member_mapper::MemberMapper;
use crate::AppState;
use shared::{
    ApplyDecayResponse, ClaimBirthdayGiftResponse, DecaySweepResponse, EnrollMemberRequest,
    PendingDecayResponse, RecordSpendRequest, RecordSpendResponse, RedeemPointsRequest,
    RedeemPointsResponse, SetMemberActiveRequest, TierBenefitsResponse,
};

/// Query parameters for the member directory endpoint
#[derive(Deserialize, Debug)]
pub struct MemberListParams {
    pub search: Option<String>,
    pub tier: Option<String>,
    pub is_active: Option<bool>,
}

/// Enroll a patient into the membership program
pub async fn enroll_member(
    State(state): State<AppState>,
    Json(request): Json<EnrollMemberRequest>,
) -> impl IntoResponse {
    info!("POST /api/members - request: {:?}", request);

    let command = EnrollMemberCommand {
        patient_id: request.patient_id,
        referred_by: request.referred_by,
    };

    match state.membership_service.enroll_member(command).await {
        Ok(member) => (
            StatusCode::CREATED,
            Json(MemberMapper::to_member_response_dto(
                member,
                "Member enrolled successfully",
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to enroll member: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// List the membership directory with optional search and filters
pub async fn list_members(
    State(state): State<AppState>,
    Query(params): Query<MemberListParams>,
) -> impl IntoResponse {
    info!("GET /api/members - params: {:?}", params);

    let tier = match params.tier.as_deref() {
        Some(raw) => match raw.parse::<Tier>() {
            Ok(tier) => Some(tier),
            Err(e) => {
                error!("Rejected member list query: {}", e);
                return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
            }
        },
        None => None,
    };

    let query = MemberListQuery {
        search: params.search,
        tier,
        is_active: params.is_active,
    };

    match state.membership_service.list_members(query).await {
        Ok(result) => (
            StatusCode::OK,
            Json(MemberMapper::to_member_list_dto(result.entries)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to list members: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing members").into_response()
        }
    }
}

/// Get a member by ID
pub async fn get_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/members/{}", member_id);

    match state.membership_service.get_member(&member_id).await {
        Ok(Some(member)) => (StatusCode::OK, Json(MemberMapper::to_dto(member))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Member not found").into_response(),
        Err(e) => {
            error!("Failed to get member: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving member").into_response()
        }
    }
}

/// Record completed spend against a membership
pub async fn record_spend(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(request): Json<RecordSpendRequest>,
) -> impl IntoResponse {
    info!("POST /api/members/{}/spend - request: {:?}", member_id, request);

    let command = RecordSpendCommand {
        member_id,
        amount: request.amount,
        description: request.description,
    };

    match state.membership_service.record_spend(command).await {
        Ok(result) => (
            StatusCode::OK,
            Json(RecordSpendResponse {
                member: MemberMapper::to_dto(result.member),
                points_earned: result.points_earned,
                tier_changed: result.tier_changed,
                success_message: result.success_message,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to record spend: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Redeem loyalty points
pub async fn redeem_points(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(request): Json<RedeemPointsRequest>,
) -> impl IntoResponse {
    info!("POST /api/members/{}/redeem - request: {:?}", member_id, request);

    let command = RedeemPointsCommand {
        member_id,
        points: request.points,
        description: request.description,
    };

    match state.membership_service.redeem_points(command).await {
        Ok(member) => (
            StatusCode::OK,
            Json(RedeemPointsResponse {
                member: MemberMapper::to_dto(member),
                success_message: "Points redeemed successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to redeem points: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Preview the decay that would apply to a member right now
pub async fn get_pending_decay(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/members/{}/decay", member_id);

    match state
        .membership_service
        .pending_decay(&member_id, Utc::now())
        .await
    {
        Ok(pending_decay) => (
            StatusCode::OK,
            Json(PendingDecayResponse {
                member_id,
                pending_decay,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to compute pending decay: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Apply annual point decay to a member
pub async fn apply_decay(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/members/{}/decay", member_id);

    match state
        .membership_service
        .apply_decay(&member_id, Utc::now())
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(ApplyDecayResponse {
                member: MemberMapper::to_dto(result.member),
                points_decayed: result.points_decayed,
                success_message: "Point decay applied".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to apply decay: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Run the annual point decay across all members
pub async fn decay_sweep(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/membership/decay-sweep");

    match state.membership_service.decay_sweep(Utc::now()).await {
        Ok(result) => (
            StatusCode::OK,
            Json(DecaySweepResponse {
                members_evaluated: result.members_evaluated,
                members_decayed: result.members_decayed,
                points_decayed: result.points_decayed,
                success_message: "Decay sweep completed".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to run decay sweep: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error running decay sweep").into_response()
        }
    }
}

/// Progress of a member toward the next tier
pub async fn get_tier_progress(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/members/{}/progress", member_id);

    match state.membership_service.tier_progress(&member_id).await {
        Ok(progress) => (
            StatusCode::OK,
            Json(MemberMapper::to_tier_progress_dto(progress)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to compute tier progress: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Benefit package for a member's current tier
pub async fn get_member_benefits(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/members/{}/benefits", member_id);

    match state.membership_service.member_benefits(&member_id).await {
        Ok(benefits) => (
            StatusCode::OK,
            Json(MemberMapper::to_tier_benefit_dto(benefits)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to resolve member benefits: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Claim a member's birthday gift
pub async fn claim_birthday_gift(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/members/{}/birthday-gift", member_id);

    match state.membership_service.claim_birthday_gift(&member_id).await {
        Ok(result) => (
            StatusCode::OK,
            Json(ClaimBirthdayGiftResponse {
                member: MemberMapper::to_dto(result.member),
                gift: MemberMapper::to_birthday_gift_dto(result.gift),
                success_message: "Birthday gift claimed".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to claim birthday gift: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Toggle a member's active flag
pub async fn set_member_active(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(request): Json<SetMemberActiveRequest>,
) -> impl IntoResponse {
    info!(
        "PUT /api/members/{}/active - is_active: {}",
        member_id, request.is_active
    );

    match state
        .membership_service
        .set_member_active(&member_id, request.is_active)
        .await
    {
        Ok(member) => (
            StatusCode::OK,
            Json(MemberMapper::to_member_response_dto(
                member,
                "Member status updated",
            )),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update member status: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Aggregate statistics over the membership program
pub async fn get_membership_stats(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/membership/stats");

    match state.membership_service.membership_stats().await {
        Ok(stats) => (StatusCode::OK, Json(MemberMapper::to_stats_dto(stats))).into_response(),
        Err(e) => {
            error!("Failed to compute membership stats: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error computing stats").into_response()
        }
    }
}

/// The static tier benefit table
pub async fn get_tier_table() -> impl IntoResponse {
    info!("GET /api/membership/tiers");

    let tiers = Tier::ALL
        .iter()
        .map(|tier| MemberMapper::to_tier_benefit_dto(benefit_engine::resolve_tier_benefits(*tier).clone()))
        .collect();

    (StatusCode::OK, Json(TierBenefitsResponse { tiers }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::patients::RegisterPatientCommand;
    use crate::initialize_backend;
    use crate::storage::csv::CsvConnection;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let csv_conn = Arc::new(CsvConnection::new(temp_dir.path()).expect("Failed to init storage"));
        let state = initialize_backend(csv_conn).expect("Failed to initialize backend");
        (state, temp_dir)
    }

    async fn register_test_patient(state: &AppState) -> String {
        state
            .patient_service
            .register_patient(RegisterPatientCommand {
                name: "Maria Garcia".to_string(),
                phone: "+62-812-0000-0000".to_string(),
                birth_date: "1990-05-15".to_string(),
            })
            .await
            .expect("Failed to register patient")
            .id
    }

    #[tokio::test]
    async fn test_enroll_member_handler() {
        let (state, _temp_dir) = setup_test_state().await;
        let patient_id = register_test_patient(&state).await;

        let request = EnrollMemberRequest {
            patient_id,
            referred_by: None,
        };

        let response = enroll_member(State(state), Json(request)).await.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_enroll_member_unknown_patient_returns_not_found() {
        let (state, _temp_dir) = setup_test_state().await;

        let request = EnrollMemberRequest {
            patient_id: "patient::missing".to_string(),
            referred_by: None,
        };

        let response = enroll_member(State(state), Json(request)).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_members_rejects_unknown_tier() {
        let (state, _temp_dir) = setup_test_state().await;

        let params = MemberListParams {
            search: None,
            tier: Some("diamond".to_string()),
            is_active: None,
        };

        let response = list_members(State(state), Query(params)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_record_spend_handler() {
        let (state, _temp_dir) = setup_test_state().await;
        let patient_id = register_test_patient(&state).await;

        let member = state
            .membership_service
            .enroll_member(EnrollMemberCommand {
                patient_id,
                referred_by: None,
            })
            .await
            .expect("Failed to enroll member");

        let request = RecordSpendRequest {
            amount: 250_000,
            description: "Basic facial".to_string(),
        };

        let response = record_spend(State(state), Path(member.id), Json(request))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_missing_member_returns_not_found() {
        let (state, _temp_dir) = setup_test_state().await;

        let response = get_member(State(state), Path("member::missing".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tier_table_handler() {
        let response = get_tier_table().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
