use admitdesk_core::AppError;
use admitdesk_core::ids::{generate_admission_id, generate_registration_no, generate_unique_id};
use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedIds {
    pub admission_id: String,
    pub unique_id: String,
    pub registration_no: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationNoResponse {
    pub unique_id: String,
    pub registration_no: String,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationParams {
    pub unique_id: String,
}

/// A fresh set of identifiers for a blank application form.
#[instrument]
pub async fn generate_ids() -> Result<Json<GeneratedIds>, AppError> {
    let unique_id = generate_unique_id();
    let registration_no = generate_registration_no(&unique_id)?;

    Ok(Json(GeneratedIds {
        admission_id: generate_admission_id(),
        unique_id,
        registration_no,
    }))
}

#[instrument]
pub async fn generate_registration(
    Query(params): Query<RegistrationParams>,
) -> Result<Json<RegistrationNoResponse>, AppError> {
    let registration_no = generate_registration_no(&params.unique_id)?;
    Ok(Json(RegistrationNoResponse {
        unique_id: params.unique_id,
        registration_no,
    }))
}
