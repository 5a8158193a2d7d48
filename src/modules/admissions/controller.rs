use admitdesk_core::file_storage::{self, StoredDocument};
use admitdesk_core::ids::{generate_admission_id, generate_registration_no, generate_unique_id};
use admitdesk_core::pagination::MAX_LIMIT;
use admitdesk_core::{AppError, Page, PaginationParams};
use admitdesk_models::ClassName;
use anyhow::anyhow;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{KeepAliveStream, Sse},
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::modules::admissions::model::{
    AdmissionQuery, AdmissionRecord, AdmissionStats, AdmissionStatus, CreateAdmissionDto,
    DeleteDocumentParams, REGISTRATION_NO_FIELD, ROLL_NUMBER_FIELD, RecentParams, SearchParams,
    UNIQUE_ID_FIELD, UpdateStatusDto, UploadDocumentParams,
};
use crate::modules::admissions::service::record_path;
use crate::sse::{SubscriptionStream, emit, json_event, repo_error_event, subscription_stream};
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Saves an application form, generating any identifiers it lacks.
#[instrument(skip(state, dto))]
pub async fn create_admission(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAdmissionDto>,
) -> Result<(StatusCode, Json<AdmissionRecord>), AppError> {
    let class_name: ClassName = dto.class_applied.parse()?;
    let admission_id = dto
        .admission_id
        .clone()
        .unwrap_or_else(generate_admission_id);

    let mut record = dto.into_record(admission_id);
    fill_identifiers(&state, &mut record, class_name).await?;

    let saved = state.admissions.save(record).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn fill_identifiers(
    state: &AppState,
    record: &mut AdmissionRecord,
    class_name: ClassName,
) -> Result<(), AppError> {
    let unique_id = match field_string(record, UNIQUE_ID_FIELD) {
        Some(unique_id) => unique_id,
        None => {
            let unique_id = generate_unique_id();
            record
                .extra
                .insert(UNIQUE_ID_FIELD.into(), Value::String(unique_id.clone()));
            unique_id
        }
    };

    if field_string(record, REGISTRATION_NO_FIELD).is_none() {
        let registration_no = generate_registration_no(&unique_id)?;
        record
            .extra
            .insert(REGISTRATION_NO_FIELD.into(), Value::String(registration_no));
    }

    if field_string(record, ROLL_NUMBER_FIELD).is_none() {
        let roll_number = state
            .roll_numbers
            .generate_roll_number(&class_name.to_string())
            .await?;
        record
            .extra
            .insert(ROLL_NUMBER_FIELD.into(), Value::String(roll_number));
    }

    Ok(())
}

/// Non-empty text of a pass-through field; numbers count as their digits.
fn field_string(record: &AdmissionRecord, name: &str) -> Option<String> {
    match record.field(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[instrument(skip(state))]
pub async fn list_admissions(
    State(state): State<AppState>,
    Query(query): Query<AdmissionQuery>,
) -> Result<Json<Vec<AdmissionRecord>>, AppError> {
    let filter = query.into_filter()?;
    let admissions = state.admissions.get_all(&filter).await?;
    Ok(Json(admissions))
}

#[instrument(skip(state))]
pub async fn get_paginated_admissions(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Page<AdmissionRecord>>, AppError> {
    let page = state
        .admissions
        .get_paginated(params.page(), params.limit())
        .await?;
    Ok(Json(page))
}

#[instrument(skip(state))]
pub async fn search_admissions(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<AdmissionRecord>>, AppError> {
    let admissions = state.admissions.search(&params.term, params.field()).await?;
    Ok(Json(admissions))
}

#[instrument(skip(state))]
pub async fn get_recent_admissions(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<AdmissionRecord>>, AppError> {
    let admissions = state
        .admissions
        .get_recent(params.limit().min(MAX_LIMIT))
        .await?;
    Ok(Json(admissions))
}

#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<AdmissionStats>, AppError> {
    Ok(Json(state.admissions.get_stats().await?))
}

#[instrument(skip(state))]
pub async fn get_admission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdmissionRecord>, AppError> {
    Ok(Json(state.admissions.get_by_id(&id).await?))
}

/// Streams the whole admission list, newest first, on every change.
#[instrument(skip(state))]
pub async fn stream_admissions(
    State(state): State<AppState>,
) -> Result<Sse<KeepAliveStream<SubscriptionStream>>, AppError> {
    info!("Admission stream opened");
    subscription_stream(|tx| {
        Ok(state.admissions.subscribe_all(move |snapshot| {
            let event = match snapshot {
                Ok(records) => json_event("admissions", &records),
                Err(e) => repo_error_event(&e),
            };
            emit(&tx, event);
        }))
    })
}

/// Streams one admission; the payload is `null` while the record is absent.
#[instrument(skip(state))]
pub async fn stream_admission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<KeepAliveStream<SubscriptionStream>>, AppError> {
    subscription_stream(|tx| -> Result<_, AppError> {
        let handle = state.admissions.subscribe_one(&id, move |snapshot| {
            let event = match snapshot {
                Ok(record) => json_event("admission", &record),
                Err(e) => repo_error_event(&e),
            };
            emit(&tx, event);
        })?;
        info!(admission_id = %id, "Admission stream opened");
        Ok(handle)
    })
}

#[instrument(skip(state))]
pub async fn delete_admission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.admissions.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, dto))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateStatusDto>,
) -> Result<Json<AdmissionRecord>, AppError> {
    let status: AdmissionStatus = dto.status.parse()?;
    let updated = state
        .admissions
        .update_status(&id, status, dto.remarks.as_deref())
        .await?;
    Ok(Json(updated))
}

/// Stores a raw request body as a document of the admission.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<UploadDocumentParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredDocument>), AppError> {
    if body.is_empty() {
        return Err(AppError::bad_request(anyhow!("Document body is empty")));
    }
    if params.name.trim().is_empty() {
        return Err(AppError::bad_request(anyhow!("Document name is required")));
    }

    state.admissions.get_by_id(&id).await?;

    let document = file_storage::upload_document(
        state.files.as_ref(),
        &record_path(&id),
        &params.name,
        &body,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

#[instrument(skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteDocumentParams>,
) -> Result<StatusCode, AppError> {
    let prefix = format!("{}/", record_path(&id));
    if !state.files.key_from_url(&params.url).starts_with(&prefix) {
        return Err(AppError::bad_request(anyhow!(
            "Document does not belong to admission {id}"
        )));
    }

    file_storage::delete_document(state.files.as_ref(), &params.url).await?;
    Ok(StatusCode::NO_CONTENT)
}
