use admitdesk_core::AppError;
use admitdesk_models::ClassName;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ClassCountResponse {
    pub class: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollNumberResponse {
    pub class: String,
    pub roll_number: String,
}

/// The class table with roll-number codes.
#[instrument]
pub async fn list_classes() -> Json<Vec<ClassInfo>> {
    Json(
        ClassName::all()
            .map(|class| ClassInfo {
                name: class.to_string(),
                code: format!("{:02}", class.code()),
            })
            .collect(),
    )
}

#[instrument(skip(state))]
pub async fn get_class_count(
    State(state): State<AppState>,
    Path(class): Path<String>,
) -> Result<Json<ClassCountResponse>, AppError> {
    let count = state.roll_numbers.get_class_count(&class).await?;
    Ok(Json(ClassCountResponse { class, count }))
}

/// Previews the roll number the next admission to `class` would get.
#[instrument(skip(state))]
pub async fn get_next_roll_number(
    State(state): State<AppState>,
    Path(class): Path<String>,
) -> Result<Json<RollNumberResponse>, AppError> {
    let roll_number = state.roll_numbers.generate_roll_number(&class).await?;
    Ok(Json(RollNumberResponse { class, roll_number }))
}
