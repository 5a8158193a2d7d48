//! Admission models.
//!
//! Re-exports the shared admission models and adds the request types that
//! only the HTTP handlers use.

use serde::Deserialize;

pub use admitdesk_models::admissions::*;

/// Form fields generated server-side when the client leaves them out.
pub const UNIQUE_ID_FIELD: &str = "uniqueId";
pub const REGISTRATION_NO_FIELD: &str = "registrationNo";
pub const ROLL_NUMBER_FIELD: &str = "rollNumber";

/// `?name=` of a document upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadDocumentParams {
    pub name: String,
}

/// `?url=` of a document removal; a storage key works too.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteDocumentParams {
    pub url: String,
}
