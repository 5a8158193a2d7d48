//! Admission domain models and DTOs.
//!
//! An [`AdmissionRecord`] has a handful of typed fields the system itself
//! manages (identity, class, status, timestamps, remarks). Everything else the
//! application form collects (name, mobile, parents, address, roll number...)
//! rides along untouched in [`AdmissionRecord::extra`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use admitdesk_core::RepoError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Bucket used by statistics for records without a class.
pub const UNKNOWN_CLASS: &str = "unknown";

/// Value of the `status`/`class` query parameters meaning "no filter".
pub const ALL_FILTER: &str = "all";

/// Fields the system manages; never taken from pass-through applicant data.
pub const RESERVED_FIELDS: [&str; 8] = [
    "admissionId",
    "classApplied",
    "status",
    "createdAt",
    "updatedAt",
    "createdDate",
    "lastUpdateDate",
    "remarks",
];

/// Review state of an admission.
///
/// Only the three named states are ever written by this crate. Records that
/// other clients stored with a different value decode as [`Other`] so they
/// still show up in listings and totals.
///
/// [`Other`]: AdmissionStatus::Other
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum AdmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Other(String),
}

impl AdmissionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Other(raw) => raw,
        }
    }

    /// Fails for [`AdmissionStatus::Other`], which may be read but never written.
    pub fn ensure_known(&self) -> Result<(), RepoError> {
        match self {
            Self::Other(raw) => Err(unknown_status(raw)),
            _ => Ok(()),
        }
    }

    /// Maps any stored value, keeping unrecognised ones as [`AdmissionStatus::Other`].
    fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| Self::Other(raw.to_string()))
    }
}

fn unknown_status(raw: &str) -> RepoError {
    RepoError::invalid(format!(
        "unknown status '{raw}'; expected pending, approved or rejected"
    ))
}

impl fmt::Display for AdmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse for user input: only the three named states.
impl FromStr for AdmissionStatus {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(unknown_status(other)),
        }
    }
}

impl Serialize for AdmissionStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Lenient: a null is pending, a non-string is kept as its JSON text.
impl<'de> Deserialize<'de> for AdmissionStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Self::Pending,
            Value::String(raw) => Self::from_stored(&raw),
            other => Self::Other(other.to_string()),
        })
    }
}

/// An admission application as stored under `admissions/{admissionId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRecord {
    #[serde(default)]
    pub admission_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_applied: Option<String>,
    #[serde(default)]
    pub status: AdmissionStatus,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Applicant fields passed through unmodified.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AdmissionRecord {
    pub fn new(admission_id: impl Into<String>, class_applied: impl Into<String>) -> Self {
        Self {
            admission_id: admission_id.into(),
            class_applied: Some(class_applied.into()),
            status: AdmissionStatus::Pending,
            created_at: None,
            updated_at: None,
            created_date: None,
            last_update_date: None,
            remarks: None,
            extra: Map::new(),
        }
    }

    /// Adds a pass-through applicant field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Drops pass-through fields that would shadow a managed field.
    pub fn strip_reserved_fields(&mut self) {
        self.extra
            .retain(|name, _| !RESERVED_FIELDS.contains(&name.as_str()));
    }

    /// Sort key for "newest first" listings; missing timestamps count as 0.
    pub fn created_at_or_zero(&self) -> i64 {
        self.created_at.unwrap_or(0)
    }

    /// Class name, or [`UNKNOWN_CLASS`] when absent or blank.
    pub fn class_or_unknown(&self) -> &str {
        self.class_applied
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_CLASS)
    }
}

/// Equality filter for listing admissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionFilter {
    All,
    Status(AdmissionStatus),
    Class(String),
}

/// Query parameters of the admission listing (`?status=&class=`).
///
/// `status` wins when both are present; the value `all` disables a filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdmissionQuery {
    pub status: Option<String>,
    pub class: Option<String>,
}

impl AdmissionQuery {
    pub fn into_filter(self) -> Result<AdmissionFilter, RepoError> {
        let active = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.is_empty() && *s != ALL_FILTER)
                .map(str::to_string)
        };

        if let Some(status) = active(&self.status) {
            return Ok(AdmissionFilter::Status(status.parse()?));
        }
        if let Some(class) = active(&self.class) {
            return Ok(AdmissionFilter::Class(class));
        }
        Ok(AdmissionFilter::All)
    }
}

/// Aggregate counts over every admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub by_class: BTreeMap<String, usize>,
}

impl AdmissionStats {
    pub fn record(&mut self, admission: &AdmissionRecord) {
        self.total += 1;
        match admission.status {
            AdmissionStatus::Pending => self.pending += 1,
            AdmissionStatus::Approved => self.approved += 1,
            AdmissionStatus::Rejected => self.rejected += 1,
            AdmissionStatus::Other(_) => {}
        }
        *self
            .by_class
            .entry(admission.class_or_unknown().to_string())
            .or_insert(0) += 1;
    }
}

impl<'a> FromIterator<&'a AdmissionRecord> for AdmissionStats {
    fn from_iter<I: IntoIterator<Item = &'a AdmissionRecord>>(iter: I) -> Self {
        let mut stats = Self::default();
        for admission in iter {
            stats.record(admission);
        }
        stats
    }
}

/// Body of `POST /api/admissions`.
///
/// Identifiers the form leaves out (`admissionId`, `uniqueId`,
/// `registrationNo`, `rollNumber`) are generated server-side.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdmissionDto {
    #[validate(length(min = 1, max = 40))]
    pub admission_id: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub class_applied: String,
    pub status: Option<AdmissionStatus>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CreateAdmissionDto {
    pub fn into_record(self, admission_id: String) -> AdmissionRecord {
        let mut record = AdmissionRecord::new(admission_id, self.class_applied);
        record.status = self.status.unwrap_or_default();
        record.extra = self.fields;
        record.strip_reserved_fields();
        record
    }
}

/// Body of `PATCH /api/admissions/{id}/status`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStatusDto {
    #[validate(length(min = 1, max = 20))]
    pub status: String,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub term: String,
    pub field: Option<String>,
}

impl SearchParams {
    pub const DEFAULT_FIELD: &'static str = "name";

    pub fn field(&self) -> &str {
        self.field
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(Self::DEFAULT_FIELD)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentParams {
    pub limit: Option<i64>,
}

impl RecentParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10)
    }
}
