//! Admission repository.
//!
//! Records live at `admissions/{admissionId}`. Every store call is bounded by
//! the configured timeout, and every outcome is a typed [`RepoError`] result:
//! an empty list always means "no matching records", never "the store failed".

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use admitdesk_core::clock::{iso_from_millis, now_millis};
use admitdesk_core::pagination::paginate;
use admitdesk_core::{Page, PageRequest, RepoError};
use admitdesk_models::{
    AdmissionFilter, AdmissionRecord, AdmissionStats, AdmissionStatus, ClassName,
};
use admitdesk_observability::Telemetry;
use admitdesk_store::{
    Child, RecordStore, StoreError, SubscriptionHandle, bounded, path, watch_children, watch_node,
};
use serde_json::{Map, Value, json};
use tracing::{error, info, instrument, warn};

use super::roll_number::counter_path;

/// Root of all admission records.
pub const ADMISSIONS: &str = "admissions";

pub const EVENT_SUBMITTED: &str = "admission_submitted";
pub const EVENT_STATUS_UPDATED: &str = "admission_status_updated";

#[derive(Clone)]
pub struct AdmissionRepository {
    store: Arc<dyn RecordStore>,
    telemetry: Arc<dyn Telemetry>,
    timeout: Duration,
}

impl std::fmt::Debug for AdmissionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionRepository")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AdmissionRepository {
    pub fn new(
        store: Arc<dyn RecordStore>,
        telemetry: Arc<dyn Telemetry>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            telemetry,
            timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Writes a new admission and advances its class counter.
    ///
    /// Stamps `createdAt`, `updatedAt` and `createdDate`. The record write and
    /// the counter increment are separate store operations: when the increment
    /// fails the record is already stored and the error is still returned.
    #[instrument(skip(self, record), fields(admission.id = %record.admission_id))]
    pub async fn save(&self, mut record: AdmissionRecord) -> Result<AdmissionRecord, RepoError> {
        let id = record.admission_id.clone();
        let class_name = validate_new_record(&record)?;
        record.strip_reserved_fields();

        let now = now_millis();
        record.created_at = Some(now);
        record.updated_at = Some(now);
        record.created_date = Some(iso_from_millis(now));

        let value = serde_json::to_value(&record)?;
        self.call(self.store.put(&record_path(&id), value)).await?;

        let counter = counter_path(&class_name);
        if let Err(e) = self.call(self.store.increment(&counter, 1)).await {
            error!(admission.id = %id, class = %class_name, error = %e, "Admission saved but class counter not advanced");
            return Err(e);
        }

        info!(admission.id = %id, class = %class_name, "Admission saved");
        self.telemetry.log_event(
            EVENT_SUBMITTED,
            json!({ "class": class_name, "admissionId": id }),
        );

        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<AdmissionRecord, RepoError> {
        validate_id(id)?;
        match self.call(self.store.get_once(&record_path(id))).await? {
            Some(value) => decode(id, value),
            None => Err(RepoError::not_found(format!("Admission {id}"))),
        }
    }

    /// All admissions matching `filter`, newest first.
    #[instrument(skip(self))]
    pub async fn get_all(&self, filter: &AdmissionFilter) -> Result<Vec<AdmissionRecord>, RepoError> {
        let children = match filter {
            AdmissionFilter::All => self.call(self.store.children(ADMISSIONS)).await?,
            AdmissionFilter::Status(status) => self.query_status(status).await?,
            AdmissionFilter::Class(class_name) => self.query_class(class_name).await?,
        };

        let mut records = decode_children(children);
        sort_newest_first(&mut records);
        Ok(strip_keys(records))
    }

    /// One page of admissions, newest first.
    #[instrument(skip(self))]
    pub async fn get_paginated(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Page<AdmissionRecord>, RepoError> {
        let request = PageRequest::new(page, limit)?;
        let records = self.get_all(&AdmissionFilter::All).await?;
        Ok(paginate(records, request))
    }

    /// Sets the status, stamps `updatedAt`/`lastUpdateDate`, and records
    /// `remarks` when non-empty. Returns the updated record.
    #[instrument(skip(self, remarks))]
    pub async fn update_status(
        &self,
        id: &str,
        status: AdmissionStatus,
        remarks: Option<&str>,
    ) -> Result<AdmissionRecord, RepoError> {
        status.ensure_known()?;
        let mut record = self.get_by_id(id).await?;

        let now = now_millis().max(record.updated_at.unwrap_or(i64::MIN));
        let last_update_date = iso_from_millis(now);

        let mut partial = Map::new();
        partial.insert("status".into(), json!(status));
        partial.insert("updatedAt".into(), json!(now));
        partial.insert("lastUpdateDate".into(), json!(last_update_date));

        let remarks = remarks.filter(|r| !r.is_empty());
        if let Some(remarks) = remarks {
            partial.insert("remarks".into(), json!(remarks));
        }

        // the record may have been deleted since it was read
        if !self.call(self.store.patch(&record_path(id), partial)).await? {
            return Err(RepoError::not_found(format!("Admission {id}")));
        }

        record.status = status;
        record.updated_at = Some(now);
        record.last_update_date = Some(last_update_date);
        if let Some(remarks) = remarks {
            record.remarks = Some(remarks.to_string());
        }

        info!(admission.id = %id, status = %record.status, "Admission status updated");
        self.telemetry.log_event(
            EVENT_STATUS_UPDATED,
            json!({ "admissionId": id, "newStatus": record.status }),
        );

        Ok(record)
    }

    /// Removes an admission. Deleting an absent admission succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), RepoError> {
        validate_id(id)?;
        self.call(self.store.delete(&record_path(id))).await?;
        info!(admission.id = %id, "Admission deleted");
        Ok(())
    }

    /// Case-insensitive substring match on one field, in key order.
    ///
    /// Missing or null fields compare as the empty string; numbers and
    /// booleans are compared by their JSON text.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str, field: &str) -> Result<Vec<AdmissionRecord>, RepoError> {
        let needle = term.to_lowercase();
        let children = self.call(self.store.children(ADMISSIONS)).await?;

        let matches = children
            .into_iter()
            .filter(|child| {
                field_text(child.value.get(field))
                    .to_lowercase()
                    .contains(&needle)
            })
            .collect();

        Ok(strip_keys(decode_children(matches)))
    }

    /// Admissions for one class, in key order.
    #[instrument(skip(self))]
    pub async fn get_by_class(&self, class_name: &str) -> Result<Vec<AdmissionRecord>, RepoError> {
        let children = self.query_class(class_name).await?;
        Ok(strip_keys(decode_children(children)))
    }

    /// Admissions with one status, in key order.
    #[instrument(skip(self))]
    pub async fn get_by_status(
        &self,
        status: AdmissionStatus,
    ) -> Result<Vec<AdmissionRecord>, RepoError> {
        let children = self.query_status(&status).await?;
        Ok(strip_keys(decode_children(children)))
    }

    /// The `limit` most recently created admissions, newest first.
    ///
    /// When several records share the cut-off `createdAt`, those with the
    /// greatest keys make the cut.
    #[instrument(skip(self))]
    pub async fn get_recent(&self, limit: i64) -> Result<Vec<AdmissionRecord>, RepoError> {
        if limit < 1 {
            return Err(RepoError::invalid(format!("limit must be >= 1, got {limit}")));
        }
        let n = usize::try_from(limit)
            .map_err(|_| RepoError::invalid(format!("limit {limit} is out of range")))?;

        let children = self
            .call(
                self.store
                    .query_ordered_limit_last(ADMISSIONS, "createdAt", n),
            )
            .await?;

        let mut records = decode_children(children);
        sort_newest_first(&mut records);
        Ok(strip_keys(records))
    }

    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<AdmissionStats, RepoError> {
        let children = self.call(self.store.children(ADMISSIONS)).await?;
        let records = strip_keys(decode_children(children));
        Ok(records.iter().collect())
    }

    /// Delivers every admission, newest first, now and after each change.
    pub fn subscribe_all<F>(&self, mut on_change: F) -> SubscriptionHandle
    where
        F: FnMut(Result<Vec<AdmissionRecord>, RepoError>) + Send + 'static,
    {
        watch_children(self.store.clone(), ADMISSIONS, move |snapshot| {
            on_change(snapshot.map_err(RepoError::from).map(|children| {
                let mut records = decode_children(children);
                sort_newest_first(&mut records);
                strip_keys(records)
            }))
        })
    }

    /// Delivers one admission (`None` while absent) now and after each change.
    pub fn subscribe_one<F>(&self, id: &str, mut on_change: F) -> Result<SubscriptionHandle, RepoError>
    where
        F: FnMut(Result<Option<AdmissionRecord>, RepoError>) + Send + 'static,
    {
        validate_id(id)?;
        let key = id.to_string();

        Ok(watch_node(self.store.clone(), record_path(id), move |snapshot| {
            let result = snapshot
                .map_err(RepoError::from)
                .and_then(|value| value.map(|v| decode(&key, v)).transpose());
            on_change(result)
        }))
    }

    async fn query_status(&self, status: &AdmissionStatus) -> Result<Vec<Child>, RepoError> {
        let value = json!(status);
        self.call(self.store.query_equal(ADMISSIONS, "status", &value))
            .await
    }

    async fn query_class(&self, class_name: &str) -> Result<Vec<Child>, RepoError> {
        let value = Value::String(class_name.to_string());
        self.call(self.store.query_equal(ADMISSIONS, "classApplied", &value))
            .await
    }

    async fn call<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, StoreError>>,
    ) -> Result<T, RepoError> {
        bounded(self.timeout, fut).await
    }
}

pub fn record_path(id: &str) -> String {
    path::join(ADMISSIONS, id)
}

fn validate_id(id: &str) -> Result<(), RepoError> {
    if id.is_empty() {
        return Err(RepoError::invalid("admissionId must not be empty"));
    }
    path::validate_segment(id).map_err(RepoError::from)
}

/// Checks the id and class of a record about to be saved and returns the
/// canonical class name.
fn validate_new_record(record: &AdmissionRecord) -> Result<String, RepoError> {
    validate_id(&record.admission_id)?;
    record.status.ensure_known()?;
    let class_name = record
        .class_applied
        .as_deref()
        .ok_or_else(|| RepoError::invalid("classApplied is required"))?
        .parse::<ClassName>()?;
    Ok(class_name.to_string())
}

fn decode(key: &str, value: Value) -> Result<AdmissionRecord, RepoError> {
    let mut record: AdmissionRecord = serde_json::from_value(value)?;
    if record.admission_id.is_empty() {
        record.admission_id = key.to_string();
    }
    Ok(record)
}

/// Decodes children into `(key, record)` pairs, skipping malformed nodes.
fn decode_children(children: Vec<Child>) -> Vec<(String, AdmissionRecord)> {
    children
        .into_iter()
        .filter_map(|Child { key, value }| match decode(&key, value) {
            Ok(record) => Some((key, record)),
            Err(e) => {
                warn!(admission.key = %key, error = %e, "Skipping malformed admission");
                None
            }
        })
        .collect()
}

/// `createdAt` descending (missing counts as 0), then key ascending.
fn sort_newest_first(records: &mut [(String, AdmissionRecord)]) {
    records.sort_by(|(ka, a), (kb, b)| {
        match b.created_at_or_zero().cmp(&a.created_at_or_zero()) {
            Ordering::Equal => ka.cmp(kb),
            other => other,
        }
    });
}

fn strip_keys(records: Vec<(String, AdmissionRecord)>) -> Vec<AdmissionRecord> {
    records.into_iter().map(|(_, record)| record).collect()
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
