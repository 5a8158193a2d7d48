//! Roll number allocation.
//!
//! A roll number is `YY` + the two-digit class code + the next per-class
//! sequence number padded to three digits, e.g. `2502007` for the 7th LKG
//! admission of 2025. Generating a roll number only reads the counter; the
//! counter advances when the admission is saved.
//!
//! The sequence has three digits, so a class holds at most
//! [`MAX_PER_CLASS`] generated roll numbers. Past that, generation fails
//! and callers must supply a roll number themselves.

use std::sync::Arc;
use std::time::Duration;

use admitdesk_core::RepoError;
use admitdesk_core::clock::current_year;
use admitdesk_models::class_code;
use admitdesk_store::{RecordStore, bounded, path};
use tracing::instrument;

/// Root of the per-class counters.
pub const CLASS_COUNTS: &str = "classCounts";

pub fn counter_path(class_name: &str) -> String {
    path::join(CLASS_COUNTS, class_name)
}

/// Highest sequence number a roll number can carry.
pub const MAX_PER_CLASS: i64 = 999;

/// Pure roll-number formatting; `next` must be within `1..=MAX_PER_CLASS`.
pub fn format_roll_number(year: i32, class_name: &str, next: i64) -> Result<String, RepoError> {
    if !(1..=MAX_PER_CLASS).contains(&next) {
        return Err(RepoError::invalid(format!(
            "roll number sequence {next} for class {class_name} is outside 1..={MAX_PER_CLASS}"
        )));
    }

    Ok(format!(
        "{:02}{}{:03}",
        year.rem_euclid(100),
        class_code(class_name),
        next
    ))
}

#[derive(Clone)]
pub struct RollNumberAllocator {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl std::fmt::Debug for RollNumberAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollNumberAllocator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RollNumberAllocator {
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Admissions saved so far for `class_name`; 0 when none.
    #[instrument(skip(self))]
    pub async fn get_class_count(&self, class_name: &str) -> Result<i64, RepoError> {
        path::validate_segment(class_name).map_err(RepoError::from)?;
        let counter = counter_path(class_name);

        match bounded(self.timeout, self.store.get_once(&counter)).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(0),
        }
    }

    #[instrument(skip(self))]
    pub async fn generate_roll_number(&self, class_name: &str) -> Result<String, RepoError> {
        self.generate_roll_number_for_year(class_name, current_year())
            .await
    }

    pub async fn generate_roll_number_for_year(
        &self,
        class_name: &str,
        year: i32,
    ) -> Result<String, RepoError> {
        let next = self.get_class_count(class_name).await?.saturating_add(1);
        format_roll_number(year, class_name, next)
    }
}
