//! # admitdesk Models
//!
//! Domain models and DTOs shared by the admitdesk crates.
//!
//! - [`admissions`]: admission records, status, filters, statistics and request DTOs
//! - [`classes`]: the fixed class table and its roll-number codes
//! - [`feeds`]: notice and notification feed entries
//!
//! Field names serialize in camelCase, matching the stored layout.

pub mod admissions;
pub mod classes;
pub mod feeds;

pub use admissions::{
    AdmissionFilter, AdmissionQuery, AdmissionRecord, AdmissionStats, AdmissionStatus,
    CreateAdmissionDto, RecentParams, SearchParams, UpdateStatusDto,
};
pub use classes::{ClassName, class_code};
pub use feeds::{FeedEntry, FeedName, PublishFeedEntryDto};
