//! # admitdesk Core
//!
//! Core types, errors, and utilities shared by the admitdesk crates.
//!
//! - [`errors`]: repository error taxonomy and the HTTP-facing [`AppError`]
//! - [`pagination`]: validated page requests and paginated results
//! - [`ids`]: admission ID, unique ID and registration number generators
//! - [`clock`]: epoch-millisecond timestamps and ISO-8601 rendering
//! - [`file_storage`]: blob storage abstraction for admission documents
//!
//! # Example
//!
//! ```ignore
//! use admitdesk_core::ids::{generate_admission_id, generate_unique_id, generate_registration_no};
//!
//! let admission_id = generate_admission_id();        // "ADM254821"
//! let unique_id = generate_unique_id();              // "MMPSM0004829104432"
//! let reg_no = generate_registration_no(&unique_id)?; // "R-2025-4432-517"
//! ```

pub mod clock;
pub mod errors;
pub mod file_storage;
pub mod ids;
pub mod pagination;

// Re-export commonly used types at crate root
pub use errors::{AppError, RepoError};
pub use pagination::{Page, PageRequest, PaginationParams};
