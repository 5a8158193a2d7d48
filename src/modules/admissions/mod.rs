pub mod controller;
pub mod model;
pub mod roll_number;
pub mod router;
pub mod service;

pub use model::*;
pub use roll_number::{MAX_PER_CLASS, RollNumberAllocator, format_roll_number};
pub use router::init_admissions_router;
pub use service::AdmissionRepository;
