pub mod admissions;
pub mod classes;
pub mod feeds;
pub mod ids;

pub use self::admissions::{AdmissionRepository, RollNumberAllocator};
pub use self::feeds::FeedService;
