pub mod badge;
pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use badge::{Badge, BadgeUpdate, time_ago};
pub use model::*;
pub use router::init_feeds_router;
pub use service::FeedService;
