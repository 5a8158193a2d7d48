use serde::Serialize;

pub use admitdesk_models::feeds::*;

/// A feed entry together with its store-assigned key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedFeedEntry {
    pub key: String,
    #[serde(flatten)]
    pub entry: FeedEntry,
}
