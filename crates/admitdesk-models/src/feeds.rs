use std::fmt;
use std::str::FromStr;

use admitdesk_core::RepoError;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// The three append-ordered feeds shown on the notice board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedName {
    Notifications,
    NoticeNew,
    NoticeOld,
}

impl FeedName {
    pub fn all() -> [FeedName; 3] {
        [Self::Notifications, Self::NoticeNew, Self::NoticeOld]
    }

    /// Store path the feed lives under.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Notifications => "notifications",
            Self::NoticeNew => "notice/new",
            Self::NoticeOld => "notice/old",
        }
    }

    /// URL-safe name used in routes.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Notifications => "notifications",
            Self::NoticeNew => "notice-new",
            Self::NoticeOld => "notice-old",
        }
    }
}

impl fmt::Display for FeedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Accepts either the slug (`notice-new`) or the store path (`notice/new`).
impl FromStr for FeedName {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|feed| feed.slug() == s || feed.path() == s)
            .ok_or_else(|| RepoError::invalid(format!("unknown feed '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub text: String,
    /// Epoch milliseconds.
    #[serde(default)]
    pub time: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl FeedEntry {
    pub fn new(text: impl Into<String>, time: i64) -> Self {
        Self {
            text: text.into(),
            time,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PublishFeedEntryDto {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    /// Epoch milliseconds; defaults to the current time.
    #[validate(range(min = 0))]
    pub time: Option<i64>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50))]
    pub kind: Option<String>,
}
