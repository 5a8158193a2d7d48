//! The fixed class table.
//!
//! Each class carries a two-digit code used in roll numbers:
//! Nursery=01, LKG=02, UKG=03, then classes 1 to 12 map to 04 to 15.
//! Names are matched exactly; anything else is not a class.

use std::fmt;
use std::str::FromStr;

use admitdesk_core::RepoError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassName {
    Nursery,
    Lkg,
    Ukg,
    /// Classes 1 to 12.
    Grade(u8),
}

impl ClassName {
    /// Every class in admission order.
    pub fn all() -> impl Iterator<Item = ClassName> {
        [ClassName::Nursery, ClassName::Lkg, ClassName::Ukg]
            .into_iter()
            .chain((1..=12).map(ClassName::Grade))
    }

    /// Roll-number code, 1 to 15.
    pub fn code(&self) -> u8 {
        match self {
            ClassName::Nursery => 1,
            ClassName::Lkg => 2,
            ClassName::Ukg => 3,
            ClassName::Grade(n) => n + 3,
        }
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassName::Nursery => f.write_str("Nursery"),
            ClassName::Lkg => f.write_str("LKG"),
            ClassName::Ukg => f.write_str("UKG"),
            ClassName::Grade(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for ClassName {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Nursery" => Ok(ClassName::Nursery),
            "LKG" => Ok(ClassName::Lkg),
            "UKG" => Ok(ClassName::Ukg),
            other => other
                .parse::<u8>()
                .ok()
                // reject "01", "+1" and friends so names stay canonical
                .filter(|n| (1..=12).contains(n) && n.to_string() == other)
                .map(ClassName::Grade)
                .ok_or_else(|| {
                    RepoError::invalid(format!(
                        "unknown class '{other}'; expected Nursery, LKG, UKG or 1-12"
                    ))
                }),
        }
    }
}

impl Serialize for ClassName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClassName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Two-digit roll-number code for a class name; `"00"` for unknown classes.
pub fn class_code(class_name: &str) -> String {
    let code = class_name.parse::<ClassName>().map(|c| c.code()).unwrap_or(0);
    format!("{code:02}")
}
