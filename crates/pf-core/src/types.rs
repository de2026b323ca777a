//! Common types used throughout Portfolio RS

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entry identifier (achievements and reflections share one id space)
pub type EntryId = String;

/// Generate a fresh entry id: millisecond timestamp plus a short random suffix
pub fn generate_entry_id() -> EntryId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", Utc::now().timestamp_millis(), &suffix[..5])
}

/// The two entry collections rendered on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Achievements,
    Reflections,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Achievements => "achievements",
            Self::Reflections => "reflections",
        }
    }

    /// Singular name, used in generated filenames
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Achievements => "achievement",
            Self::Reflections => "reflection",
        }
    }

    /// Parse a collection name, singular or plural
    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "achievements" | "achievement" => Some(Self::Achievements),
            "reflections" | "reflection" => Some(Self::Reflections),
            _ => None,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
