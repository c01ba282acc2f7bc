use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Exact identity of a cached definition list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub class_id: String,
    pub level: u32,
    pub subclass: Option<String>,
}

impl CacheKey {
    pub fn new(class_id: impl Into<String>, level: u32, subclass: Option<&str>) -> Self {
        Self {
            class_id: class_id.into(),
            level,
            subclass: subclass.map(str::to_string),
        }
    }

    pub fn subclass(&self) -> Option<&str> {
        self.subclass.as_deref()
    }
}

/// Renders as `{class_id}:{level}:{subclass}`, with an empty last segment
/// when there is no subclass.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.class_id,
            self.level,
            self.subclass.as_deref().unwrap_or_default()
        )
    }
}

/// Preload urgency. Drains run higher priorities first.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PreloadPriority {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreloadRequest {
    pub key: CacheKey,
    pub priority: PreloadPriority,
}
