use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Numbering scheme a chapter number was derived from.
///
/// Watermarks produced under different schemes are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingType {
    /// Sequential ordinal parsed from the chapter title
    #[default]
    Number,
    /// Site-internal chapter id
    Id,
    /// Written before tracking types were recorded
    #[serde(other)]
    Unknown,
}

impl TrackingType {
    pub fn is_known(&self) -> bool {
        !matches!(self, TrackingType::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingType::Number => "number",
            TrackingType::Id => "id",
            TrackingType::Unknown => "unknown",
        }
    }
}

impl Display for TrackingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
