use serde::{Deserialize, Serialize};

use crate::models::{TrackingType, UNKNOWN_NUMBER};

/// Persisted progress of a single series
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SeriesWatermark {
    /// Highest chapter number confirmed seen, `UNKNOWN_NUMBER` if the series
    /// was never initialized
    #[serde(default = "default_last_chapter_number")]
    pub last_chapter_number: f64,
    #[serde(default = "default_tracking_type")]
    pub tracking_type: TrackingType,
}

fn default_last_chapter_number() -> f64 {
    UNKNOWN_NUMBER
}

fn default_tracking_type() -> TrackingType {
    TrackingType::Unknown
}

impl Default for SeriesWatermark {
    fn default() -> Self {
        Self {
            last_chapter_number: default_last_chapter_number(),
            tracking_type: default_tracking_type(),
        }
    }
}

impl SeriesWatermark {
    pub fn new(last_chapter_number: f64, tracking_type: TrackingType) -> Self {
        Self {
            last_chapter_number,
            tracking_type,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.last_chapter_number != UNKNOWN_NUMBER
    }
}
