use serde::{Deserialize, Serialize};

use crate::models::{SeriesInfo, TrackingType};

/// Sentinel for a chapter whose number could not be derived.
///
/// A watermark holding this value has never been initialized, and a chapter
/// carrying it never counts as new.
pub const UNKNOWN_NUMBER: f64 = -1.0;

/// A type represent chapter, as scraped from a series page
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Date string, `%Y-%m-%d`
    pub created_at: String,
    pub locked: bool,
    pub number: f64,
}

impl Chapter {
    pub fn has_number(&self) -> bool {
        self.number != UNKNOWN_NUMBER
    }
}

/// Everything a source returns for one series page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChapterList {
    pub chapters: Vec<Chapter>,
    pub series: SeriesInfo,
    /// How `Chapter::number` was derived, must stay the same across runs for
    /// the same source strategy
    pub tracking_type: TrackingType,
}

impl ChapterList {
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
