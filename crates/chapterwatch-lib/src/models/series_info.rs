use serde::{Deserialize, Serialize};

/// Descriptive data about a series, only used to decorate notifications
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct SeriesInfo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}
