use async_trait::async_trait;
use chapterwatch_lib::prelude::{ChapterList, TrackingType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait ChapterSource: Send + Sync {
    /// Tag attached to every listing this source returns
    fn tracking_type(&self) -> TrackingType;

    /// Scrape the chapter listing of the series page at `url`. Page sections
    /// that are missing yield empty fields rather than an error.
    async fn fetch_chapters(&self, url: &str) -> Result<ChapterList, SourceError>;
}
