#[macro_use]
extern crate log;

pub mod discord;

use async_trait::async_trait;
use chapterwatch_lib::prelude::{Chapter, SeriesInfo};

#[async_trait]
pub trait Notifier {
    /// Deliver one message announcing `chapter` of the series known as
    /// `series_alias`.
    async fn send_chapter_notification(
        &self,
        series_alias: &str,
        chapter: &Chapter,
        series: Option<&SeriesInfo>,
    ) -> Result<(), anyhow::Error>;
}
