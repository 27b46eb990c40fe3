use std::time::Duration;

use chapterwatch_lib::prelude::{ChapterList, SeriesWatermark};
use chapterwatch_notifier::Notifier;
use tokio::time::{self, Instant};

use crate::{
    domain::{
        repositories::source::ChapterSource,
        services::reconcile::{self, Reset},
    },
    infrastructure::{
        config::{Config, SeriesConfig},
        state::StateStore,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub series_checked: usize,
    pub fetch_failures: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

/// Checks every configured series once, one at a time, in config order.
pub struct UpdatesWorker<S, N>
where
    S: ChapterSource,
    N: Notifier,
{
    series: Vec<SeriesConfig>,
    source: S,
    notifier: N,
    state: StateStore,
    notify_delay: Duration,
    series_delay: Duration,
}

impl<S, N> UpdatesWorker<S, N>
where
    S: ChapterSource,
    N: Notifier,
{
    pub fn new(config: &Config, source: S, notifier: N, state: StateStore) -> Self {
        info!(
            "tracking {} series by chapter {}",
            config.series.len(),
            source.tracking_type()
        );

        Self {
            series: config.series.clone(),
            source,
            notifier,
            state,
            notify_delay: config.notify_delay(),
            series_delay: config.series_delay(),
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn into_state(self) -> StateStore {
        self.state
    }

    async fn fetch(&self, series: &SeriesConfig) -> Option<ChapterList> {
        match self.source.fetch_chapters(&series.url).await {
            Ok(list) if list.is_empty() => {
                warn!("no chapters found for {} ({})", series.alias, series.url);
                None
            }
            Ok(list) => Some(list),
            Err(e) => {
                error!(
                    "error fetch chapters for {} ({}), reason: {e}",
                    series.alias, series.url
                );
                None
            }
        }
    }

    async fn check_series(&mut self, series: &SeriesConfig, summary: &mut RunSummary) {
        info!("checking {} ({})...", series.alias, series.url);

        let Some(list) = self.fetch(series).await else {
            summary.fetch_failures += 1;
            return;
        };

        let stored = self.state.get(&series.url);
        let result = reconcile::reconcile(&list.chapters, list.tracking_type, stored);

        match result.reset {
            Some(Reset::TrackingTypeMismatch { stored, current }) => warn!(
                "tracking type mismatch for {}, stored: {stored}, current: {current}, resetting state",
                series.alias
            ),
            Some(Reset::LegacyIdWatermark {
                last_chapter_number,
            }) => warn!(
                "legacy state for {}: chapter id {last_chapter_number} stored under number tracking, resetting state",
                series.alias
            ),
            None => {}
        }

        if result.is_first_run {
            info!(
                "first run for {}, initializing state with last chapter {} (type: {})",
                series.alias, result.watermark.last_chapter_number, result.watermark.tracking_type
            );
        } else if result.to_notify.is_empty() {
            info!("no new chapters for {}", series.alias);
        } else {
            info!(
                "found {} new chapters for {}",
                result.to_notify.len(),
                series.alias
            );
        }

        for chapter in &result.to_notify {
            match self
                .notifier
                .send_chapter_notification(&series.alias, chapter, Some(&list.series))
                .await
            {
                Ok(_) => summary.notifications_sent += 1,
                Err(e) => {
                    error!(
                        "failed to send notification for {} - {}: {e}",
                        series.alias, chapter.title
                    );
                    summary.notifications_failed += 1;
                }
            }

            time::sleep(self.notify_delay).await;
        }

        if result.changed {
            self.apply(&series.url, result.watermark);
        }
    }

    fn apply(&mut self, url: &str, watermark: SeriesWatermark) {
        debug!(
            "{url}: watermark {} -> {}",
            self.state.get(url).last_chapter_number,
            watermark.last_chapter_number
        );
        self.state.set(url, watermark);
    }

    /// One full pass. State is written once at the end; failures of single
    /// series or notifications are logged and skipped.
    pub async fn run(&mut self) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        let series = self.series.clone();
        for series in &series {
            self.check_series(series, &mut summary).await;
            summary.series_checked += 1;

            time::sleep(self.series_delay).await;
        }

        if let Err(e) = self.state.save() {
            error!("failed to save state to {:?}: {e}", self.state.path());
        }

        info!(
            "checked {} series in {:?}, {} notifications sent, {} failed",
            summary.series_checked,
            Instant::now() - start,
            summary.notifications_sent,
            summary.notifications_failed
        );

        summary
    }
}
