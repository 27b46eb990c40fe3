use chapterwatch_lib::prelude::{Chapter, SeriesWatermark, TrackingType, UNKNOWN_NUMBER};

/// Stored numbers above this cannot come from ordinal numbering, they are
/// leftovers of id based tracking written before tracking types were stored.
pub const LEGACY_ID_THRESHOLD: f64 = 50000.0;

/// Why a stored watermark was discarded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reset {
    TrackingTypeMismatch {
        stored: TrackingType,
        current: TrackingType,
    },
    LegacyIdWatermark {
        last_chapter_number: f64,
    },
}

/// Decision record for one series
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Chapters to announce, ascending by number
    pub to_notify: Vec<Chapter>,
    pub watermark: SeriesWatermark,
    /// Whether `watermark` should be written back
    pub changed: bool,
    pub is_first_run: bool,
    pub reset: Option<Reset>,
}

impl Reconciliation {
    fn unchanged(stored: SeriesWatermark) -> Self {
        Self {
            to_notify: vec![],
            watermark: stored,
            changed: false,
            is_first_run: false,
            reset: None,
        }
    }
}

/// Compare a fresh chapter listing against the stored watermark.
///
/// An empty listing is a failed scrape, not a series without chapters, and
/// leaves everything untouched. A series without a comparable watermark is
/// seeded with its latest chapter only. Otherwise every chapter above the
/// watermark is new, and the watermark never moves backwards.
pub fn reconcile(
    chapters: &[Chapter],
    tracking_type: TrackingType,
    stored: SeriesWatermark,
) -> Reconciliation {
    if chapters.is_empty() {
        return Reconciliation::unchanged(stored);
    }

    let reset = detect_reset(tracking_type, &stored);

    let mut reconciliation = match reset {
        None if stored.is_initialized() => incremental(chapters, tracking_type, stored),
        _ => first_run(chapters, tracking_type, stored),
    };
    reconciliation.reset = reset;

    reconciliation
}

fn detect_reset(tracking_type: TrackingType, stored: &SeriesWatermark) -> Option<Reset> {
    if stored.tracking_type.is_known() && stored.tracking_type != tracking_type {
        return Some(Reset::TrackingTypeMismatch {
            stored: stored.tracking_type,
            current: tracking_type,
        });
    }

    if !stored.tracking_type.is_known()
        && stored.last_chapter_number > LEGACY_ID_THRESHOLD
        && tracking_type == TrackingType::Number
    {
        return Some(Reset::LegacyIdWatermark {
            last_chapter_number: stored.last_chapter_number,
        });
    }

    None
}

fn first_run(
    chapters: &[Chapter],
    tracking_type: TrackingType,
    stored: SeriesWatermark,
) -> Reconciliation {
    let current_max = chapters
        .iter()
        .map(|chapter| chapter.number)
        .fold(UNKNOWN_NUMBER, f64::max);

    // ties resolve to the first chapter in source order
    let to_notify = chapters
        .iter()
        .filter(|chapter| chapter.has_number())
        .find(|chapter| chapter.number == current_max)
        .cloned()
        .into_iter()
        .collect();

    let watermark = SeriesWatermark::new(current_max, tracking_type);

    Reconciliation {
        to_notify,
        watermark,
        changed: watermark != stored,
        is_first_run: true,
        reset: None,
    }
}

fn incremental(
    chapters: &[Chapter],
    tracking_type: TrackingType,
    stored: SeriesWatermark,
) -> Reconciliation {
    let last_number = stored.last_chapter_number;

    let mut to_notify: Vec<Chapter> = chapters
        .iter()
        .filter(|chapter| chapter.number > last_number)
        .cloned()
        .collect();
    to_notify.sort_by(|a, b| a.number.total_cmp(&b.number));

    let max_number = chapters
        .iter()
        .map(|chapter| chapter.number)
        .fold(last_number, f64::max);

    if max_number > last_number {
        Reconciliation {
            to_notify,
            watermark: SeriesWatermark::new(max_number, tracking_type),
            changed: true,
            is_first_run: false,
            reset: None,
        }
    } else {
        Reconciliation {
            to_notify,
            ..Reconciliation::unchanged(stored)
        }
    }
}
