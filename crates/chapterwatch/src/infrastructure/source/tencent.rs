use std::time::Duration;

use async_trait::async_trait;
use chapterwatch_lib::prelude::{Chapter, ChapterList, SeriesInfo, TrackingType, UNKNOWN_NUMBER};
use fancy_regex::Regex;
use once_cell::sync::Lazy;
use reqwest::header::{self, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Selector};

use crate::domain::repositories::source::{ChapterSource, SourceError};

pub const BASE_URL: &str = "https://ac.qq.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

static SERIES_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"id/(\d+)").expect("valid regex"));
static CHAPTER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"cid/(\d+)").expect("valid regex"));
static CHAPTER_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:第)?(\d+(\.\d+)?)").expect("valid regex"));

static TITLE: Lazy<Selector> = Lazy::new(|| selector(".works-intro-title strong"));
static COVER: Lazy<Selector> = Lazy::new(|| selector(".works-cover img"));
static CHAPTER_ITEM: Lazy<Selector> =
    Lazy::new(|| selector(".chapter-page-all .works-chapter-item"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a"));
static PAY_ICON: Lazy<Selector> = Lazy::new(|| selector(".ui-icon-pay"));

fn selector(s: &str) -> Selector {
    Selector::parse(s).expect("valid selector")
}

/// Tencent Comics series page (`ac.qq.com/Comic/comicInfo/id/...`)
#[derive(Clone)]
pub struct Tencent {
    client: reqwest::Client,
    numbering: TrackingType,
}

impl Tencent {
    /// `numbering` chooses between the ordinal in the chapter title
    /// (`Number`) and the site chapter id (`Id`). `Unknown` is rejected when
    /// the config is loaded and is never passed here.
    pub fn new(numbering: TrackingType) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,zh-CN;q=0.8,zh;q=0.7"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, numbering })
    }
}

#[async_trait]
impl ChapterSource for Tencent {
    fn tracking_type(&self) -> TrackingType {
        self.numbering
    }

    async fn fetch_chapters(&self, url: &str) -> Result<ChapterList, SourceError> {
        debug!("fetching {url}");

        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();

        Ok(parse_series_page(&html, url, self.numbering, &today))
    }
}

/// Extract series info and chapters from a series page. The page carries no
/// release dates, every chapter gets `created_at`.
pub fn parse_series_page(
    html: &str,
    url: &str,
    numbering: TrackingType,
    created_at: &str,
) -> ChapterList {
    let document = Html::parse_document(html);

    let series = SeriesInfo {
        id: capture(&SERIES_ID, url).unwrap_or_else(|| "unknown".to_string()),
        title: document
            .select(&TITLE)
            .next()
            .map(|title| element_text(&title))
            .filter(|title| !title.is_empty()),
        cover_image_url: document
            .select(&COVER)
            .next()
            .and_then(|cover| cover.value().attr("src"))
            .map(str::to_string),
    };

    let chapters = document
        .select(&CHAPTER_ITEM)
        .filter_map(|item| parse_chapter(&item, numbering, created_at))
        .collect();

    ChapterList {
        chapters,
        series,
        tracking_type: numbering,
    }
}

fn parse_chapter(item: &ElementRef, numbering: TrackingType, created_at: &str) -> Option<Chapter> {
    let link = item.select(&LINK).next()?;
    let href = link.value().attr("href")?;

    let display_title = element_text(&link);
    let title = if display_title.is_empty() {
        link.value().attr("title").unwrap_or_default().trim().to_string()
    } else {
        display_title
    };

    let id = capture(&CHAPTER_ID, href).unwrap_or_else(|| "0".to_string());

    // digit runs too long for f64 parse to infinity
    let number = match numbering {
        TrackingType::Id => id
            .parse::<f64>()
            .ok()
            .filter(|id| id.is_finite() && *id > 0.0)
            .unwrap_or(UNKNOWN_NUMBER),
        _ => capture(&CHAPTER_NUMBER, &title)
            .and_then(|number| number.parse::<f64>().ok())
            .filter(|number| number.is_finite())
            .unwrap_or(UNKNOWN_NUMBER),
    };

    let url = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{BASE_URL}{href}")
    };

    Some(Chapter {
        id,
        title,
        url,
        created_at: created_at.to_string(),
        locked: item.select(&PAY_ICON).next().is_some(),
        number,
    })
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .ok()
        .flatten()
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

fn element_text(element: &ElementRef) -> String {
    element.text().map(str::trim).collect::<String>()
}
