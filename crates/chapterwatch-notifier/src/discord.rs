use std::time::Duration;

use async_trait::async_trait;
use chapterwatch_lib::prelude::{Chapter, SeriesInfo};
use reqwest::{StatusCode, header::HeaderMap};
use serde::Serialize;
use thiserror::Error;

use crate::Notifier;

/// Embed accent color, orange
pub const EMBED_COLOR: u32 = 16750848;

const DEFAULT_RETRY_AFTER_SECS: f64 = 1.0;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("still rate limited after retrying in {0:?}")]
    RateLimited(Duration),
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub thumbnail: EmbedImage,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

/// Discord webhook. A 429 response is retried once after the delay the
/// server asks for.
#[derive(Clone)]
pub struct Discord {
    client: reqwest::Client,
    webhook_url: String,
}

impl Discord {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    async fn post(&self, payload: &WebhookPayload) -> Result<reqwest::Response, DiscordError> {
        Ok(self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?)
    }

    async fn execute(&self, payload: &WebhookPayload) -> Result<(), DiscordError> {
        let mut response = self.post(payload).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let delay = retry_after(response.headers());
            warn!("rate limited, sleeping for {:.1}s", delay.as_secs_f64());
            tokio::time::sleep(delay).await;

            response = self.post(payload).await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                return Err(DiscordError::RateLimited(delay));
            }
        }

        response.error_for_status()?;

        Ok(())
    }
}

#[async_trait]
impl Notifier for Discord {
    async fn send_chapter_notification(
        &self,
        series_alias: &str,
        chapter: &Chapter,
        series: Option<&SeriesInfo>,
    ) -> Result<(), anyhow::Error> {
        let payload = build_payload(
            series_alias,
            chapter,
            series,
            chrono::Utc::now().to_rfc3339(),
        );

        self.execute(&payload).await?;
        info!("notification sent for {} - {}", series_alias, chapter.title);

        Ok(())
    }
}

pub fn build_payload(
    series_alias: &str,
    chapter: &Chapter,
    series: Option<&SeriesInfo>,
    timestamp: String,
) -> WebhookPayload {
    let (footer, thumbnail) = match series {
        Some(series) => (
            format!(
                "Series ID: {} | Chapter ID: {} | Date: {}",
                series.id,
                chapter.id,
                chapter.created_at.replace('-', ".")
            ),
            series.cover_image_url.clone().unwrap_or_default(),
        ),
        None => (
            format!("Chapter ID: {} | Date: {}", chapter.id, chapter.created_at),
            String::new(),
        ),
    };

    WebhookPayload {
        embeds: vec![Embed {
            title: format!("New Chapter of {series_alias}"),
            description: format!("**{}**", chapter.title),
            url: chapter.url.clone(),
            color: EMBED_COLOR,
            thumbnail: EmbedImage { url: thumbnail },
            footer: EmbedFooter { text: footer },
            timestamp,
        }],
    }
}

/// Delay requested by a rate limited response, in (possibly fractional)
/// seconds. Falls back to one second when absent or malformed.
pub fn retry_after(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod test {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use reqwest::header::{HeaderValue, RETRY_AFTER};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    use super::*;

    const RATE_LIMITED: &str = concat!(
        "HTTP/1.1 429 Too Many Requests\r\n",
        "retry-after: 0.05\r\n",
        "content-length: 0\r\n",
        "connection: close\r\n\r\n",
    );
    const NO_CONTENT: &str = "HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n";

    /// Webhook stub answering each request with the next status in
    /// `responses`. Returns the webhook url and the request count.
    async fn serve(responses: Vec<&'static str>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        tokio::spawn(async move {
            for response in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
        });

        (format!("http://{addr}/api/webhooks/1/token"), hits)
    }

    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn payload() -> WebhookPayload {
        build_payload("Alias", &chapter(), None, "now".to_string())
    }

    fn chapter() -> Chapter {
        Chapter {
            id: "12".to_string(),
            title: "第12话 重逢".to_string(),
            url: "https://ac.qq.com/ComicView/index/id/657037/cid/12".to_string(),
            created_at: "2024-03-09".to_string(),
            locked: false,
            number: 12.0,
        }
    }

    #[test]
    fn test_build_payload_with_series() {
        let series = SeriesInfo {
            id: "657037".to_string(),
            title: Some("一人之下".to_string()),
            cover_image_url: Some("https://manhua.acimg.cn/vertical/cover.jpg".to_string()),
        };

        let payload = build_payload(
            "Under One Person",
            &chapter(),
            Some(&series),
            "2024-03-09T00:00:00+00:00".to_string(),
        );

        let embed = &payload.embeds[0];
        assert_eq!(embed.title, "New Chapter of Under One Person");
        assert_eq!(embed.description, "**第12话 重逢**");
        assert_eq!(embed.color, EMBED_COLOR);
        assert_eq!(
            embed.thumbnail.url,
            "https://manhua.acimg.cn/vertical/cover.jpg"
        );
        assert_eq!(
            embed.footer.text,
            "Series ID: 657037 | Chapter ID: 12 | Date: 2024.03.09"
        );
    }

    #[test]
    fn test_build_payload_without_series() {
        let payload = build_payload("Alias", &chapter(), None, "now".to_string());

        let embed = &payload.embeds[0];
        assert_eq!(embed.thumbnail.url, "");
        assert_eq!(embed.footer.text, "Chapter ID: 12 | Date: 2024-03-09");
    }

    #[test]
    fn test_build_payload_series_without_cover() {
        let series = SeriesInfo {
            id: "unknown".to_string(),
            ..Default::default()
        };

        let payload = build_payload("Alias", &chapter(), Some(&series), "now".to_string());

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["embeds"][0]["thumbnail"]["url"], "");
        assert_eq!(
            value["embeds"][0]["footer"]["text"],
            "Series ID: unknown | Chapter ID: 12 | Date: 2024.03.09"
        );
        assert_eq!(value["embeds"][0]["timestamp"], "now");
    }

    #[test]
    fn test_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("2.5"));
        assert_eq!(retry_after(&headers), Duration::from_millis(2500));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("-3"));
        assert_eq!(retry_after(&headers), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rate_limited_then_accepted() {
        let (url, hits) = serve(vec![RATE_LIMITED, NO_CONTENT, NO_CONTENT]).await;
        let discord = Discord::new(url);

        discord.execute(&payload()).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_twice_gives_up() {
        let (url, hits) = serve(vec![RATE_LIMITED, RATE_LIMITED, NO_CONTENT]).await;
        let discord = Discord::new(url);

        let result = discord.execute(&payload()).await;

        assert!(matches!(result, Err(DiscordError::RateLimited(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_send_to_unreachable_webhook() {
        let discord = Discord::new("http://127.0.0.1:1/api/webhooks/1/token".to_string());

        let result = discord
            .send_chapter_notification("Alias", &chapter(), None)
            .await;

        assert!(result.is_err());
    }
}
