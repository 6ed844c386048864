//! YouTube Data API v3 and YouTube Analytics API v2 client
//!
//! Reads an already-issued OAuth bearer token; consent and refresh happen
//! outside this tool.

use contentos_common::context::credentials_dir;
use contentos_common::ChannelContext;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DATA_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const ANALYTICS_API_BASE_URL: &str = "https://youtubeanalytics.googleapis.com/v2";

/// Environment variable holding a bearer token, checked before token files
pub const TOKEN_ENV_VAR: &str = "CONTENTOS_YOUTUBE_TOKEN";

const USER_AGENT: &str = concat!("contentos/", env!("CARGO_PKG_VERSION"));
/// Page size limit of `playlistItems.list`
const MAX_PAGE_SIZE: usize = 50;
/// Characters of a title kept for ledgers and matching
pub const TITLE_CHARS: usize = 40;

const ANALYTICS_METRICS: &str =
    "views,estimatedMinutesWatched,averageViewDuration,averageViewPercentage,subscribersGained,likes,comments";

/// YouTube client errors
#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Access token rejected (expired or missing scopes)")]
    Unauthorized,

    #[error("No YouTube access token. Set CONTENTOS_YOUTUBE_TOKEN or place token.json in {0}")]
    MissingToken(String),
}

/// Where a token was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    File(PathBuf),
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    access_token: Option<String>,
    token: Option<String>,
}

fn token_from_file(path: &std::path::Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let file: TokenFile = serde_json::from_str(&text).ok()?;
    file.access_token
        .or(file.token)
        .filter(|t| !t.trim().is_empty())
}

/// Workspace-wide token: env var, then `.contentos/credentials/token.json`
pub fn shared_token(root: &std::path::Path) -> Option<(String, TokenSource)> {
    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        if !token.trim().is_empty() {
            return Some((token, TokenSource::Environment));
        }
    }
    let path = credentials_dir(root).join("token.json");
    token_from_file(&path).map(|t| (t, TokenSource::File(path)))
}

/// Token lookup: env var, then the shared credentials file, then the channel's own
pub fn find_token(ctx: &ChannelContext) -> Option<(String, TokenSource)> {
    shared_token(&ctx.root).or_else(|| {
        let path = ctx.channel_token_path();
        token_from_file(&path).map(|t| (t, TokenSource::File(path)))
    })
}

/// One upload with its public statistics
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStats {
    pub id: String,
    pub title: String,
    pub views: i64,
    pub likes: i64,
    /// RFC 3339
    pub published_at: String,
}

impl VideoStats {
    /// Title cut to [`TITLE_CHARS`] characters
    pub fn short_title(&self) -> String {
        self.title.chars().take(TITLE_CHARS).collect()
    }

    /// `YYYY-MM-DD` part of the publish time
    pub fn published_date(&self) -> &str {
        self.published_at.get(..10).unwrap_or(&self.published_at)
    }
}

/// 28-day style analytics for one video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoAnalytics {
    pub views: i64,
    pub watch_minutes: f64,
    /// Seconds
    pub avg_view_duration: f64,
    pub avg_view_percentage: f64,
    pub subscribers_gained: i64,
    pub likes: i64,
    pub comments: i64,
}

// Response shapes, only the fields read

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistSnippet {
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    published_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

fn count(value: Option<&str>) -> i64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn number(row: &[serde_json::Value], index: usize) -> f64 {
    row.get(index).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// YouTube API client
pub struct YouTubeClient {
    http_client: reqwest::Client,
    token: String,
    data_base_url: String,
    analytics_base_url: String,
}

impl YouTubeClient {
    pub fn new(token: String) -> Result<Self, YouTubeError> {
        Self::with_base_urls(token, DATA_API_BASE_URL, ANALYTICS_API_BASE_URL)
    }

    /// Client against other endpoints (mock servers in tests)
    pub fn with_base_urls(
        token: String,
        data_base_url: &str,
        analytics_base_url: &str,
    ) -> Result<Self, YouTubeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| YouTubeError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            token,
            data_base_url: data_base_url.trim_end_matches('/').to_string(),
            analytics_base_url: analytics_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client for a channel using [`find_token`]
    pub fn for_channel(ctx: &ChannelContext) -> Result<Self, YouTubeError> {
        let (token, source) = find_token(ctx).ok_or_else(|| {
            YouTubeError::MissingToken(ctx.channel_token_path().display().to_string())
        })?;
        debug!(?source, "Using YouTube token");
        Self::new(token)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| YouTubeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(YouTubeError::Unauthorized);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(YouTubeError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| YouTubeError::ParseError(e.to_string()))
    }

    /// Uploads playlist of the authenticated channel
    pub async fn uploads_playlist_id(&self) -> Result<Option<String>, YouTubeError> {
        let url = format!("{}/channels", self.data_base_url);
        let response: ListResponse<ChannelItem> = self
            .get_json(&url, &[("part", "contentDetails"), ("mine", "true")])
            .await?;
        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details.related_playlists.uploads))
    }

    /// Up to `max_results` most recent uploads with statistics
    pub async fn recent_videos(
        &self,
        playlist_id: &str,
        max_results: usize,
    ) -> Result<Vec<VideoStats>, YouTubeError> {
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page_size = MAX_PAGE_SIZE.min(max_results.saturating_sub(videos.len()));
            if page_size == 0 {
                break;
            }

            let page: ListResponse<PlaylistItem> = {
                let page_size_text = page_size.to_string();
                let mut query = vec![
                    ("part", "snippet"),
                    ("playlistId", playlist_id),
                    ("maxResults", page_size_text.as_str()),
                ];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }
                let url = format!("{}/playlistItems", self.data_base_url);
                self.get_json(&url, &query).await?
            };
            if page.items.is_empty() {
                break;
            }

            let ids: Vec<String> = page
                .items
                .into_iter()
                .filter_map(|item| item.snippet.resource_id.video_id)
                .collect();
            if !ids.is_empty() {
                videos.extend(self.video_stats(&ids).await?);
            }

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!(count = videos.len(), "Fetched recent uploads");
        Ok(videos)
    }

    async fn video_stats(&self, ids: &[String]) -> Result<Vec<VideoStats>, YouTubeError> {
        let url = format!("{}/videos", self.data_base_url);
        let joined = ids.join(",");
        let response: ListResponse<VideoItem> = self
            .get_json(&url, &[("part", "snippet,statistics"), ("id", joined.as_str())])
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| VideoStats {
                id: item.id,
                title: item.snippet.title,
                views: count(item.statistics.view_count.as_deref()),
                likes: count(item.statistics.like_count.as_deref()),
                published_at: item.snippet.published_at,
            })
            .collect())
    }

    /// Per-video analytics between two `YYYY-MM-DD` dates; `None` without data
    pub async fn video_analytics(
        &self,
        video_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Option<VideoAnalytics>, YouTubeError> {
        let url = format!("{}/reports", self.analytics_base_url);
        let filter = format!("video=={}", video_id);
        let response: ReportResponse = self
            .get_json(
                &url,
                &[
                    ("ids", "channel==MINE"),
                    ("startDate", start_date),
                    ("endDate", end_date),
                    ("metrics", ANALYTICS_METRICS),
                    ("dimensions", "video"),
                    ("filters", filter.as_str()),
                ],
            )
            .await?;

        // [video, views, minutes, avg duration, avg %, subscribers, likes, comments]
        Ok(response.rows.first().map(|row| VideoAnalytics {
            views: number(row, 1) as i64,
            watch_minutes: number(row, 2),
            avg_view_duration: number(row, 3),
            avg_view_percentage: number(row, 4),
            subscribers_gained: number(row, 5) as i64,
            likes: number(row, 6) as i64,
            comments: number(row, 7) as i64,
        }))
    }
}
