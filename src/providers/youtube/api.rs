use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::collector::CursorPage;
use crate::error::SyncError;
use crate::transport::{HttpTransport, decode};

pub const BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Resource parts requested on every read; status carries the privacy flag
/// and contentDetails the item count.
const PART: &str = "snippet,status,contentDetails";

const PAGE_SIZE: u32 = 50;

/* ---------- Wire shapes ---------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubePlaylist {
    pub id: String,
    pub snippet: YoutubeSnippet,
    #[serde(default)]
    pub status: Option<YoutubeStatus>,
    #[serde(rename = "contentDetails", default)]
    pub content_details: Option<YoutubePlaylistContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeSnippet {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeStatus {
    #[serde(rename = "privacyStatus")]
    pub privacy_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubePlaylistContent {
    #[serde(rename = "itemCount", default)]
    pub item_count: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubePlaylistItem {
    pub id: String,
    pub snippet: YoutubeSnippet,
    #[serde(rename = "contentDetails", default)]
    pub content_details: Option<YoutubeItemContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeItemContent {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeSearchResponse {
    #[serde(default)]
    pub items: Vec<YoutubeSearchItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeSearchItem {
    pub id: YoutubeSearchId,
    #[serde(default)]
    pub snippet: Option<YoutubeSnippet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeSearchId {
    #[serde(rename = "videoId", default)]
    pub video_id: Option<String>,
}

/* ---------- Port ---------- */

/// The YouTube Data API operations the adapter needs. Paging is
/// cursor-addressable via `pageToken`/`nextPageToken`; there is no random
/// access and no batch insert endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait YoutubeApi: Send + Sync {
    async fn playlists_page(
        &self,
        page_token: Option<String>,
    ) -> Result<CursorPage<YoutubePlaylist>, SyncError>;

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<CursorPage<YoutubePlaylistItem>, SyncError>;

    // The lifetime is named because the elided form does not survive mock
    // expansion inside the nested Option.
    async fn create_playlist<'a>(
        &self,
        title: &str,
        privacy_status: &str,
        description: Option<&'a str>,
    ) -> Result<YoutubePlaylist, SyncError>;

    async fn insert_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), SyncError>;

    async fn search_videos(&self, query: &str) -> Result<YoutubeSearchResponse, SyncError>;
}

pub struct YoutubeHttpApi {
    transport: HttpTransport,
}

impl YoutubeHttpApi {
    pub fn new(token: &str) -> Result<Self, SyncError> {
        let base = Url::parse(BASE_URL)
            .map_err(|e| SyncError::Validation(format!("invalid base URL: {e}")))?;
        Ok(Self {
            transport: HttpTransport::new(base, token.to_string()),
        })
    }

    fn page_params(page_token: Option<String>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("part", PART.to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        params
    }
}

#[async_trait]
impl YoutubeApi for YoutubeHttpApi {
    async fn playlists_page(
        &self,
        page_token: Option<String>,
    ) -> Result<CursorPage<YoutubePlaylist>, SyncError> {
        let mut params = Self::page_params(page_token);
        params.push(("mine", "true".to_string()));
        let value = self
            .transport
            .request(Method::GET, "playlists", &params, None)
            .await?;
        decode(value)
    }

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<CursorPage<YoutubePlaylistItem>, SyncError> {
        let mut params = Self::page_params(page_token);
        params.push(("playlistId", playlist_id.to_string()));
        let value = self
            .transport
            .request(Method::GET, "playlistItems", &params, None)
            .await?;
        decode(value)
    }

    async fn create_playlist<'a>(
        &self,
        title: &str,
        privacy_status: &str,
        description: Option<&'a str>,
    ) -> Result<YoutubePlaylist, SyncError> {
        let params = vec![("part", "snippet,status".to_string())];
        let body = json!({
            "snippet": {
                "title": title,
                "description": description,
            },
            "status": {
                "privacyStatus": privacy_status,
            },
        });
        let value = self
            .transport
            .request(Method::POST, "playlists", &params, Some(body))
            .await?;
        decode(value)
    }

    async fn insert_playlist_item(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), SyncError> {
        let params = vec![("part", "snippet".to_string())];
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": {
                    "kind": "youtube#video",
                    "videoId": video_id,
                },
            },
        });
        self.transport
            .request(Method::POST, "playlistItems", &params, Some(body))
            .await?;
        Ok(())
    }

    async fn search_videos(&self, query: &str) -> Result<YoutubeSearchResponse, SyncError> {
        let params = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("maxResults", "5".to_string()),
            ("q", query.to_string()),
        ];
        let value = self
            .transport
            .request(Method::GET, "search", &params, None)
            .await?;
        decode(value)
    }
}
