use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::collector::{Page, PageQuery};
use crate::error::SyncError;
use crate::transport::{HttpTransport, decode};

pub const BASE_URL: &str = "https://api.spotify.com/v1/";

/* ---------- Wire shapes ---------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub tracks: Option<SpotifyTrackRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrackRef {
    pub total: i32,
}

/// Playlist-tracks and saved-tracks pages wrap each track in an envelope;
/// `track` can be null for items removed from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrackEntry {
    #[serde(default)]
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    /// Null for local files that never hit the catalog.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub album: Option<SpotifyAlbum>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyAlbum {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifySearchResponse {
    #[serde(default)]
    pub tracks: Option<SpotifySearchTracks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifySearchTracks {
    #[serde(default)]
    pub items: Vec<SpotifyTrack>,
}

/* ---------- Port ---------- */

/// The Spotify Web API operations the adapter needs. All paging is
/// offset-addressable with a reported `total`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    async fn current_user(&self) -> Result<SpotifyUser, SyncError>;

    async fn playlists_page(&self, query: PageQuery) -> Result<Page<SpotifyPlaylist>, SyncError>;

    async fn saved_tracks_page(
        &self,
        query: PageQuery,
    ) -> Result<Page<SpotifyTrackEntry>, SyncError>;

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        query: PageQuery,
    ) -> Result<Page<SpotifyTrackEntry>, SyncError>;

    // The lifetime is named because the elided form does not survive mock
    // expansion inside the nested Option.
    async fn create_playlist<'a>(
        &self,
        owner_id: &str,
        name: &str,
        public: bool,
        description: Option<&'a str>,
    ) -> Result<SpotifyPlaylist, SyncError>;

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), SyncError>;

    async fn search_tracks(&self, query: &str) -> Result<SpotifySearchResponse, SyncError>;
}

pub struct SpotifyHttpApi {
    transport: HttpTransport,
}

impl SpotifyHttpApi {
    pub fn new(token: &str) -> Result<Self, SyncError> {
        let base = Url::parse(BASE_URL)
            .map_err(|e| SyncError::Validation(format!("invalid base URL: {e}")))?;
        Ok(Self {
            transport: HttpTransport::new(base, token.to_string()),
        })
    }

    fn page_params(query: PageQuery) -> Vec<(&'static str, String)> {
        vec![
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ]
    }
}

#[async_trait]
impl SpotifyApi for SpotifyHttpApi {
    async fn current_user(&self) -> Result<SpotifyUser, SyncError> {
        let value = self.transport.request(Method::GET, "me", &[], None).await?;
        decode(value)
    }

    async fn playlists_page(&self, query: PageQuery) -> Result<Page<SpotifyPlaylist>, SyncError> {
        let value = self
            .transport
            .request(Method::GET, "me/playlists", &Self::page_params(query), None)
            .await?;
        decode(value)
    }

    async fn saved_tracks_page(
        &self,
        query: PageQuery,
    ) -> Result<Page<SpotifyTrackEntry>, SyncError> {
        let value = self
            .transport
            .request(Method::GET, "me/tracks", &Self::page_params(query), None)
            .await?;
        decode(value)
    }

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        query: PageQuery,
    ) -> Result<Page<SpotifyTrackEntry>, SyncError> {
        let endpoint = format!("playlists/{playlist_id}/tracks");
        let value = self
            .transport
            .request(Method::GET, &endpoint, &Self::page_params(query), None)
            .await?;
        decode(value)
    }

    async fn create_playlist<'a>(
        &self,
        owner_id: &str,
        name: &str,
        public: bool,
        description: Option<&'a str>,
    ) -> Result<SpotifyPlaylist, SyncError> {
        let endpoint = format!("users/{owner_id}/playlists");
        let body = json!({
            "name": name,
            "public": public,
            "description": description,
        });
        let value = self
            .transport
            .request(Method::POST, &endpoint, &[], Some(body))
            .await?;
        decode(value)
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), SyncError> {
        let endpoint = format!("playlists/{playlist_id}/tracks");
        let body = json!({ "uris": uris });
        self.transport
            .request(Method::POST, &endpoint, &[], Some(body))
            .await?;
        Ok(())
    }

    async fn search_tracks(&self, query: &str) -> Result<SpotifySearchResponse, SyncError> {
        let params = vec![
            ("q", query.to_string()),
            ("type", "track".to_string()),
            ("limit", "5".to_string()),
        ];
        let value = self
            .transport
            .request(Method::GET, "search", &params, None)
            .await?;
        decode(value)
    }
}
