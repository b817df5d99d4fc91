use crate::entities;
use crate::error::SyncError;
use crate::providers::ProviderKind;

/// Playlist visibility in the canonical schema. Providers disagree on the wire
/// shape (a `public` boolean vs. a `privacyStatus` string); everything internal
/// speaks this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn from_public_flag(public: Option<bool>) -> Self {
        match public {
            Some(true) => Visibility::Public,
            _ => Visibility::Private,
        }
    }

    pub fn from_status(status: &str) -> Self {
        if status.eq_ignore_ascii_case("public") {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

/// A provider playlist normalized out of its wire shape, before dedup/insert.
#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub remote_id: String,
    pub name: String,
    pub visibility: Visibility,
    pub track_count: Option<i32>,
}

/// A provider track normalized out of its wire shape, before dedup/insert.
#[derive(Debug, Clone)]
pub struct NewTrack {
    pub remote_id: String,
    pub name: String,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// Canonical playlist-creation request sent to a destination adapter.
#[derive(Debug, Clone)]
pub struct PlaylistSpec {
    pub name: String,
    pub visibility: Visibility,
    pub description: Option<String>,
}

/// First best match extracted from a destination provider search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub remote_id: String,
    pub name: String,
}

/// The canonical catalog capability set, one implementation per provider.
///
/// Pull operations (`playlists`, `playlist_tracks`, `saved_tracks`) normalize,
/// dedup against the persisted catalog and bulk-insert, returning only the
/// newly inserted rows. Push operations surface provider failures as
/// `ProviderResponse`/`AddTracks` errors without retrying.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogAdapter: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Sentinel remote id for the provider's non-playlist "liked tracks"
    /// collection, for providers that have one.
    fn saved_tracks_id(&self) -> Option<&'static str>;

    async fn playlists(&self) -> Result<Vec<entities::playlist::Model>, SyncError>;

    async fn playlist_tracks(
        &self,
        playlist: &entities::playlist::Model,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError>;

    async fn saved_tracks(
        &self,
        playlist: &entities::playlist::Model,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError>;

    async fn create_playlist(
        &self,
        spec: &PlaylistSpec,
    ) -> Result<entities::created_playlist::Model, SyncError>;

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SyncError>;

    /// `Ok(Some)` is a match, `Ok(None)` a provider-confirmed miss (recorded
    /// as a search-miss row by the adapter), `Err` a transport failure. The
    /// three cases are deliberately distinguishable at the type level.
    async fn search(&self, query: &str) -> Result<Option<SearchHit>, SyncError>;
}
