use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::adapter::{CatalogAdapter, NewPlaylist, NewTrack, PlaylistSpec, SearchHit, Visibility};
use crate::catalog::Catalog;
use crate::collector::{Page, collect_offset};
use crate::entities;
use crate::error::SyncError;
use crate::providers::ProviderKind;
use crate::providers::spotify::SAVED_TRACKS_ID;
use crate::providers::spotify::api::{SpotifyApi, SpotifyTrackEntry};

const PAGE_LIMIT: u32 = 50;

/// Spotify caps batch adds at 100 URIs; chunk at 75 to stay clear of losses
/// on oversized requests.
const ADD_TRACKS_CHUNK: usize = 75;

pub struct SpotifyAdapter<A> {
    api: A,
    catalog: Arc<Catalog>,
    user_id: String,
}

impl<A: SpotifyApi> SpotifyAdapter<A> {
    pub fn new(api: A, catalog: Arc<Catalog>, user_id: &str) -> Self {
        Self {
            api,
            catalog,
            user_id: user_id.to_string(),
        }
    }

    /// Normalize track pages, drop already-known remote ids and insert the
    /// remainder under `playlist`.
    async fn store_track_pages(
        &self,
        playlist: &entities::playlist::Model,
        pages: Vec<Page<SpotifyTrackEntry>>,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError> {
        let mut seen = self
            .catalog
            .known_track_ids(&self.user_id, ProviderKind::Spotify)
            .await?;

        let mut fresh = Vec::new();
        for page in pages {
            for entry in page.items {
                // Local files carry no catalog id and cannot be matched later.
                let Some(track) = entry.track else { continue };
                let Some(remote_id) = track.id else { continue };
                if !seen.insert(remote_id.clone()) {
                    continue;
                }
                fresh.push(NewTrack {
                    remote_id,
                    name: track.name,
                    artist: track.artists.into_iter().next().map(|a| a.name),
                    album: track.album.map(|a| a.name),
                });
            }
        }

        self.catalog
            .insert_tracks(&self.user_id, ProviderKind::Spotify, playlist.id, fresh)
            .await
    }
}

#[async_trait]
impl<A: SpotifyApi> CatalogAdapter for SpotifyAdapter<A> {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Spotify
    }

    fn saved_tracks_id(&self) -> Option<&'static str> {
        Some(SAVED_TRACKS_ID)
    }

    async fn playlists(&self) -> Result<Vec<entities::playlist::Model>, SyncError> {
        let pages = collect_offset(|q| self.api.playlists_page(q), PAGE_LIMIT, 0).await?;

        // A failed or empty pull inserts nothing, synthetic row included.
        if pages.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<String> = self
            .catalog
            .known_playlist_ids(&self.user_id, ProviderKind::Spotify)
            .await?;

        let mut fresh = Vec::new();
        for page in pages {
            for playlist in page.items {
                if !seen.insert(playlist.id.clone()) {
                    continue;
                }
                fresh.push(NewPlaylist {
                    remote_id: playlist.id,
                    name: playlist.name,
                    visibility: Visibility::from_public_flag(playlist.public),
                    track_count: playlist.tracks.map(|t| t.total),
                });
            }
        }

        let mut inserted = self
            .catalog
            .insert_playlists(&self.user_id, ProviderKind::Spotify, fresh)
            .await?;

        // The liked-tracks collection has no remote playlist id; it rides
        // along as a synthetic private playlist under a sentinel id.
        if self
            .catalog
            .find_playlist(&self.user_id, ProviderKind::Spotify, SAVED_TRACKS_ID)
            .await?
            .is_none()
        {
            let mut synthetic = self
                .catalog
                .insert_playlists(
                    &self.user_id,
                    ProviderKind::Spotify,
                    vec![NewPlaylist {
                        remote_id: SAVED_TRACKS_ID.to_string(),
                        name: "saved_tracks".to_string(),
                        visibility: Visibility::Private,
                        track_count: None,
                    }],
                )
                .await?;
            inserted.append(&mut synthetic);
        }

        Ok(inserted)
    }

    async fn playlist_tracks(
        &self,
        playlist: &entities::playlist::Model,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError> {
        let remote_id = playlist.remote_id.clone();
        let pages = collect_offset(
            |q| self.api.playlist_tracks_page(&remote_id, q),
            PAGE_LIMIT,
            0,
        )
        .await?;
        self.store_track_pages(playlist, pages).await
    }

    async fn saved_tracks(
        &self,
        playlist: &entities::playlist::Model,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError> {
        let pages = collect_offset(|q| self.api.saved_tracks_page(q), PAGE_LIMIT, 0).await?;
        self.store_track_pages(playlist, pages).await
    }

    async fn create_playlist(
        &self,
        spec: &PlaylistSpec,
    ) -> Result<entities::created_playlist::Model, SyncError> {
        let owner = self
            .api
            .current_user()
            .await
            .map_err(|e| SyncError::ProviderResponse(e.to_string()))?;

        let created = self
            .api
            .create_playlist(
                &owner.id,
                &spec.name,
                spec.visibility == Visibility::Public,
                spec.description.as_deref(),
            )
            .await
            .map_err(|e| SyncError::ProviderResponse(e.to_string()))?;

        self.catalog
            .insert_created_playlist(
                &self.user_id,
                ProviderKind::Spotify,
                &created.id,
                &created.name,
                Visibility::from_public_flag(created.public),
            )
            .await
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SyncError> {
        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| {
                if id.starts_with("spotify:") {
                    id.clone()
                } else {
                    format!("spotify:track:{id}")
                }
            })
            .collect();

        // Chunks already sent stay applied; a failing chunk aborts the rest.
        for chunk in uris.chunks(ADD_TRACKS_CHUNK) {
            self.api.add_tracks(playlist_id, chunk).await.map_err(|e| {
                SyncError::AddTracks(format!(
                    "failed to add {} tracks to {playlist_id}: {e}",
                    chunk.len()
                ))
            })?;
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Option<SearchHit>, SyncError> {
        let response = self.api.search_tracks(query).await?;

        if let Some(tracks) = &response.tracks {
            for item in &tracks.items {
                if let Some(id) = &item.id {
                    return Ok(Some(SearchHit {
                        remote_id: id.clone(),
                        name: item.name.clone(),
                    }));
                }
            }
        }

        info!(query, "no spotify search result");
        let raw = serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
        self.catalog
            .record_search_miss(&self.user_id, ProviderKind::Spotify, query, &raw)
            .await?;
        Ok(None)
    }
}
