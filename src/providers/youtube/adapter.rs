use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::adapter::{CatalogAdapter, NewPlaylist, NewTrack, PlaylistSpec, SearchHit, Visibility};
use crate::catalog::Catalog;
use crate::collector::collect_cursor;
use crate::entities;
use crate::error::SyncError;
use crate::providers::ProviderKind;
use crate::providers::youtube::DAILY_CREATE_CAP;
use crate::providers::youtube::api::YoutubeApi;
use crate::providers::youtube::title::clean_track_title;

pub struct YoutubeAdapter<A> {
    api: A,
    catalog: Arc<Catalog>,
    user_id: String,
}

impl<A: YoutubeApi> YoutubeAdapter<A> {
    pub fn new(api: A, catalog: Arc<Catalog>, user_id: &str) -> Self {
        Self {
            api,
            catalog,
            user_id: user_id.to_string(),
        }
    }
}

#[async_trait]
impl<A: YoutubeApi> CatalogAdapter for YoutubeAdapter<A> {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Youtube
    }

    fn saved_tracks_id(&self) -> Option<&'static str> {
        None
    }

    async fn playlists(&self) -> Result<Vec<entities::playlist::Model>, SyncError> {
        let pages = collect_cursor(|token| self.api.playlists_page(token)).await?;

        let mut seen: HashSet<String> = self
            .catalog
            .known_playlist_ids(&self.user_id, ProviderKind::Youtube)
            .await?;

        let mut fresh = Vec::new();
        for page in pages {
            for playlist in page.items {
                if !seen.insert(playlist.id.clone()) {
                    continue;
                }
                let visibility = playlist
                    .status
                    .map(|s| Visibility::from_status(&s.privacy_status))
                    .unwrap_or(Visibility::Private);
                fresh.push(NewPlaylist {
                    remote_id: playlist.id,
                    name: playlist.snippet.title,
                    visibility,
                    track_count: playlist.content_details.and_then(|c| c.item_count),
                });
            }
        }

        self.catalog
            .insert_playlists(&self.user_id, ProviderKind::Youtube, fresh)
            .await
    }

    async fn playlist_tracks(
        &self,
        playlist: &entities::playlist::Model,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError> {
        let remote_id = playlist.remote_id.clone();
        let pages =
            collect_cursor(|token| self.api.playlist_items_page(&remote_id, token)).await?;

        let mut seen = self
            .catalog
            .known_track_ids(&self.user_id, ProviderKind::Youtube)
            .await?;

        let mut fresh = Vec::new();
        for page in pages {
            for item in page.items {
                if !seen.insert(item.id.clone()) {
                    continue;
                }
                // Video titles carry uploader noise; clean them here so the
                // stored name works as a destination search query.
                fresh.push(NewTrack {
                    remote_id: item.id,
                    name: clean_track_title(&item.snippet.title),
                    artist: None,
                    album: None,
                });
            }
        }

        self.catalog
            .insert_tracks(&self.user_id, ProviderKind::Youtube, playlist.id, fresh)
            .await
    }

    async fn saved_tracks(
        &self,
        _playlist: &entities::playlist::Model,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError> {
        Err(SyncError::Validation(
            "youtube has no saved-tracks collection".to_string(),
        ))
    }

    async fn create_playlist(
        &self,
        spec: &PlaylistSpec,
    ) -> Result<entities::created_playlist::Model, SyncError> {
        let today = self
            .catalog
            .created_playlists_today(&self.user_id, ProviderKind::Youtube)
            .await?;
        if today >= DAILY_CREATE_CAP {
            return Err(SyncError::ProviderResponse(format!(
                "youtube daily playlist creation cap of {DAILY_CREATE_CAP} reached"
            )));
        }

        let created = self
            .api
            .create_playlist(
                &spec.name,
                spec.visibility.as_str(),
                spec.description.as_deref(),
            )
            .await
            .map_err(|e| SyncError::ProviderResponse(e.to_string()))?;

        let visibility = created
            .status
            .map(|s| Visibility::from_status(&s.privacy_status))
            .unwrap_or(spec.visibility);

        self.catalog
            .insert_created_playlist(
                &self.user_id,
                ProviderKind::Youtube,
                &created.id,
                &created.snippet.title,
                visibility,
            )
            .await
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SyncError> {
        // No batch endpoint: one insert call per track. Keep going past
        // individual failures; successful inserts stay applied.
        let mut failures = Vec::new();
        for track_id in track_ids {
            if let Err(e) = self.api.insert_playlist_item(playlist_id, track_id).await {
                warn!(track_id, error = %e, "youtube playlist insert failed");
                failures.push(format!("{track_id}: {e}"));
            }
        }

        if !failures.is_empty() {
            return Err(SyncError::AddTracks(format!(
                "{} of {} inserts failed: {}",
                failures.len(),
                track_ids.len(),
                failures.join("; ")
            )));
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Option<SearchHit>, SyncError> {
        let response = self.api.search_videos(query).await?;

        for item in &response.items {
            if let Some(video_id) = &item.id.video_id {
                let name = item
                    .snippet
                    .as_ref()
                    .map(|s| s.title.clone())
                    .unwrap_or_else(|| query.to_string());
                return Ok(Some(SearchHit {
                    remote_id: video_id.clone(),
                    name,
                }));
            }
        }

        info!(query, "no youtube search result");
        let raw = serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
        self.catalog
            .record_search_miss(&self.user_id, ProviderKind::Youtube, query, &raw)
            .await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CursorPage;
    use crate::providers::youtube::api::{
        MockYoutubeApi, YoutubeItemContent, YoutubePlaylist, YoutubePlaylistContent,
        YoutubePlaylistItem, YoutubeSearchId, YoutubeSearchItem, YoutubeSearchResponse,
        YoutubeSnippet, YoutubeStatus,
    };
    use crate::test_utils::test_db;

    fn wire_playlist(id: &str, title: &str, privacy: &str, count: i32) -> YoutubePlaylist {
        YoutubePlaylist {
            id: id.into(),
            snippet: YoutubeSnippet {
                title: title.into(),
                description: None,
            },
            status: Some(YoutubeStatus {
                privacy_status: privacy.into(),
            }),
            content_details: Some(YoutubePlaylistContent {
                item_count: Some(count),
            }),
        }
    }

    fn wire_item(id: &str, title: &str) -> YoutubePlaylistItem {
        YoutubePlaylistItem {
            id: id.into(),
            snippet: YoutubeSnippet {
                title: title.into(),
                description: None,
            },
            content_details: Some(YoutubeItemContent {
                video_id: Some(format!("v-{id}")),
            }),
        }
    }

    fn adapter_with(api: MockYoutubeApi, catalog: Arc<Catalog>) -> YoutubeAdapter<MockYoutubeApi> {
        YoutubeAdapter::new(api, catalog, "u1")
    }

    #[tokio::test]
    async fn test_playlists_follow_cursor_pages() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let mut api = MockYoutubeApi::new();
        api.expect_playlists_page().returning(|token| {
            Ok(match token.as_deref() {
                None => CursorPage {
                    items: vec![wire_playlist("y1", "Workout", "public", 4)],
                    next_page_token: Some("cursor-2".into()),
                },
                Some("cursor-2") => CursorPage {
                    items: vec![wire_playlist("y2", "Chill", "private", 9)],
                    next_page_token: None,
                },
                Some(other) => panic!("unexpected token {other}"),
            })
        });

        let adapter = adapter_with(api, catalog.clone());
        let inserted = adapter.playlists().await.unwrap();

        assert_eq!(inserted.len(), 2);
        assert_eq!(inserted[0].remote_id, "y1");
        assert_eq!(inserted[0].status, "public");
        assert_eq!(inserted[0].track_count, Some(4));
        assert_eq!(inserted[1].remote_id, "y2");
        assert_eq!(inserted[1].status, "private");
    }

    #[tokio::test]
    async fn test_playlist_tracks_clean_titles() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let playlist_rows = catalog
            .insert_playlists(
                "u1",
                ProviderKind::Youtube,
                vec![NewPlaylist {
                    remote_id: "y1".into(),
                    name: "Workout".into(),
                    visibility: Visibility::Public,
                    track_count: None,
                }],
            )
            .await
            .unwrap();

        let mut api = MockYoutubeApi::new();
        api.expect_playlist_items_page().returning(|_, _| {
            Ok(CursorPage {
                items: vec![wire_item("i1", "Six Minutes (Official Video)")],
                next_page_token: None,
            })
        });

        let adapter = adapter_with(api, catalog.clone());
        let inserted = adapter.playlist_tracks(&playlist_rows[0]).await.unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].name, "Six Minutes");
        assert!(inserted[0].artist.is_none());
    }

    #[tokio::test]
    async fn test_create_playlist_enforces_daily_cap() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        for i in 0..DAILY_CREATE_CAP {
            catalog
                .insert_created_playlist(
                    "u1",
                    ProviderKind::Youtube,
                    &format!("yt{i}"),
                    &format!("Playlist {i}"),
                    Visibility::Private,
                )
                .await
                .unwrap();
        }

        // The API must never be hit once the cap is reached.
        let api = MockYoutubeApi::new();
        let adapter = adapter_with(api, catalog.clone());

        let err = adapter
            .create_playlist(&PlaylistSpec {
                name: "One Too Many".into(),
                visibility: Visibility::Private,
                description: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::ProviderResponse(_)));
    }

    #[tokio::test]
    async fn test_create_playlist_records_created_row() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let mut api = MockYoutubeApi::new();
        api.expect_create_playlist()
            .withf(|title, privacy, _| title == "Road Trip" && privacy == "private")
            .times(1)
            .returning(|_, _, _| Ok(wire_playlist("yt-new", "Road Trip", "private", 0)));

        let adapter = adapter_with(api, catalog.clone());
        let created = adapter
            .create_playlist(&PlaylistSpec {
                name: "Road Trip".into(),
                visibility: Visibility::Private,
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(created.remote_id, "yt-new");
        assert_eq!(created.status, "private");

        let rows = catalog
            .created_playlists("u1", ProviderKind::Youtube)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_add_tracks_continues_past_failures_then_errors() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let mut api = MockYoutubeApi::new();
        api.expect_insert_playlist_item()
            .withf(|_, video| video == "v1")
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_insert_playlist_item()
            .withf(|_, video| video == "v2")
            .times(1)
            .returning(|_, _| {
                Err(SyncError::Response {
                    status: 403,
                    body: "quota exceeded".into(),
                })
            });
        api.expect_insert_playlist_item()
            .withf(|_, video| video == "v3")
            .times(1)
            .returning(|_, _| Ok(()));

        let adapter = adapter_with(api, catalog);
        let err = adapter
            .add_tracks_to_playlist("yt1", &["v1".into(), "v2".into(), "v3".into()])
            .await
            .unwrap_err();

        match err {
            SyncError::AddTracks(msg) => {
                assert!(msg.contains("1 of 3"));
                assert!(msg.contains("quota exceeded"));
            }
            other => panic!("expected AddTracks, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_miss_records_row() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let mut api = MockYoutubeApi::new();
        api.expect_search_videos()
            .times(1)
            .returning(|_| Ok(YoutubeSearchResponse { items: vec![] }));

        let adapter = adapter_with(api, catalog.clone());
        let hit = adapter.search("Six Minutes").await.unwrap();

        assert!(hit.is_none());
        let misses = catalog.search_misses("u1").await.unwrap();
        assert_eq!(misses.len(), 1);
        assert_eq!(misses[0].provider, "youtube");
    }

    #[tokio::test]
    async fn test_search_hit_extracts_video_id() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let mut api = MockYoutubeApi::new();
        api.expect_search_videos().returning(|_| {
            Ok(YoutubeSearchResponse {
                items: vec![YoutubeSearchItem {
                    id: YoutubeSearchId {
                        video_id: Some("vid42".into()),
                    },
                    snippet: Some(YoutubeSnippet {
                        title: "Six Minutes (Official Video)".into(),
                        description: None,
                    }),
                }],
            })
        });

        let adapter = adapter_with(api, catalog);
        let hit = adapter.search("Six Minutes").await.unwrap().unwrap();

        assert_eq!(hit.remote_id, "vid42");
    }

    #[tokio::test]
    async fn test_saved_tracks_is_a_caller_error() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let playlist_rows = catalog
            .insert_playlists(
                "u1",
                ProviderKind::Youtube,
                vec![NewPlaylist {
                    remote_id: "y1".into(),
                    name: "Workout".into(),
                    visibility: Visibility::Public,
                    track_count: None,
                }],
            )
            .await
            .unwrap();

        let adapter = adapter_with(MockYoutubeApi::new(), catalog);
        let err = adapter.saved_tracks(&playlist_rows[0]).await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
    }
}
