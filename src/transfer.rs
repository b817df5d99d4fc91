use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::adapter::{CatalogAdapter, PlaylistSpec, Visibility};
use crate::catalog::Catalog;
use crate::entities::transfer_error::{ITEM_TYPE_PLAYLIST, ITEM_TYPE_TRACK};
use crate::error::SyncError;

/// Counters for one transfer run, logged by the CLI when the run completes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub playlists_created: u32,
    pub playlists_failed: u32,
    pub tracks_added: u32,
    pub tracks_missed: u32,
    pub tracks_failed: u32,
}

/// Two-phase migration between a source and a destination adapter.
///
/// Phase one mirrors source playlists onto the destination; phase two fills
/// each destination playlist with the matching source tracks via destination
/// search. Item-level failures are recorded as `transfer_error` rows and the
/// run keeps going; only infrastructure failures (the initial source pull,
/// the database) abort it. Re-running resumes from the `is_transferred`
/// flags, so a run interrupted mid-way picks up where it stopped.
pub struct TransferService {
    catalog: Arc<Catalog>,
    user_id: String,
}

impl TransferService {
    pub fn new(catalog: Arc<Catalog>, user_id: &str) -> Self {
        Self {
            catalog,
            user_id: user_id.to_string(),
        }
    }

    pub async fn transfer(
        &self,
        source: &dyn CatalogAdapter,
        destination: &dyn CatalogAdapter,
    ) -> Result<TransferOutcome, SyncError> {
        let mut outcome = TransferOutcome::default();

        self.create_playlists(source, destination, &mut outcome)
            .await?;
        self.fill_playlists(source, destination, &mut outcome)
            .await?;

        info!(
            playlists_created = outcome.playlists_created,
            playlists_failed = outcome.playlists_failed,
            tracks_added = outcome.tracks_added,
            tracks_missed = outcome.tracks_missed,
            tracks_failed = outcome.tracks_failed,
            "transfer finished"
        );
        Ok(outcome)
    }

    /// Phase one: pull source playlists, then create every untransferred one
    /// on the destination.
    async fn create_playlists(
        &self,
        source: &dyn CatalogAdapter,
        destination: &dyn CatalogAdapter,
        outcome: &mut TransferOutcome,
    ) -> Result<(), SyncError> {
        let fresh = source.playlists().await?;
        info!(count = fresh.len(), "pulled new source playlists");

        let pending = self
            .catalog
            .untransferred_playlists(&self.user_id, source.provider())
            .await?;

        for playlist in pending {
            let spec = PlaylistSpec {
                name: playlist.name.clone(),
                visibility: Visibility::from_status(&playlist.status),
                description: None,
            };
            match destination.create_playlist(&spec).await {
                Ok(created) => {
                    self.catalog.mark_playlist_transferred(playlist.id).await?;
                    outcome.playlists_created += 1;
                    info!(name = %created.name, remote_id = %created.remote_id, "created destination playlist");
                }
                Err(e) => {
                    warn!(name = %playlist.name, error = %e, "playlist create failed");
                    self.catalog
                        .record_transfer_error(
                            &self.user_id,
                            source.provider(),
                            destination.provider(),
                            ITEM_TYPE_PLAYLIST,
                            json!({ "name": playlist.name, "remote_id": playlist.remote_id }),
                            &e,
                        )
                        .await?;
                    outcome.playlists_failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Phase two: pull tracks for every source playlist, then for each
    /// destination playlist created from this source, search and add the
    /// matching untransferred tracks.
    async fn fill_playlists(
        &self,
        source: &dyn CatalogAdapter,
        destination: &dyn CatalogAdapter,
        outcome: &mut TransferOutcome,
    ) -> Result<(), SyncError> {
        let playlists = self
            .catalog
            .playlists_for(&self.user_id, source.provider())
            .await?;

        for playlist in &playlists {
            let pulled = if source.saved_tracks_id() == Some(playlist.remote_id.as_str()) {
                source.saved_tracks(playlist).await
            } else {
                source.playlist_tracks(playlist).await
            };
            match pulled {
                Ok(fresh) => {
                    info!(playlist = %playlist.name, count = fresh.len(), "pulled new source tracks")
                }
                Err(e) => {
                    // A failed pull concerns the whole playlist, not one track.
                    warn!(playlist = %playlist.name, error = %e, "track pull failed");
                    self.catalog
                        .record_transfer_error(
                            &self.user_id,
                            source.provider(),
                            destination.provider(),
                            ITEM_TYPE_PLAYLIST,
                            json!({ "playlist": playlist.remote_id }),
                            &e,
                        )
                        .await?;
                }
            }
        }

        let created = self
            .catalog
            .created_playlists(&self.user_id, destination.provider())
            .await?;

        for target in created {
            let Some(origin) = self
                .catalog
                .find_playlist_by_name(&self.user_id, source.provider(), &target.name)
                .await?
            else {
                warn!(name = %target.name, "destination playlist has no source counterpart");
                continue;
            };

            let pending = self.catalog.untransferred_tracks(origin.id).await?;
            for track in pending {
                let query = match &track.artist {
                    Some(artist) => format!("{} {artist}", track.name),
                    None => track.name.clone(),
                };

                let hit = match destination.search(&query).await {
                    Ok(Some(hit)) => hit,
                    Ok(None) => {
                        // Miss already recorded by the adapter.
                        outcome.tracks_missed += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "destination search failed");
                        self.catalog
                            .record_transfer_error(
                                &self.user_id,
                                source.provider(),
                                destination.provider(),
                                ITEM_TYPE_TRACK,
                                json!({ "query": query, "remote_id": track.remote_id }),
                                &e,
                            )
                            .await?;
                        outcome.tracks_failed += 1;
                        continue;
                    }
                };

                match destination
                    .add_tracks_to_playlist(&target.remote_id, &[hit.remote_id.clone()])
                    .await
                {
                    Ok(()) => {
                        self.catalog.mark_track_transferred(track.id).await?;
                        outcome.tracks_added += 1;
                    }
                    Err(e) => {
                        warn!(track = %track.name, error = %e, "track add failed");
                        self.catalog
                            .record_transfer_error(
                                &self.user_id,
                                source.provider(),
                                destination.provider(),
                                ITEM_TYPE_TRACK,
                                json!({
                                    "playlist": target.remote_id,
                                    "track": hit.remote_id,
                                    "query": query,
                                }),
                                &e,
                            )
                            .await?;
                        outcome.tracks_failed += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MockCatalogAdapter, NewPlaylist, NewTrack, SearchHit};
    use crate::entities;
    use crate::providers::ProviderKind;
    use crate::test_utils::test_db;

    fn source_mock() -> MockCatalogAdapter {
        let mut source = MockCatalogAdapter::new();
        source.expect_provider().return_const(ProviderKind::Spotify);
        source.expect_saved_tracks_id().returning(|| None);
        source.expect_playlists().returning(|| Ok(vec![]));
        source.expect_playlist_tracks().returning(|_| Ok(vec![]));
        source
    }

    fn dest_mock() -> MockCatalogAdapter {
        let mut dest = MockCatalogAdapter::new();
        dest.expect_provider().return_const(ProviderKind::Youtube);
        dest
    }

    fn created_row(remote_id: &str, name: &str) -> entities::created_playlist::Model {
        entities::created_playlist::Model {
            id: 1,
            user_id: "u1".into(),
            provider: "youtube".into(),
            remote_id: remote_id.into(),
            name: name.into(),
            status: "private".into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    async fn seed_playlist(
        catalog: &Catalog,
        remote_id: &str,
        name: &str,
    ) -> entities::playlist::Model {
        catalog
            .insert_playlists(
                "u1",
                ProviderKind::Spotify,
                vec![NewPlaylist {
                    remote_id: remote_id.into(),
                    name: name.into(),
                    visibility: Visibility::Private,
                    track_count: None,
                }],
            )
            .await
            .unwrap()
            .remove(0)
    }

    async fn seed_track(
        catalog: &Catalog,
        playlist_id: i64,
        remote_id: &str,
        name: &str,
        artist: Option<&str>,
    ) -> entities::playlist_track::Model {
        catalog
            .insert_tracks(
                "u1",
                ProviderKind::Spotify,
                playlist_id,
                vec![NewTrack {
                    remote_id: remote_id.into(),
                    name: name.into(),
                    artist: artist.map(Into::into),
                    album: None,
                }],
            )
            .await
            .unwrap()
            .remove(0)
    }

    #[tokio::test]
    async fn test_phase_one_creates_and_marks_playlists() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        seed_playlist(&catalog, "p1", "Road Trip").await;

        let source = source_mock();
        let mut dest = dest_mock();
        dest.expect_create_playlist()
            .withf(|spec| spec.name == "Road Trip" && spec.visibility == Visibility::Private)
            .times(1)
            .returning(|_| Ok(created_row("yt-rt", "Road Trip")));

        let service = TransferService::new(catalog.clone(), "u1");
        let outcome = service.transfer(&source, &dest).await.unwrap();

        assert_eq!(outcome.playlists_created, 1);
        assert_eq!(outcome.playlists_failed, 0);
        let pending = catalog
            .untransferred_playlists("u1", ProviderKind::Spotify)
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_playlist_create_failure_is_recorded_and_run_continues() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        seed_playlist(&catalog, "p1", "Road Trip").await;
        seed_playlist(&catalog, "p2", "Workout").await;

        let source = source_mock();
        let mut dest = dest_mock();
        dest.expect_create_playlist()
            .withf(|spec| spec.name == "Road Trip")
            .times(1)
            .returning(|_| Err(SyncError::ProviderResponse("create rejected".into())));
        dest.expect_create_playlist()
            .withf(|spec| spec.name == "Workout")
            .times(1)
            .returning(|_| Ok(created_row("yt-w", "Workout")));

        let service = TransferService::new(catalog.clone(), "u1");
        let outcome = service.transfer(&source, &dest).await.unwrap();

        assert_eq!(outcome.playlists_created, 1);
        assert_eq!(outcome.playlists_failed, 1);

        let errors = catalog.transfer_errors("u1").await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].item_type, "playlist");
        assert_eq!(errors[0].source, "spotify");
        assert_eq!(errors[0].destination, "youtube");
        assert!(errors[0].request_data.contains("Road Trip"));
    }

    #[tokio::test]
    async fn test_phase_two_adds_matched_tracks() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let playlist = seed_playlist(&catalog, "p1", "Road Trip").await;
        catalog.mark_playlist_transferred(playlist.id).await.unwrap();
        seed_track(&catalog, playlist.id, "t1", "Six Minutes", Some("Jonathan Hay")).await;
        catalog
            .insert_created_playlist(
                "u1",
                ProviderKind::Youtube,
                "yt-rt",
                "Road Trip",
                Visibility::Private,
            )
            .await
            .unwrap();

        let source = source_mock();
        let mut dest = dest_mock();
        dest.expect_search()
            .withf(|query| query == "Six Minutes Jonathan Hay")
            .times(1)
            .returning(|_| {
                Ok(Some(SearchHit {
                    remote_id: "vid1".into(),
                    name: "Six Minutes".into(),
                }))
            });
        dest.expect_add_tracks_to_playlist()
            .withf(|playlist_id, ids| playlist_id == "yt-rt" && ids.len() == 1 && ids[0] == "vid1")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = TransferService::new(catalog.clone(), "u1");
        let outcome = service.transfer(&source, &dest).await.unwrap();

        assert_eq!(outcome.tracks_added, 1);
        assert_eq!(outcome.tracks_missed, 0);
        assert_eq!(outcome.tracks_failed, 0);
        let pending = catalog.untransferred_tracks(playlist.id).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_search_miss_skips_add_and_counts_missed() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let playlist = seed_playlist(&catalog, "p1", "Road Trip").await;
        catalog.mark_playlist_transferred(playlist.id).await.unwrap();
        seed_track(&catalog, playlist.id, "t1", "Obscure B-Side", None).await;
        catalog
            .insert_created_playlist(
                "u1",
                ProviderKind::Youtube,
                "yt-rt",
                "Road Trip",
                Visibility::Private,
            )
            .await
            .unwrap();

        let source = source_mock();
        let mut dest = dest_mock();
        // No add_tracks expectation: a call would fail the test.
        dest.expect_search().times(1).returning(|_| Ok(None));

        let service = TransferService::new(catalog.clone(), "u1");
        let outcome = service.transfer(&source, &dest).await.unwrap();

        assert_eq!(outcome.tracks_added, 0);
        assert_eq!(outcome.tracks_missed, 1);
        let pending = catalog.untransferred_tracks(playlist.id).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_add_failure_records_error_and_leaves_track_pending() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let playlist = seed_playlist(&catalog, "p1", "Road Trip").await;
        catalog.mark_playlist_transferred(playlist.id).await.unwrap();
        seed_track(&catalog, playlist.id, "t1", "Six Minutes", None).await;
        catalog
            .insert_created_playlist(
                "u1",
                ProviderKind::Youtube,
                "yt-rt",
                "Road Trip",
                Visibility::Private,
            )
            .await
            .unwrap();

        let source = source_mock();
        let mut dest = dest_mock();
        dest.expect_search().times(1).returning(|_| {
            Ok(Some(SearchHit {
                remote_id: "vid1".into(),
                name: "Six Minutes".into(),
            }))
        });
        dest.expect_add_tracks_to_playlist()
            .times(1)
            .returning(|_, _| Err(SyncError::AddTracks("insert rejected".into())));

        let service = TransferService::new(catalog.clone(), "u1");
        let outcome = service.transfer(&source, &dest).await.unwrap();

        assert_eq!(outcome.tracks_added, 0);
        assert_eq!(outcome.tracks_failed, 1);

        let errors = catalog.transfer_errors("u1").await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].item_type, "track");
        assert!(errors[0].error.contains("ADD_TRACKS_ERROR"));

        let pending = catalog.untransferred_tracks(playlist.id).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_sentinel_playlist_routes_to_saved_tracks() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let playlist = seed_playlist(&catalog, "spotify_saved_tracks", "saved_tracks").await;
        catalog.mark_playlist_transferred(playlist.id).await.unwrap();

        let mut source = MockCatalogAdapter::new();
        source.expect_provider().return_const(ProviderKind::Spotify);
        source
            .expect_saved_tracks_id()
            .return_const(Some("spotify_saved_tracks"));
        source.expect_playlists().returning(|| Ok(vec![]));
        source
            .expect_saved_tracks()
            .withf(|p| p.remote_id == "spotify_saved_tracks")
            .times(1)
            .returning(|_| Ok(vec![]));

        let dest = dest_mock();
        let service = TransferService::new(catalog, "u1");
        service.transfer(&source, &dest).await.unwrap();
    }

    #[tokio::test]
    async fn test_track_pull_failure_is_recorded_and_run_continues() {
        let catalog = Arc::new(Catalog::new(test_db().await));
        let playlist = seed_playlist(&catalog, "p1", "Road Trip").await;
        catalog.mark_playlist_transferred(playlist.id).await.unwrap();

        let mut source = MockCatalogAdapter::new();
        source.expect_provider().return_const(ProviderKind::Spotify);
        source.expect_saved_tracks_id().returning(|| None);
        source.expect_playlists().returning(|| Ok(vec![]));
        source.expect_playlist_tracks().times(1).returning(|_| {
            Err(SyncError::Response {
                status: 500,
                body: "upstream".into(),
            })
        });

        let dest = dest_mock();
        let service = TransferService::new(catalog.clone(), "u1");
        let outcome = service.transfer(&source, &dest).await.unwrap();

        assert_eq!(outcome, TransferOutcome::default());
        let errors = catalog.transfer_errors("u1").await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].item_type, "playlist");
        assert!(errors[0].request_data.contains("p1"));
    }
}
