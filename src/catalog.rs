use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::adapter::{NewPlaylist, NewTrack, Visibility};
use crate::database::Database;
use crate::entities;
use crate::error::SyncError;
use crate::providers::ProviderKind;

/// Read/write gateway to the persisted catalog of already-imported remote ids.
///
/// The dedup policy itself lives in the adapters (read known ids, filter, bulk
/// insert); this gateway only exposes the store operations. Callers guarantee
/// at most one in-flight sync per (user, provider) pair; there is no internal
/// locking around the read-then-insert sequence.
pub struct Catalog {
    db: Arc<Database>,
}

impl Catalog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // ---- playlists ----

    pub async fn known_playlist_ids(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> Result<HashSet<String>, SyncError> {
        let rows = entities::playlist::Entity::find()
            .filter(entities::playlist::Column::UserId.eq(user_id))
            .filter(entities::playlist::Column::Provider.eq(provider.as_str()))
            .all(&self.db.conn)
            .await?;
        Ok(rows.into_iter().map(|p| p.remote_id).collect())
    }

    pub async fn insert_playlists(
        &self,
        user_id: &str,
        provider: ProviderKind,
        playlists: Vec<NewPlaylist>,
    ) -> Result<Vec<entities::playlist::Model>, SyncError> {
        let mut inserted = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            let model = entities::playlist::ActiveModel {
                user_id: Set(user_id.to_string()),
                provider: Set(provider.as_str().to_string()),
                remote_id: Set(playlist.remote_id),
                name: Set(playlist.name),
                status: Set(playlist.visibility.as_str().to_string()),
                track_count: Set(playlist.track_count),
                ..entities::playlist::ActiveModel::new()
            };
            inserted.push(model.insert(&self.db.conn).await?);
        }
        Ok(inserted)
    }

    pub async fn find_playlist(
        &self,
        user_id: &str,
        provider: ProviderKind,
        remote_id: &str,
    ) -> Result<Option<entities::playlist::Model>, SyncError> {
        Ok(entities::playlist::Entity::find()
            .filter(entities::playlist::Column::UserId.eq(user_id))
            .filter(entities::playlist::Column::Provider.eq(provider.as_str()))
            .filter(entities::playlist::Column::RemoteId.eq(remote_id))
            .one(&self.db.conn)
            .await?)
    }

    pub async fn find_playlist_by_name(
        &self,
        user_id: &str,
        provider: ProviderKind,
        name: &str,
    ) -> Result<Option<entities::playlist::Model>, SyncError> {
        Ok(entities::playlist::Entity::find()
            .filter(entities::playlist::Column::UserId.eq(user_id))
            .filter(entities::playlist::Column::Provider.eq(provider.as_str()))
            .filter(entities::playlist::Column::Name.eq(name))
            .one(&self.db.conn)
            .await?)
    }

    pub async fn playlists_for(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> Result<Vec<entities::playlist::Model>, SyncError> {
        Ok(entities::playlist::Entity::find()
            .filter(entities::playlist::Column::UserId.eq(user_id))
            .filter(entities::playlist::Column::Provider.eq(provider.as_str()))
            .all(&self.db.conn)
            .await?)
    }

    pub async fn untransferred_playlists(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> Result<Vec<entities::playlist::Model>, SyncError> {
        Ok(entities::playlist::Entity::find()
            .filter(entities::playlist::Column::UserId.eq(user_id))
            .filter(entities::playlist::Column::Provider.eq(provider.as_str()))
            .filter(entities::playlist::Column::IsTransferred.eq(false))
            .all(&self.db.conn)
            .await?)
    }

    /// Flip `is_transferred`; called only after the destination confirmed the
    /// create.
    pub async fn mark_playlist_transferred(&self, playlist_id: i64) -> Result<(), SyncError> {
        let playlist = entities::playlist::Entity::find_by_id(playlist_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| {
                SyncError::Validation(format!("no playlist with id {playlist_id}"))
            })?;
        let mut model: entities::playlist::ActiveModel = playlist.into();
        model.is_transferred = Set(true);
        model.update(&self.db.conn).await?;
        Ok(())
    }

    // ---- tracks ----

    pub async fn known_track_ids(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> Result<HashSet<String>, SyncError> {
        let rows = entities::playlist_track::Entity::find()
            .filter(entities::playlist_track::Column::UserId.eq(user_id))
            .filter(entities::playlist_track::Column::Provider.eq(provider.as_str()))
            .all(&self.db.conn)
            .await?;
        Ok(rows.into_iter().map(|t| t.remote_id).collect())
    }

    pub async fn insert_tracks(
        &self,
        user_id: &str,
        provider: ProviderKind,
        playlist_id: i64,
        tracks: Vec<NewTrack>,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError> {
        let mut inserted = Vec::with_capacity(tracks.len());
        for track in tracks {
            let model = entities::playlist_track::ActiveModel {
                user_id: Set(user_id.to_string()),
                provider: Set(provider.as_str().to_string()),
                playlist_id: Set(playlist_id),
                remote_id: Set(track.remote_id),
                name: Set(track.name),
                artist: Set(track.artist),
                album: Set(track.album),
                ..entities::playlist_track::ActiveModel::new()
            };
            inserted.push(model.insert(&self.db.conn).await?);
        }
        Ok(inserted)
    }

    pub async fn untransferred_tracks(
        &self,
        playlist_id: i64,
    ) -> Result<Vec<entities::playlist_track::Model>, SyncError> {
        Ok(entities::playlist_track::Entity::find()
            .filter(entities::playlist_track::Column::PlaylistId.eq(playlist_id))
            .filter(entities::playlist_track::Column::IsTransferred.eq(false))
            .all(&self.db.conn)
            .await?)
    }

    pub async fn mark_track_transferred(&self, track_id: i64) -> Result<(), SyncError> {
        let track = entities::playlist_track::Entity::find_by_id(track_id)
            .one(&self.db.conn)
            .await?
            .ok_or_else(|| SyncError::Validation(format!("no track with id {track_id}")))?;
        let mut model: entities::playlist_track::ActiveModel = track.into();
        model.is_transferred = Set(true);
        model.update(&self.db.conn).await?;
        Ok(())
    }

    // ---- created playlists ----

    pub async fn insert_created_playlist(
        &self,
        user_id: &str,
        provider: ProviderKind,
        remote_id: &str,
        name: &str,
        visibility: Visibility,
    ) -> Result<entities::created_playlist::Model, SyncError> {
        let model = entities::created_playlist::ActiveModel {
            user_id: Set(user_id.to_string()),
            provider: Set(provider.as_str().to_string()),
            remote_id: Set(remote_id.to_string()),
            name: Set(name.to_string()),
            status: Set(visibility.as_str().to_string()),
            ..entities::created_playlist::ActiveModel::new()
        };
        Ok(model.insert(&self.db.conn).await?)
    }

    pub async fn created_playlists(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> Result<Vec<entities::created_playlist::Model>, SyncError> {
        Ok(entities::created_playlist::Entity::find()
            .filter(entities::created_playlist::Column::UserId.eq(user_id))
            .filter(entities::created_playlist::Column::Provider.eq(provider.as_str()))
            .all(&self.db.conn)
            .await?)
    }

    /// Count of playlists created on a provider since UTC midnight; used to
    /// enforce per-day creation caps.
    pub async fn created_playlists_today(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> Result<u64, SyncError> {
        let start_of_day = chrono::Utc::now()
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        Ok(entities::created_playlist::Entity::find()
            .filter(entities::created_playlist::Column::UserId.eq(user_id))
            .filter(entities::created_playlist::Column::Provider.eq(provider.as_str()))
            .filter(entities::created_playlist::Column::CreatedAt.gte(start_of_day))
            .count(&self.db.conn)
            .await?)
    }

    // ---- search misses ----

    pub async fn record_search_miss(
        &self,
        user_id: &str,
        provider: ProviderKind,
        query: &str,
        response: &str,
    ) -> Result<(), SyncError> {
        let model = entities::search_miss::ActiveModel {
            user_id: Set(user_id.to_string()),
            provider: Set(provider.as_str().to_string()),
            query: Set(query.to_string()),
            response: Set(response.to_string()),
            ..entities::search_miss::ActiveModel::new()
        };
        model.insert(&self.db.conn).await?;
        Ok(())
    }

    pub async fn search_misses(
        &self,
        user_id: &str,
    ) -> Result<Vec<entities::search_miss::Model>, SyncError> {
        Ok(entities::search_miss::Entity::find()
            .filter(entities::search_miss::Column::UserId.eq(user_id))
            .all(&self.db.conn)
            .await?)
    }

    // ---- transfer errors ----

    pub async fn record_transfer_error(
        &self,
        user_id: &str,
        source: ProviderKind,
        destination: ProviderKind,
        item_type: &str,
        request_data: serde_json::Value,
        error: &SyncError,
    ) -> Result<(), SyncError> {
        let model = entities::transfer_error::ActiveModel {
            user_id: Set(user_id.to_string()),
            source: Set(source.as_str().to_string()),
            destination: Set(destination.as_str().to_string()),
            item_type: Set(item_type.to_string()),
            request_data: Set(request_data.to_string()),
            error: Set(format!("{}: {error}", error.code())),
            ..entities::transfer_error::ActiveModel::new()
        };
        model.insert(&self.db.conn).await?;
        Ok(())
    }

    pub async fn transfer_errors(
        &self,
        user_id: &str,
    ) -> Result<Vec<entities::transfer_error::Model>, SyncError> {
        Ok(entities::transfer_error::Entity::find()
            .filter(entities::transfer_error::Column::UserId.eq(user_id))
            .all(&self.db.conn)
            .await?)
    }
}
