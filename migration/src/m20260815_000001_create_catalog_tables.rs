use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create playlists table. Uniqueness over (user, provider, remote_id)
        // is what the dedup gateway relies on.
        manager
            .create_table(
                Table::create()
                    .table(Playlists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Playlists::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Playlists::UserId).string().not_null())
                    .col(ColumnDef::new(Playlists::Provider).string().not_null())
                    .col(ColumnDef::new(Playlists::RemoteId).string().not_null())
                    .col(ColumnDef::new(Playlists::Name).string().not_null())
                    .col(ColumnDef::new(Playlists::Status).string().not_null())
                    .col(ColumnDef::new(Playlists::TrackCount).integer())
                    .col(
                        ColumnDef::new(Playlists::IsTransferred)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Playlists::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Playlists::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Create playlist_tracks table
        manager
            .create_table(
                Table::create()
                    .table(PlaylistTracks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlaylistTracks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlaylistTracks::UserId).string().not_null())
                    .col(ColumnDef::new(PlaylistTracks::Provider).string().not_null())
                    .col(
                        ColumnDef::new(PlaylistTracks::PlaylistId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PlaylistTracks::RemoteId).string().not_null())
                    .col(ColumnDef::new(PlaylistTracks::Name).string().not_null())
                    .col(ColumnDef::new(PlaylistTracks::Artist).string())
                    .col(ColumnDef::new(PlaylistTracks::Album).string())
                    .col(
                        ColumnDef::new(PlaylistTracks::IsTransferred)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PlaylistTracks::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlaylistTracks::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_tracks_playlist_id")
                            .from(PlaylistTracks::Table, PlaylistTracks::PlaylistId)
                            .to(Playlists::Table, Playlists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create created_playlists table. Kept separate from playlists because
        // destination-side remote ids differ from the source-side ids they
        // were created from.
        manager
            .create_table(
                Table::create()
                    .table(CreatedPlaylists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreatedPlaylists::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreatedPlaylists::UserId).string().not_null())
                    .col(
                        ColumnDef::new(CreatedPlaylists::Provider)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreatedPlaylists::RemoteId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CreatedPlaylists::Name).string().not_null())
                    .col(ColumnDef::new(CreatedPlaylists::Status).string().not_null())
                    .col(
                        ColumnDef::new(CreatedPlaylists::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CreatedPlaylists::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create search_misses table
        manager
            .create_table(
                Table::create()
                    .table(SearchMisses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchMisses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchMisses::UserId).string().not_null())
                    .col(ColumnDef::new(SearchMisses::Provider).string().not_null())
                    .col(ColumnDef::new(SearchMisses::Query).string().not_null())
                    .col(ColumnDef::new(SearchMisses::Response).string().not_null())
                    .col(
                        ColumnDef::new(SearchMisses::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchMisses::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create transfer_errors table
        manager
            .create_table(
                Table::create()
                    .table(TransferErrors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransferErrors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TransferErrors::UserId).string().not_null())
                    .col(ColumnDef::new(TransferErrors::Source).string().not_null())
                    .col(
                        ColumnDef::new(TransferErrors::Destination)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransferErrors::ItemType).string().not_null())
                    .col(
                        ColumnDef::new(TransferErrors::RequestData)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransferErrors::Error).string().not_null())
                    .col(
                        ColumnDef::new(TransferErrors::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferErrors::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_playlists_user_provider_remote")
                    .table(Playlists::Table)
                    .col(Playlists::UserId)
                    .col(Playlists::Provider)
                    .col(Playlists::RemoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_playlist_tracks_user_provider_remote")
                    .table(PlaylistTracks::Table)
                    .col(PlaylistTracks::UserId)
                    .col(PlaylistTracks::Provider)
                    .col(PlaylistTracks::RemoteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransferErrors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SearchMisses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreatedPlaylists::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlaylistTracks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Playlists::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Playlists {
    Table,
    Id,
    UserId,
    Provider,
    RemoteId,
    Name,
    Status,
    TrackCount,
    IsTransferred,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PlaylistTracks {
    Table,
    Id,
    UserId,
    Provider,
    PlaylistId,
    RemoteId,
    Name,
    Artist,
    Album,
    IsTransferred,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CreatedPlaylists {
    Table,
    Id,
    UserId,
    Provider,
    RemoteId,
    Name,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SearchMisses {
    Table,
    Id,
    UserId,
    Provider,
    Query,
    Response,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TransferErrors {
    Table,
    Id,
    UserId,
    Source,
    Destination,
    ItemType,
    RequestData,
    Error,
    CreatedAt,
    UpdatedAt,
}
