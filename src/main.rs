mod adapter;
mod catalog;
mod collector;
mod config;
mod database;
mod entities;
mod error;
mod logging;
mod providers;
#[cfg(test)]
mod test_utils;
mod transfer;
mod transport;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};
use tracing::info;

use crate::{
    adapter::{PlaylistSpec, Visibility},
    catalog::Catalog,
    config::Config,
    database::Database,
    error::SyncError,
    logging::setup_logging,
    providers::ProviderKind,
    transfer::TransferService,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "TUNEWIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Console log level (defaults to the config file value)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pull playlists from a provider into the local catalog
    PullPlaylists {
        /// The provider to pull from
        #[arg(short, long)]
        provider: ProviderKind,

        /// OAuth bearer token for the provider
        #[arg(short, long, env = "TUNEWIRE_TOKEN")]
        token: String,

        /// The account the pulled rows belong to
        #[arg(short, long)]
        user: String,
    },
    /// Pull the tracks of one already-pulled playlist into the local catalog
    PullTracks {
        #[arg(short, long)]
        provider: ProviderKind,

        #[arg(short, long, env = "TUNEWIRE_TOKEN")]
        token: String,

        #[arg(short, long)]
        user: String,

        /// Remote id of the playlist to pull tracks for
        #[arg(long)]
        playlist: String,
    },
    /// Create a playlist on a provider
    CreatePlaylist {
        #[arg(short, long)]
        provider: ProviderKind,

        #[arg(short, long, env = "TUNEWIRE_TOKEN")]
        token: String,

        #[arg(short, long)]
        user: String,

        /// Name for the new playlist
        #[arg(short, long)]
        name: String,

        /// Make the playlist public (default private)
        #[arg(long)]
        public: bool,

        /// Optional playlist description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Add tracks to a provider playlist
    AddTracks {
        #[arg(short, long)]
        provider: ProviderKind,

        #[arg(short, long, env = "TUNEWIRE_TOKEN")]
        token: String,

        #[arg(short, long)]
        user: String,

        /// Remote id of the playlist to add to
        #[arg(long)]
        playlist: String,

        /// Remote track ids to add (repeatable)
        #[arg(long = "track", required = true)]
        tracks: Vec<String>,
    },
    /// Search a provider for a track
    Search {
        #[arg(short, long)]
        provider: ProviderKind,

        #[arg(short, long, env = "TUNEWIRE_TOKEN")]
        token: String,

        #[arg(short, long)]
        user: String,

        /// The track query, e.g. "Six Minutes Jonathan Hay"
        query: String,
    },
    /// Transfer playlists and their tracks from one provider to another
    Transfer {
        /// The provider to read from
        #[arg(long)]
        source: ProviderKind,

        /// Bearer token for the source provider
        #[arg(long, env = "TUNEWIRE_SOURCE_TOKEN")]
        source_token: String,

        /// The provider to write to
        #[arg(long)]
        destination: ProviderKind,

        /// Bearer token for the destination provider
        #[arg(long, env = "TUNEWIRE_DESTINATION_TOKEN")]
        destination_token: String,

        #[arg(short, long)]
        user: String,
    },
    /// List recorded transfer errors
    TransferErrors {
        #[arg(short, long)]
        user: String,
    },
    /// List recorded search misses
    SearchMisses {
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load tunewire config")?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.log_level().to_string());
    setup_logging(&level)?;

    let database = Arc::new(Database::new(&config.database_path()).await?);
    let catalog = Arc::new(Catalog::new(database));

    match args.command {
        Commands::PullPlaylists {
            provider,
            token,
            user,
        } => {
            let adapter = provider.build_adapter(&token, &user, catalog)?;
            let inserted = adapter.playlists().await?;
            if inserted.is_empty() {
                let signal = SyncError::AlreadyProcessed("playlists");
                println!("{}: {signal}", signal.code());
                return Ok(());
            }
            info!(count = inserted.len(), %provider, "pulled playlists");
            for playlist in inserted {
                println!("{}\t{}\t{}", playlist.remote_id, playlist.status, playlist.name);
            }
        }
        Commands::PullTracks {
            provider,
            token,
            user,
            playlist,
        } => {
            let adapter = provider.build_adapter(&token, &user, catalog.clone())?;
            let playlist = catalog
                .find_playlist(&user, provider, &playlist)
                .await?
                .ok_or_else(|| {
                    color_eyre::eyre::eyre!("playlist {playlist} has not been pulled yet")
                })?;

            let inserted = if adapter.saved_tracks_id() == Some(playlist.remote_id.as_str()) {
                adapter.saved_tracks(&playlist).await?
            } else {
                adapter.playlist_tracks(&playlist).await?
            };
            if inserted.is_empty() {
                let signal = SyncError::AlreadyProcessed("tracks");
                println!("{}: {signal}", signal.code());
                return Ok(());
            }
            info!(count = inserted.len(), playlist = %playlist.name, "pulled tracks");
            for track in inserted {
                println!("{}\t{}", track.remote_id, track.name);
            }
        }
        Commands::CreatePlaylist {
            provider,
            token,
            user,
            name,
            public,
            description,
        } => {
            let adapter = provider.build_adapter(&token, &user, catalog)?;
            let visibility = if public {
                Visibility::Public
            } else {
                Visibility::Private
            };
            let created = adapter
                .create_playlist(&PlaylistSpec {
                    name,
                    visibility,
                    description,
                })
                .await?;
            println!("{}\t{}\t{}", created.remote_id, created.status, created.name);
        }
        Commands::AddTracks {
            provider,
            token,
            user,
            playlist,
            tracks,
        } => {
            let adapter = provider.build_adapter(&token, &user, catalog)?;
            adapter.add_tracks_to_playlist(&playlist, &tracks).await?;
            info!(count = tracks.len(), %playlist, "tracks added");
        }
        Commands::Search {
            provider,
            token,
            user,
            query,
        } => {
            let adapter = provider.build_adapter(&token, &user, catalog)?;
            match adapter.search(&query).await? {
                Some(hit) => println!("{}\t{}", hit.remote_id, hit.name),
                None => println!("no match for: {query}"),
            }
        }
        Commands::Transfer {
            source,
            source_token,
            destination,
            destination_token,
            user,
        } => {
            if source == destination {
                return Err(color_eyre::eyre::eyre!(
                    "source and destination must be different providers"
                ));
            }
            let source_adapter = source.build_adapter(&source_token, &user, catalog.clone())?;
            let destination_adapter =
                destination.build_adapter(&destination_token, &user, catalog.clone())?;

            let service = TransferService::new(catalog, &user);
            let outcome = service
                .transfer(source_adapter.as_ref(), destination_adapter.as_ref())
                .await?;

            println!(
                "playlists: {} created, {} failed; tracks: {} added, {} missed, {} failed",
                outcome.playlists_created,
                outcome.playlists_failed,
                outcome.tracks_added,
                outcome.tracks_missed,
                outcome.tracks_failed,
            );
        }
        Commands::TransferErrors { user } => {
            for error in catalog.transfer_errors(&user).await? {
                println!(
                    "{} -> {}\t{}\t{}\t{}",
                    error.source, error.destination, error.item_type, error.error, error.request_data,
                );
            }
        }
        Commands::SearchMisses { user } => {
            for miss in catalog.search_misses(&user).await? {
                println!("{}\t{}", miss.provider, miss.query);
            }
        }
    }

    Ok(())
}
