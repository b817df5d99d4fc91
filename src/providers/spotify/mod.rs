pub mod adapter;
pub mod api;

/// Sentinel remote id for the user's liked-tracks collection, which Spotify
/// exposes outside of playlists. It has no real remote playlist id.
pub const SAVED_TRACKS_ID: &str = "spotify_saved_tracks";
