pub mod created_playlist;
pub mod playlist;
pub mod playlist_track;
pub mod search_miss;
pub mod transfer_error;
