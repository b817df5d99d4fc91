/// Error taxonomy threaded through transport, collector, adapters and the
/// transfer orchestrator. Failures travel as values between layers; only
/// `Validation` marks a caller-programming error that should abort a call
/// chain outright.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Timeout or connection-level failure. Always transient.
    #[error("connection failure: {0}")]
    Connection(String),

    /// Non-2xx HTTP status, or a 2xx response whose body could not be decoded.
    #[error("provider responded with status {status}: {body}")]
    Response { status: u16, body: String },

    /// The caller passed an out-of-contract argument (e.g. page limit above
    /// the provider cap, absolute endpoint URL).
    #[error("validation error: {0}")]
    Validation(String),

    /// A well-formed but unusable provider response at the adapter level.
    #[error("provider response error: {0}")]
    ProviderResponse(String),

    /// A batch track-add failed outright. Earlier batches stay applied.
    #[error("failed to add tracks to playlist: {0}")]
    AddTracks(String),

    /// Everything requested was already synced. Expected, not exceptional;
    /// signalled distinctly so callers can report a no-op.
    #[error("all {0} on this account already processed")]
    AlreadyProcessed(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl SyncError {
    /// Machine-readable code consumed by the external HTTP-error-mapping layer.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Connection(_) => "CONNECTION_ERROR",
            SyncError::Response { .. } => "RESPONSE_ERROR",
            SyncError::Validation(_) => "VALIDATION_ERROR",
            SyncError::ProviderResponse(_) => "PROVIDER_RESPONSE_ERROR",
            SyncError::AddTracks(_) => "ADD_TRACKS_ERROR",
            SyncError::AlreadyProcessed(what) => match *what {
                "tracks" => "ALL_TRACKS_ALREADY_PROCESSED",
                _ => "ALL_PLAYLISTS_ALREADY_PROCESSED",
            },
            SyncError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Transient failures are safe to retry from the outside; the engine
    /// itself never retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Connection(_))
    }
}
