pub mod spotify;
pub mod youtube;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapter::CatalogAdapter;
use crate::catalog::Catalog;
use crate::error::SyncError;

/// The closed set of supported providers. Provider selection strings from the
/// outside world resolve to this enum exactly once, at the boundary; from
/// there on dispatch is static.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Spotify,
    Youtube,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Spotify => "spotify",
            ProviderKind::Youtube => "youtube",
        }
    }

    /// Build the catalog adapter for this provider against its production API.
    pub fn build_adapter(
        &self,
        token: &str,
        user_id: &str,
        catalog: Arc<Catalog>,
    ) -> Result<Box<dyn CatalogAdapter>, SyncError> {
        match self {
            ProviderKind::Spotify => {
                let api = spotify::api::SpotifyHttpApi::new(token)?;
                Ok(Box::new(spotify::adapter::SpotifyAdapter::new(
                    api, catalog, user_id,
                )))
            }
            ProviderKind::Youtube => {
                let api = youtube::api::YoutubeHttpApi::new(token)?;
                Ok(Box::new(youtube::adapter::YoutubeAdapter::new(
                    api, catalog, user_id,
                )))
            }
        }
    }
}

impl FromStr for ProviderKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spotify" => Ok(ProviderKind::Spotify),
            "youtube" => Ok(ProviderKind::Youtube),
            other => Err(SyncError::Validation(format!("unknown provider: {other}"))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trip() {
        assert_eq!("spotify".parse::<ProviderKind>().unwrap(), ProviderKind::Spotify);
        assert_eq!("YouTube".parse::<ProviderKind>().unwrap(), ProviderKind::Youtube);
        assert_eq!(ProviderKind::Spotify.to_string(), "spotify");
    }

    #[test]
    fn test_unknown_provider_is_validation_error() {
        let err = "deezer".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
    }
}
