//! Music catalog capability used by the genre engine.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::spotify::{Artist, PlaylistItem, Track};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog authentication failed: {0}")]
    Auth(String),
    #[error("Spotify API error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("track {0} has no artist with an id")]
    MissingArtist(String),
}

/// Read access to tracks, artists and playlists.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_track(&self, id: &str) -> Result<Track, CatalogError>;

    async fn get_artist(&self, id: &str) -> Result<Artist, CatalogError>;

    /// All items of a playlist, across every page.
    async fn get_playlist_items(&self, id: &str) -> Result<Vec<PlaylistItem>, CatalogError>;

    /// Checks that the catalog is reachable with valid credentials.
    async fn check_readiness(&self) -> Result<(), CatalogError>;
}

/// Genres of the first-listed artist of a track, in catalog order.
pub async fn primary_artist_genres(
    catalog: &dyn Catalog,
    track_id: &str,
) -> Result<Vec<String>, CatalogError> {
    let track = catalog.get_track(track_id).await?;
    let artist_id = track
        .artists
        .first()
        .and_then(|a| a.id.as_deref())
        .ok_or_else(|| CatalogError::MissingArtist(track_id.to_owned()))?;

    Ok(catalog.get_artist(artist_id).await?.genres)
}
