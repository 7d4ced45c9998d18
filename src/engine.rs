//! Genre resolution: URL -> classified reference -> genres.
//!
//! Tracks resolve to the genres of their primary artist. Playlists fan out one
//! worker per track, bounded by a semaphore; workers hand their results to the
//! coordinating task over a channel and only the coordinator touches the tally.
//! Shortlinks are expanded and the resulting URL is dispatched again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::catalog::{primary_artist_genres, Catalog, CatalogError};
use crate::genres::{rank, GenreCounts, GenreTally};
use crate::spotify::shortlink::{ResolutionError, ShortlinkResolver};
use crate::url_parser::{classify, ParseError, UrlKind};

pub const DEFAULT_PLAYLIST_CONCURRENCY: usize = 8;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_SHORTLINK_HOPS: usize = 3;

/// Result of resolving one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreReport {
    /// Track: catalog order. Playlist: distinct genres, most frequent first.
    pub genres: Vec<String>,
    /// Per-genre occurrence counts. Empty for single tracks.
    pub counts: GenreCounts,
    /// Playlist tracks whose lookup failed and were left out of `counts`.
    pub failed_tracks: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("can't parse url — it is either not supported, or it is mistyped")]
    Unparseable(#[source] ParseError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

pub struct GenreEngine {
    catalog: Arc<dyn Catalog>,
    shortlinks: Arc<dyn ShortlinkResolver>,
    playlist_concurrency: usize,
    request_timeout: Duration,
}

impl GenreEngine {
    pub fn new(catalog: Arc<dyn Catalog>, shortlinks: Arc<dyn ShortlinkResolver>) -> Self {
        Self {
            catalog,
            shortlinks,
            playlist_concurrency: DEFAULT_PLAYLIST_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Max catalog lookups in flight while resolving a playlist.
    pub fn with_playlist_concurrency(mut self, concurrency: usize) -> Self {
        self.playlist_concurrency = concurrency.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Resolves `url` within the request deadline. When the deadline passes,
    /// outstanding playlist workers are aborted.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_genres(&self, url: &str) -> Result<GenreReport, EngineError> {
        match tokio::time::timeout(self.request_timeout, self.dispatch(url)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.request_timeout, "genre resolution timed out");
                Err(EngineError::Timeout(self.request_timeout))
            }
        }
    }

    async fn dispatch(&self, url: &str) -> Result<GenreReport, EngineError> {
        let mut url = url.to_owned();
        let mut hops = 0;

        loop {
            let parsed = classify(&url).map_err(|e| {
                tracing::warn!(error = %e, "failed to classify url");
                EngineError::Unparseable(e)
            })?;
            tracing::debug!(kind = %parsed.kind, id = %parsed.id, "classified url");

            match parsed.kind {
                UrlKind::TrackReference => return self.track_genres(&parsed.id).await,
                UrlKind::PlaylistReference => return self.playlist_genres(&parsed.id).await,
                UrlKind::Shortlink => {
                    if hops == MAX_SHORTLINK_HOPS {
                        return Err(ResolutionError::TooManyHops(hops).into());
                    }
                    hops += 1;
                    url = self.shortlinks.resolve(&parsed.id).await?;
                    tracing::info!(shortlink = %parsed.id, resolved = %url, "resolved shortlink");
                }
            }
        }
    }

    async fn track_genres(&self, track_id: &str) -> Result<GenreReport, EngineError> {
        let genres = primary_artist_genres(self.catalog.as_ref(), track_id).await?;

        Ok(GenreReport {
            genres,
            ..GenreReport::default()
        })
    }

    async fn playlist_genres(&self, playlist_id: &str) -> Result<GenreReport, EngineError> {
        let track_ids: Vec<String> = self
            .catalog
            .get_playlist_items(playlist_id)
            .await?
            .iter()
            .filter_map(|item| item.track_id().map(str::to_owned))
            .collect();
        let total = track_ids.len();

        let semaphore = Arc::new(Semaphore::new(self.playlist_concurrency));
        let (tx, mut rx) = mpsc::channel(self.playlist_concurrency);
        let mut workers = JoinSet::new();

        for track_id in track_ids {
            let catalog = Arc::clone(&self.catalog);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();

            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let outcome = primary_artist_genres(catalog.as_ref(), &track_id).await;
                let _ = tx.send((track_id, outcome)).await;
            });
        }
        drop(tx);

        let mut tally = GenreTally::new();
        let mut succeeded = 0;
        while let Some((track_id, outcome)) = rx.recv().await {
            match outcome {
                Ok(genres) => {
                    tally.record(&genres);
                    succeeded += 1;
                }
                Err(e) => {
                    tracing::warn!(track_id = %track_id, error = %e, "skipping playlist track");
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "playlist worker did not finish");
            }
        }

        let counts = tally.into_counts();
        let failed_tracks = total - succeeded;
        tracing::info!(
            playlist_id,
            tracks = total,
            failed_tracks,
            genres = counts.len(),
            "aggregated playlist genres"
        );

        Ok(GenreReport {
            genres: rank(&counts),
            counts,
            failed_tracks,
        })
    }
}
