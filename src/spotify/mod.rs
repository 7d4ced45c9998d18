//! Spotify Web API client.
//!
//! Uses Client Credentials flow for server-to-server authentication.

pub mod shortlink;

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::catalog::{Catalog, CatalogError};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
const PLAYLIST_PAGE_SIZE: u32 = 100;

/// Spotify API client with token caching.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
    token: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: std::time::Instant,
}

impl SpotifyClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: Client::new(),
            client_id,
            client_secret,
            token_url: TOKEN_URL.to_owned(),
            api_base: API_BASE.to_owned(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Points the client at other token and API endpoints.
    pub fn with_endpoints(mut self, token_url: impl Into<String>, api_base: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    /// Acquires the first access token. Called once at startup.
    pub async fn authenticate(&self) -> Result<(), CatalogError> {
        self.ensure_token().await.map(|_| ())
    }

    /// Ensures we have a valid access token, refreshing if needed.
    async fn ensure_token(&self) -> Result<String, CatalogError> {
        {
            let guard = self.token.read().await;
            if let Some(token) = valid_token(&guard) {
                return Ok(token);
            }
        }

        // Another caller may have refreshed while we waited for the lock.
        let mut guard = self.token.write().await;
        if let Some(token) = valid_token(&guard) {
            return Ok(token);
        }
        self.store_fresh_token(&mut guard).await
    }

    async fn refresh_token(&self) -> Result<String, CatalogError> {
        let mut guard = self.token.write().await;
        self.store_fresh_token(&mut guard).await
    }

    async fn store_fresh_token(
        &self,
        slot: &mut Option<CachedToken>,
    ) -> Result<String, CatalogError> {
        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *slot = Some(token);
        tracing::debug!("refreshed Spotify access token");
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, CatalogError> {
        let params = [("grant_type", "client_credentials")];
        let auth = base64::engine::general_purpose::STANDARD.encode(
            format!("{}:{}", self.client_id, self.client_secret).as_bytes(),
        );

        let res = self
            .client
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", auth))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&params)
            .send()
            .await
            .map_err(|e| CatalogError::Auth(format!("token request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(format!(
                "token request failed: {} - {}",
                status, body
            )));
        }

        let body: TokenResponse = res
            .json()
            .await
            .map_err(|e| CatalogError::Auth(format!("token parse failed: {}", e)))?;
        let expires_at = std::time::Instant::now()
            + std::time::Duration::from_secs(body.expires_in.saturating_sub(60));

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let token = self.ensure_token().await?;

        let res = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CatalogError::Api { status, body });
        }

        Ok(res.json().await?)
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        let url = format!("{}/tracks/{}", self.api_base, urlencoding::encode(id));
        self.get_json(&url).await
    }

    async fn get_artist(&self, id: &str) -> Result<Artist, CatalogError> {
        let url = format!("{}/artists/{}", self.api_base, urlencoding::encode(id));
        self.get_json(&url).await
    }

    async fn get_playlist_items(&self, id: &str) -> Result<Vec<PlaylistItem>, CatalogError> {
        let mut next = Some(format!(
            "{}/playlists/{}/tracks?limit={}&fields={}",
            self.api_base,
            urlencoding::encode(id),
            PLAYLIST_PAGE_SIZE,
            urlencoding::encode("items(track(id,type)),next"),
        ));

        let mut items = Vec::new();
        while let Some(url) = next {
            let page: PlaylistItemsPage = self.get_json(&url).await?;
            items.extend(page.items);
            next = page.next;
        }

        tracing::debug!(playlist_id = id, items = items.len(), "fetched playlist items");
        Ok(items)
    }

    async fn check_readiness(&self) -> Result<(), CatalogError> {
        self.refresh_token().await.map(|_| ())
    }
}

fn valid_token(slot: &Option<CachedToken>) -> Option<String> {
    slot.as_ref()
        .filter(|t| t.expires_at > std::time::Instant::now())
        .map(|t| t.access_token.clone())
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

/// A Spotify track (simplified).
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Track {
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

/// Artist as embedded in a track.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct ArtistRef {
    pub id: Option<String>,
}

/// Full artist object.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Artist {
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PlaylistItem {
    pub track: Option<PlaylistTrack>,
}

/// Track or episode reference inside a playlist item.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct PlaylistTrack {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl PlaylistItem {
    /// Id of the item's track. `None` for episodes, local files and removed tracks.
    pub fn track_id(&self) -> Option<&str> {
        let track = self.track.as_ref()?;
        match track.kind.as_deref() {
            None | Some("track") => track.id.as_deref(),
            Some(_) => None,
        }
    }
}
