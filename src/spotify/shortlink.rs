//! Expansion of `spotify.link` shortlinks.

use async_trait::async_trait;
use reqwest::{redirect, Client};

const SHORTLINK_BASE: &str = "https://spotify.link";
const MAX_REDIRECTS: usize = 10;

// Browser user agents get an HTML page that redirects with JavaScript.
const USER_AGENT: &str = "curl/8.4.0";

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("shortlink request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("shortlink {0} did not redirect anywhere")]
    NoRedirect(String),
    #[error("gave up after {0} chained shortlinks")]
    TooManyHops(usize),
}

/// Expands a shortlink id into the canonical URL it points at.
#[async_trait]
pub trait ShortlinkResolver: Send + Sync {
    async fn resolve(&self, id: &str) -> Result<String, ResolutionError>;
}

/// Resolves shortlinks by following redirects of a HEAD request.
#[derive(Clone)]
pub struct ShortlinkClient {
    client: Client,
    base: String,
}

impl ShortlinkClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_base(SHORTLINK_BASE)
    }

    pub fn with_base(base: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl ShortlinkResolver for ShortlinkClient {
    async fn resolve(&self, id: &str) -> Result<String, ResolutionError> {
        let url = format!("{}/{}", self.base, urlencoding::encode(id));
        let res = self.client.head(&url).send().await?;

        let resolved = res.url().as_str();
        if resolved.is_empty() || resolved == url {
            return Err(ResolutionError::NoRedirect(url));
        }

        tracing::debug!(shortlink = %url, resolved, "shortlink redirect followed");
        Ok(resolved.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{header, HeaderMap, StatusCode},
        response::Redirect,
        routing::get,
        Router,
    };

    use super::*;

    type SeenAgents = Arc<Mutex<Vec<String>>>;

    fn record_agent(seen: &SeenAgents, headers: &HeaderMap) {
        let agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        seen.lock().unwrap().push(agent);
    }

    /// Serves `/abc` (redirects to `/track/xyz`), `/track/xyz` and `/plain`.
    async fn spawn_server() -> (String, SeenAgents) {
        let seen = SeenAgents::default();
        let app = Router::new()
            .route(
                "/abc",
                get(|State(seen): State<SeenAgents>, headers: HeaderMap| async move {
                    record_agent(&seen, &headers);
                    Redirect::temporary("/track/xyz")
                }),
            )
            .route("/track/xyz", get(|| async { StatusCode::OK }))
            .route(
                "/plain",
                get(|State(seen): State<SeenAgents>, headers: HeaderMap| async move {
                    record_agent(&seen, &headers);
                    StatusCode::OK
                }),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), seen)
    }

    #[tokio::test]
    async fn follows_redirect_with_curl_user_agent() {
        let (base, seen) = spawn_server().await;
        let client = ShortlinkClient::with_base(format!("{base}/")).unwrap();

        let resolved = client.resolve("abc").await.unwrap();

        assert_eq!(resolved, format!("{base}/track/xyz"));
        assert_eq!(*seen.lock().unwrap(), vec![USER_AGENT.to_string()]);
    }

    #[tokio::test]
    async fn missing_redirect_is_an_error() {
        let (base, seen) = spawn_server().await;
        let client = ShortlinkClient::with_base(base.clone()).unwrap();

        let err = client.resolve("plain").await.unwrap_err();

        assert!(
            matches!(err, ResolutionError::NoRedirect(ref url) if *url == format!("{base}/plain")),
            "unexpected error: {err}"
        );
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = ShortlinkClient::with_base(format!("http://{addr}")).unwrap();

        let err = client.resolve("abc").await.unwrap_err();

        assert!(matches!(err, ResolutionError::Http(_)), "unexpected error: {err}");
    }
}
