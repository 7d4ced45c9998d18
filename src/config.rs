use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::{DEFAULT_PLAYLIST_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT};

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub playlist_concurrency: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = parse_or(env::var("PORT").ok(), 3000);

        let spotify_client_id = env::var("SPOTIFY_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_ID is required"))?;

        let spotify_client_secret = env::var("SPOTIFY_CLIENT_SECRET")
            .map_err(|_| anyhow::anyhow!("SPOTIFY_CLIENT_SECRET is required"))?;

        let playlist_concurrency: usize = parse_or(
            env::var("PLAYLIST_CONCURRENCY").ok(),
            DEFAULT_PLAYLIST_CONCURRENCY,
        );

        let request_timeout = Duration::from_secs(parse_or(
            env::var("REQUEST_TIMEOUT_SECS").ok(),
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        ));

        Ok(Self {
            port,
            spotify_client_id,
            spotify_client_secret,
            playlist_concurrency: playlist_concurrency.max(1),
            request_timeout,
        })
    }
}

/// Parses `value`, falling back to `default` when it is absent or malformed.
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_uses_value_when_valid() {
        assert_eq!(parse_or(Some("8081".into()), 3000u16), 8081);
        assert_eq!(parse_or(Some(" 12 ".into()), 8usize), 12);
    }

    #[test]
    fn parse_or_falls_back_to_default() {
        assert_eq!(parse_or(None, 3000u16), 3000);
        assert_eq!(parse_or(Some("not-a-port".into()), 3000u16), 3000);
        assert_eq!(parse_or(Some("70000".into()), 3000u16), 3000);
    }
}
