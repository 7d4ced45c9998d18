//! Genre lookup for Spotify tracks, playlists and shortlinks.
//!
//! - `url_parser` - classifies Spotify URLs
//! - `catalog` - catalog capability and the primary-artist genre lookup
//! - `spotify` - Spotify Web API client and shortlink resolver
//! - `genres` - genre frequency tally and ranking
//! - `engine` - resolves a URL into genres
//! - `handlers`, `views`, `error` - HTTP surface
//! - `config` - environment configuration

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod genres;
pub mod handlers;
pub mod spotify;
pub mod url_parser;
pub mod views;
