//! Classification of Spotify URLs into track, playlist and shortlink references.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static TRACK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/track/([a-zA-Z0-9]+)").expect("valid track regex"));
static PLAYLIST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/playlist/([a-zA-Z0-9]+)").expect("valid playlist regex"));
static SHORTLINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://spotify(?:\.app)?\.link/([a-zA-Z0-9]+)").expect("valid shortlink regex")
});

/// What a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    TrackReference,
    PlaylistReference,
    Shortlink,
}

impl fmt::Display for UrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UrlKind::TrackReference => "track",
            UrlKind::PlaylistReference => "playlist",
            UrlKind::Shortlink => "shortlink",
        };
        f.write_str(name)
    }
}

/// A classified URL: its kind plus the extracted identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub kind: UrlKind,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unparseable or unsupported URL: {input:?}")]
pub struct ParseError {
    pub input: String,
}

/// Classifies `url`. Patterns are tried in order (track, playlist, shortlink)
/// and the first match wins. Only the path segment is anchored, so query
/// strings and fragments are ignored.
pub fn classify(url: &str) -> Result<ParsedUrl, ParseError> {
    let patterns: [(&Regex, UrlKind); 3] = [
        (&*TRACK_REGEX, UrlKind::TrackReference),
        (&*PLAYLIST_REGEX, UrlKind::PlaylistReference),
        (&*SHORTLINK_REGEX, UrlKind::Shortlink),
    ];

    patterns
        .into_iter()
        .find_map(|(regex, kind)| {
            regex.captures(url).and_then(|caps| caps.get(1)).map(|id| ParsedUrl {
                kind,
                id: id.as_str().to_owned(),
            })
        })
        .ok_or_else(|| ParseError {
            input: url.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(kind: UrlKind, id: &str) -> ParsedUrl {
        ParsedUrl {
            kind,
            id: id.to_owned(),
        }
    }

    #[test]
    fn classifies_known_url_forms() {
        let cases = [
            (
                "https://open.spotify.com/playlist/3aH6s3vn4NKq3Hi3kUSz68?si=dd3bdff1b2ba4bd9",
                parsed(UrlKind::PlaylistReference, "3aH6s3vn4NKq3Hi3kUSz68"),
            ),
            (
                "https://open.spotify.com/track/2tzt6biW79znRmQCLBSWhG?si=0388bad880ec4a60",
                parsed(UrlKind::TrackReference, "2tzt6biW79znRmQCLBSWhG"),
            ),
            (
                "https://spotify.link/N2zPz9qjoDb",
                parsed(UrlKind::Shortlink, "N2zPz9qjoDb"),
            ),
            (
                "https://spotify.app.link/N2zPz9qjoDb",
                parsed(UrlKind::Shortlink, "N2zPz9qjoDb"),
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(classify(input), Ok(expected), "input: {input}");
        }
    }

    #[test]
    fn ignores_query_and_fragment_suffixes() {
        let id = "2tzt6biW79znRmQCLBSWhG";
        for suffix in ["", "?si=abc", "#frag", "?si=abc#frag", "/"] {
            let url = format!("https://open.spotify.com/track/{id}{suffix}");
            assert_eq!(classify(&url), Ok(parsed(UrlKind::TrackReference, id)));
        }
    }

    #[test]
    fn matches_localized_paths() {
        let url = "https://open.spotify.com/intl-de/track/2tzt6biW79znRmQCLBSWhG";
        assert_eq!(
            classify(url),
            Ok(parsed(UrlKind::TrackReference, "2tzt6biW79znRmQCLBSWhG"))
        );
    }

    #[test]
    fn track_wins_over_playlist() {
        let url = "https://open.spotify.com/track/abc123?context=/playlist/def456";
        assert_eq!(classify(url), Ok(parsed(UrlKind::TrackReference, "abc123")));
    }

    #[test]
    fn rejects_unknown_urls() {
        for input in [
            "https://open.spotify.com/something_garbage/2tzt6biW79znRmQCLBSWhG?si=0388bad880ec4a60",
            "https://open.spotify.com/track/",
            "https://example.com/N2zPz9qjoDb",
            "http://spotify.link/N2zPz9qjoDb",
            "",
        ] {
            let err = classify(input).unwrap_err();
            assert_eq!(err.input, input);
        }
    }
}
