//! HTML rendering for browsers hitting the genres endpoint.

use std::fmt::Write;

use axum::http::StatusCode;

use crate::engine::GenreReport;

const STYLE: &str = "body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\
li{margin:.2rem 0}td{padding:.1rem .6rem}.muted{color:#777}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"utf-8\">
    <title>{}</title>
    <style>{}</style>
</head>
<body>
{}
</body>
</html>",
        escape(title),
        STYLE,
        body
    )
}

pub fn genres_page(url: &str, report: &GenreReport) -> String {
    let mut body = format!("<h1>Genres</h1>\n<p class=\"muted\">{}</p>\n", escape(url));

    if report.genres.is_empty() {
        body.push_str("<p>No genres found.</p>\n");
    } else if report.counts.is_empty() {
        body.push_str("<ul>\n");
        for genre in &report.genres {
            let _ = writeln!(body, "<li>{}</li>", escape(genre));
        }
        body.push_str("</ul>\n");
    } else {
        body.push_str("<table>\n<tr><th>Genre</th><th>Tracks</th></tr>\n");
        for genre in &report.genres {
            let count = report.counts.get(genre).copied().unwrap_or_default();
            let _ = writeln!(body, "<tr><td>{}</td><td>{}</td></tr>", escape(genre), count);
        }
        body.push_str("</table>\n");
    }

    if report.failed_tracks > 0 {
        let _ = writeln!(
            body,
            "<p class=\"muted\">{} track(s) could not be looked up and were left out.</p>",
            report.failed_tracks
        );
    }

    page("Genres", &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n",
        status.as_u16(),
        escape(message)
    );
    page("Error", &body)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genres::GenreCounts;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"r&b\"</b>"), "&lt;b&gt;&quot;r&amp;b&quot;&lt;/b&gt;");
    }

    #[test]
    fn track_page_lists_genres() {
        let report = GenreReport {
            genres: vec!["dream pop".into(), "r&b".into()],
            ..GenreReport::default()
        };

        let html = genres_page("https://open.spotify.com/track/x?a=1&b=2", &report);

        assert!(html.contains("<li>dream pop</li>"));
        assert!(html.contains("<li>r&amp;b</li>"));
        assert!(html.contains("a=1&amp;b=2"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn playlist_page_shows_counts_and_failures() {
        let counts: GenreCounts = [("techno".to_string(), 3), ("house".to_string(), 1)]
            .into_iter()
            .collect();
        let report = GenreReport {
            genres: vec!["techno".into(), "house".into()],
            counts,
            failed_tracks: 2,
        };

        let html = genres_page("https://open.spotify.com/playlist/p", &report);

        assert!(html.contains("<tr><td>techno</td><td>3</td></tr>"));
        assert!(html.contains("2 track(s) could not be looked up"));
    }

    #[test]
    fn error_page_shows_status_and_message() {
        let html = error_page(StatusCode::BAD_REQUEST, "No 'url' query parameter");
        assert!(html.contains("<h1>400</h1>"));
        assert!(html.contains("No &#39;url&#39; query parameter"));
    }
}
