//! Genre frequency accumulation and ranking.

use std::collections::BTreeMap;

/// Genre name -> number of occurrences.
pub type GenreCounts = BTreeMap<String, u32>;

/// Accumulates genre occurrences across tracks.
#[derive(Debug, Default)]
pub struct GenreTally {
    counts: GenreCounts,
}

impl GenreTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every occurrence, including repeats within `genres`.
    pub fn record<S: AsRef<str>>(&mut self, genres: &[S]) {
        for genre in genres {
            *self.counts.entry(genre.as_ref().to_owned()).or_insert(0) += 1;
        }
    }

    pub fn into_counts(self) -> GenreCounts {
        self.counts
    }
}

/// Distinct genres by descending count; equal counts are ordered alphabetically.
pub fn rank(counts: &GenreCounts) -> Vec<String> {
    let mut ranked: Vec<(&String, u32)> = counts.iter().map(|(g, c)| (g, *c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().map(|(g, _)| g.clone()).collect()
}
