//! String similarity ratios in [0, 1].
//!
//! The default measure is the Ratcliff/Obershelp sequence ratio
//! `2·M / (|a| + |b|)`, where `M` counts characters in the longest common
//! block plus, recursively, the blocks left and right of it. The default
//! cutoffs in [`MatchingConfig`](crate::config::MatchingConfig) are tuned for
//! this measure. Edit-distance measures from `strsim` are available for
//! registries where they behave better.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Sequence,
    Levenshtein,
    JaroWinkler,
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Levenshtein => write!(f, "levenshtein"),
            Self::JaroWinkler => write!(f, "jaro_winkler"),
        }
    }
}

/// A string prepared once for repeated comparison.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub text: String,
    chars: Vec<char>,
    counts: HashMap<char, usize>,
}

impl Prepared {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut counts = HashMap::new();
        for &c in &chars {
            *counts.entry(c).or_insert(0) += 1;
        }
        Self {
            text: text.to_string(),
            chars,
            counts,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl SimilarityMetric {
    /// Similarity of `candidate` and `query` in [0, 1].
    pub fn score(self, candidate: &Prepared, query: &Prepared) -> f64 {
        match self {
            Self::Sequence => sequence_ratio(&candidate.chars, &query.chars),
            Self::Levenshtein => strsim::normalized_levenshtein(&candidate.text, &query.text),
            Self::JaroWinkler => strsim::jaro_winkler(&candidate.text, &query.text),
        }
    }

    /// Cheap value never below [`score`](Self::score). Only the sequence
    /// ratio has a useful bound; other metrics report 1.0.
    pub fn upper_bound(self, candidate: &Prepared, query: &Prepared) -> f64 {
        match self {
            Self::Sequence => {
                let length_bound = ratio_of(candidate.len().min(query.len()), candidate.len() + query.len());
                if length_bound == 0.0 {
                    return length_bound;
                }
                let shared: usize = candidate
                    .counts
                    .iter()
                    .map(|(c, &n)| n.min(query.counts.get(c).copied().unwrap_or(0)))
                    .sum();
                ratio_of(shared, candidate.len() + query.len())
            }
            Self::Levenshtein | Self::JaroWinkler => 1.0,
        }
    }
}

/// Ratcliff/Obershelp ratio of two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    sequence_ratio(&a, &b)
}

fn sequence_ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    ratio_of(matching_characters(a, b), a.len() + b.len())
}

fn ratio_of(matches: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    2.0 * matches as f64 / total as f64
}

/// Total size of the matching blocks: the longest common block, then
/// recursively the regions to its left and right.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    total
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as
/// `(start_a, start_b, len)`. Among equally long blocks the one starting
/// earliest in `a`, then earliest in `b`, wins.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    // run[j + 1] = length of the common suffix ending at (i, blo + j)
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in 0..width {
            cur[j + 1] = if a[i] == b[blo + j] { prev[j] + 1 } else { 0 };
            let k = cur[j + 1];
            if k > best_len {
                best_len = k;
                best_i = i + 1 - k;
                best_j = blo + j + 1 - k;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    (best_i, best_j, best_len)
}
