//! Approximate string matching for flowcell identifiers.
//!
//! Similarity is the matching-block ratio: the longest common contiguous block of two strings
//! is found, the search is repeated on the pieces to the left and right of it, and the total
//! number of matched characters `M` gives `2 * M / (len(a) + len(b))`.
#![forbid(unsafe_code)]

use std::cmp::Ordering;

use thiserror::Error;

/// The similarity a candidate must reach to be considered a match by default.
pub const DEFAULT_SIMILARITY_CUTOFF: f64 = 0.6;

#[derive(Error, Debug, PartialEq)]
pub enum SimilarityError {
    #[error("The similarity cutoff must be in [0.0, 1.0], found {0}")]
    InvalidCutoff(f64),

    #[error("The number of close matches to return must be greater than zero")]
    ZeroMatches,
}

/// Finds the longest block of `a[a_lo..a_hi]` equal to a block of `b[b_lo..b_hi]`.
///
/// Returns `(i, j, size)`.  Ties are resolved in favor of the block starting earliest in `a`, and
/// then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    (a_lo, a_hi): (usize, usize),
    (b_lo, b_hi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    // lengths of the matches ending at each position of b, for the previous row of a
    let mut prev = vec![0_usize; b_hi - b_lo + 1];
    for i in a_lo..a_hi {
        let mut curr = vec![0_usize; b_hi - b_lo + 1];
        for j in b_lo..b_hi {
            if a[i] == b[j] {
                let k = prev[j - b_lo] + 1;
                curr[j - b_lo + 1] = k;
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            }
        }
        prev = curr;
    }
    (best_i, best_j, best_size)
}

/// The total number of characters in matching blocks between `a` and `b`.
fn matched_characters(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut queue = vec![((0, a.len()), (0, b.len()))];
    while let Some(((a_lo, a_hi), (b_lo, b_hi))) = queue.pop() {
        let (i, j, size) = longest_match(a, b, (a_lo, a_hi), (b_lo, b_hi));
        if size > 0 {
            total += size;
            if a_lo < i && b_lo < j {
                queue.push(((a_lo, i), (b_lo, j)));
            }
            if i + size < a_hi && j + size < b_hi {
                queue.push(((i + size, a_hi), (j + size, b_hi)));
            }
        }
    }
    total
}

/// The similarity of two strings in `[0.0, 1.0]`; `1.0` when they are identical.
#[allow(clippy::cast_precision_loss)]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let length = a.len() + b.len();
    if length == 0 {
        return 1.0;
    }
    2.0 * matched_characters(&a, &b) as f64 / length as f64
}

/// Returns up to `n` of the `candidates` whose similarity to `word` is at least `cutoff`.
///
/// The best matches come first.  Candidates with equal similarity are ordered lexicographically.
///
/// # Errors
///
/// - [`SimilarityError::ZeroMatches`] if `n` is zero
/// - [`SimilarityError::InvalidCutoff`] if `cutoff` is not within `[0.0, 1.0]`
pub fn get_close_matches<'a, I>(
    word: &str,
    candidates: I,
    n: usize,
    cutoff: f64,
) -> Result<Vec<&'a str>, SimilarityError>
where
    I: IntoIterator<Item = &'a str>,
{
    if n == 0 {
        return Err(SimilarityError::ZeroMatches);
    }
    if !(0.0..=1.0).contains(&cutoff) {
        return Err(SimilarityError::InvalidCutoff(cutoff));
    }

    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        // the candidate is the first sequence, the word the second
        .map(|candidate| (ratio(candidate, word), candidate))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b.partial_cmp(score_a).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b))
    });
    Ok(scored.into_iter().take(n).map(|(_, candidate)| candidate).collect())
}
