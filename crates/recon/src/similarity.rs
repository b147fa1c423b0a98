use std::collections::BTreeSet;

use crate::model::SimilarPair;

/// Normalized InDel similarity on a 0–100 scale, rounded half-to-even.
///
/// `2 * LCS(a, b) / (|a| + |b|)`, measured in chars. Two empty strings are
/// identical (100).
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    scale(lcs_len(&a, &b), total)
}

/// `200 * lcs / total` rounded half-to-even, in integers.
fn scale(lcs: usize, total: usize) -> u8 {
    let num = 200 * lcs;
    let q = num / total;
    let r = num % total;
    let rounded = if 2 * r > total || (2 * r == total && q % 2 == 1) {
        q + 1
    } else {
        q
    };
    rounded.min(100) as u8
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// All index pairs `(i, j)`, `i < j`, whose descriptions score at least `threshold`.
pub fn similar_pairs<S: AsRef<str>>(descriptions: &[S], threshold: u8) -> Vec<SimilarPair> {
    let chars: Vec<Vec<char>> = descriptions
        .iter()
        .map(|d| d.as_ref().chars().collect())
        .collect();

    let mut pairs = Vec::new();
    for i in 0..chars.len() {
        for j in (i + 1)..chars.len() {
            let (a, b) = (&chars[i], &chars[j]);
            let total = a.len() + b.len();
            let score = if total == 0 {
                100
            } else {
                // The LCS can't exceed the shorter string.
                if scale(a.len().min(b.len()), total) < threshold {
                    continue;
                }
                scale(lcs_len(a, b), total)
            };
            if score >= threshold {
                pairs.push(SimilarPair {
                    left: i,
                    right: j,
                    score,
                });
            }
        }
    }
    pairs
}

/// Every index that takes part in at least one similar pair.
pub fn flagged_indices(pairs: &[SimilarPair]) -> BTreeSet<usize> {
    pairs.iter().flat_map(|p| [p.left, p.right]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_period_still_pairs() {
        assert_eq!(ratio("Replace bracket assembly", "Replace bracket assembly."), 98);
        let descriptions = [
            "Replace bracket assembly",
            "Replace bracket assembly.",
            "Inspect fuel line",
        ];
        let pairs = similar_pairs(&descriptions, 98);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].left, pairs[0].right), (0, 1));
        assert_eq!(flagged_indices(&pairs), BTreeSet::from([0, 1]));
    }

    #[test]
    fn identical_and_empty() {
        assert_eq!(ratio("abc", "abc"), 100);
        assert_eq!(ratio("", ""), 100);
        assert_eq!(ratio("abc", ""), 0);
    }

    #[test]
    fn known_ratios() {
        // LCS("kitten", "sitting") = 4 → 8/13 = 61.5 → 62
        assert_eq!(ratio("kitten", "sitting"), 62);
        // 2*3/8 = 75
        assert_eq!(ratio("abcd", "abce"), 75);
    }

    #[test]
    fn half_rounds_to_even() {
        // 200 * 1 / 8 = 25 exactly; 200 * 1 / 16 = 12.5 → 12
        assert_eq!(scale(1, 8), 25);
        assert_eq!(scale(1, 16), 12);
        // 200 * 3 / 16 = 37.5 → 38
        assert_eq!(scale(3, 16), 38);
    }

    #[test]
    fn case_sensitive() {
        assert!(ratio("Inspect", "INSPECT") < 50);
    }

    #[test]
    fn lower_threshold_pairs_more() {
        let descriptions = ["Inspect fuel line", "Inspect fuel lines", "Wash aircraft"];
        assert_eq!(similar_pairs(&descriptions, 98).len(), 0);
        assert_eq!(similar_pairs(&descriptions, 90).len(), 1);
    }

    #[test]
    fn empty_descriptions_pair_with_each_other() {
        let descriptions = ["", "", "x"];
        let pairs = similar_pairs(&descriptions, 98);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].score, 100);
    }
}
