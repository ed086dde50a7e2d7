//! k-fold rotation over sentence-pair keys.
//!
//! The key sequence is cut into k contiguous slices whose sizes differ by at
//! most one (the first `N mod k` slices take the extra element). Copy `i`
//! holds slice `i` out for testing and trains on everything else:
//!
//! ```text
//! copy 1: [1] | 2 3 4 5 6 7 8 9 10
//! copy 2: [2] | 1 3 4 5 6 7 8 9 10
//! copy 3: [3] | 1 2 4 5 6 7 8 9 10
//! ...
//! ```
//!
//! Partitioning is deterministic. Shuffling is a separate step driven by a
//! caller-supplied RNG, so a fixed seed reproduces the same folds.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{AlignError, AlignResult};
use crate::linker::SentencePairKey;

/// Conventional ten-fold cross-validation.
pub const DEFAULT_FOLD_COUNT: usize = 10;

/// Role a fold plays within one copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoldRole {
    Train,
    Test,
}

impl FoldRole {
    pub const BOTH: [FoldRole; 2] = [FoldRole::Train, FoldRole::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoldRole::Train => "train",
            FoldRole::Test => "test",
        }
    }
}

impl std::fmt::Display for FoldRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One train/test split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldCopy {
    pub train: Vec<SentencePairKey>,
    pub test: Vec<SentencePairKey>,
}

impl FoldCopy {
    pub fn fold(&self, role: FoldRole) -> &[SentencePairKey] {
        match role {
            FoldRole::Train => &self.train,
            FoldRole::Test => &self.test,
        }
    }
}

/// Sizes of the k slices for `items` elements.
pub fn fold_sizes(items: usize, folds: usize) -> AlignResult<Vec<usize>> {
    if folds == 0 || (items > 0 && folds > items) {
        return Err(AlignError::InvalidFoldCount { folds, items });
    }
    let base = items / folds;
    let remainder = items - base * folds;
    Ok((0..folds)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

/// Build `folds` rotating train/test copies over `keys`.
///
/// Both folds of every copy keep the relative order of `keys`. An empty key
/// sequence yields `folds` empty copies.
pub fn partition(keys: &[SentencePairKey], folds: usize) -> AlignResult<Vec<FoldCopy>> {
    let sizes = fold_sizes(keys.len(), folds)?;
    let mut copies = Vec::with_capacity(folds);
    let mut start = 0;
    for size in sizes {
        let end = start + size;
        let mut train = Vec::with_capacity(keys.len() - size);
        train.extend_from_slice(&keys[..start]);
        train.extend_from_slice(&keys[end..]);
        copies.push(FoldCopy {
            train,
            test: keys[start..end].to_vec(),
        });
        start = end;
    }
    Ok(copies)
}

/// Shuffle keys in place with the given RNG.
pub fn shuffle_keys<R: Rng + ?Sized>(keys: &mut [SentencePairKey], rng: &mut R) {
    keys.shuffle(rng);
}

/// One line per copy, keys rendered `source;target` and space-separated.
pub fn fold_listing(copies: &[FoldCopy], role: FoldRole) -> String {
    let mut out = String::new();
    for copy in copies {
        let line: Vec<String> = copy.fold(role).iter().map(|k| k.to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn keys(n: usize) -> Vec<SentencePairKey> {
        (1..=n)
            .map(|i| SentencePairKey::new(format!("s{}", i), format!("t{}", i)))
            .collect()
    }

    #[test]
    fn test_fold_sizes_23_by_10() {
        assert_eq!(
            fold_sizes(23, 10).unwrap(),
            vec![3, 3, 3, 2, 2, 2, 2, 2, 2, 2]
        );
    }

    #[test]
    fn test_invalid_fold_counts() {
        assert!(matches!(
            fold_sizes(5, 0),
            Err(AlignError::InvalidFoldCount { folds: 0, items: 5 })
        ));
        assert!(matches!(
            partition(&keys(3), 4),
            Err(AlignError::InvalidFoldCount { folds: 4, items: 3 })
        ));
    }

    #[test]
    fn test_empty_input_gives_empty_copies() {
        let copies = partition(&[], 10).unwrap();
        assert_eq!(copies.len(), 10);
        assert!(copies.iter().all(|c| c.train.is_empty() && c.test.is_empty()));
    }

    #[test]
    fn test_leave_one_out_when_k_equals_n() {
        let input = keys(10);
        let copies = partition(&input, 10).unwrap();
        for (i, copy) in copies.iter().enumerate() {
            assert_eq!(copy.test, vec![input[i].clone()]);
            let expected: Vec<_> = input
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, k)| k.clone())
                .collect();
            assert_eq!(copy.train, expected);
        }
    }

    #[test]
    fn test_train_keeps_relative_order() {
        let input = keys(7);
        let copies = partition(&input, 3).unwrap();
        // sizes 3, 2, 2
        assert_eq!(copies[1].test, input[3..5].to_vec());
        let mut expected = input[..3].to_vec();
        expected.extend_from_slice(&input[5..]);
        assert_eq!(copies[1].train, expected);
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let mut first = keys(30);
        let mut second = keys(30);
        shuffle_keys(&mut first, &mut StdRng::seed_from_u64(7));
        shuffle_keys(&mut second, &mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);

        let mut sorted = first.clone();
        sorted.sort();
        let mut original = keys(30);
        original.sort();
        assert_eq!(sorted, original);
    }

    #[test]
    fn test_fold_listing() {
        let copies = partition(&keys(3), 3).unwrap();
        insta::assert_snapshot!(fold_listing(&copies, FoldRole::Test), @r###"
        s1;t1
        s2;t2
        s3;t3
        "###);
        insta::assert_snapshot!(fold_listing(&copies, FoldRole::Train), @r###"
        s2;t2 s3;t3
        s1;t1 s3;t3
        s1;t1 s2;t2
        "###);
    }
}
