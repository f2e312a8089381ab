//! Deterministic workload partitioning.
//!
//! Splits a task range into near-equal contiguous chunks, one per worker.
//! The assignment is reproducible on every process, which is what lets the
//! manager copy each worker's reply into a precomputed offset without any
//! merge logic: the chunks are disjoint and cover the whole range exactly.

/// Contiguous half-open range `[low, high)` assigned to `idxworker`.
///
/// The first `ntask % nworker` workers receive one extra task, so chunk
/// sizes differ by at most 1. An out-of-range `idxworker` gets the
/// zero-length tail slice `(ntask, ntask)`; the partition table built at
/// session construction never exercises that branch.
pub fn balance(ntask: usize, nworker: usize, idxworker: usize) -> (usize, usize) {
    if idxworker >= nworker {
        return (ntask, ntask);
    }
    let divisor = ntask / nworker;
    let remainder = ntask % nworker;
    if idxworker < remainder {
        let low = idxworker * (divisor + 1);
        (low, low + divisor + 1)
    } else {
        let low = remainder + idxworker * divisor;
        (low, low + divisor)
    }
}

/// `(counts, offsets)` tables for a variable-size collective gather.
///
/// `offsets[i]` is the prefix sum of `counts[0..i]`. Zero workers yields
/// empty tables.
pub fn balance_gatherv(ntask: usize, nworker: usize) -> (Vec<usize>, Vec<usize>) {
    if nworker == 0 {
        return (Vec::new(), Vec::new());
    }
    let divisor = ntask / nworker;
    let remainder = ntask % nworker;
    let counts: Vec<usize> = (0..nworker)
        .map(|i| divisor + usize::from(i < remainder))
        .collect();
    let offsets: Vec<usize> = counts
        .iter()
        .scan(0usize, |acc, &count| {
            let offset = *acc;
            *acc += count;
            Some(offset)
        })
        .collect();
    (counts, offsets)
}

/// Like [`balance_gatherv`], but inserts a zero-count entry at the manager's
/// position so an all-process collective can include a non-contributing
/// manager without special-casing it downstream.
///
/// `nworker` counts *workers* only; the returned tables have `nworker + 1`
/// entries.
pub fn balance_gatherv_skip_manager(
    ntask: usize,
    nworker: usize,
    manager_index: usize,
) -> (Vec<usize>, Vec<usize>) {
    let (mut counts, mut offsets) = balance_gatherv(ntask, nworker);
    let at = manager_index.min(counts.len());
    let duplicated = offsets.get(at).copied().unwrap_or(ntask);
    counts.insert(at, 0);
    offsets.insert(at, duplicated);
    (counts, offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_disjoint_cover() {
        for ntask in 0..40 {
            for nworker in 1..8 {
                let mut next = 0;
                for idx in 0..nworker {
                    let (low, high) = balance(ntask, nworker, idx);
                    assert_eq!(low, next, "gap or overlap at worker {idx}");
                    assert!(high >= low);
                    next = high;
                }
                assert_eq!(next, ntask, "range not covered for {ntask}/{nworker}");
            }
        }
    }

    #[test]
    fn test_sizes_differ_by_at_most_one() {
        for ntask in 0..40 {
            for nworker in 1..8 {
                let sizes: Vec<usize> = (0..nworker)
                    .map(|i| {
                        let (low, high) = balance(ntask, nworker, i);
                        high - low
                    })
                    .collect();
                let min = sizes.iter().min().unwrap();
                let max = sizes.iter().max().unwrap();
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn test_out_of_range_worker_gets_empty_tail() {
        assert_eq!(balance(12, 3, 3), (12, 12));
        assert_eq!(balance(12, 3, 7), (12, 12));
        assert_eq!(balance(5, 0, 0), (5, 5));
    }

    #[test]
    fn test_twelve_tasks_three_workers() {
        let table: Vec<_> = (0..3).map(|i| balance(12, 3, i)).collect();
        assert_eq!(table, vec![(0, 4), (4, 8), (8, 12)]);
    }

    #[test]
    fn test_gatherv_matches_balance() {
        for ntask in 0..30 {
            for nworker in 1..6 {
                let (counts, offsets) = balance_gatherv(ntask, nworker);
                assert_eq!(counts.len(), nworker);
                assert_eq!(offsets.len(), nworker);
                for i in 0..nworker {
                    let (low, high) = balance(ntask, nworker, i);
                    assert_eq!(offsets[i], low);
                    assert_eq!(counts[i], high - low);
                }
            }
        }
    }

    #[test]
    fn test_gatherv_zero_workers() {
        assert_eq!(balance_gatherv(10, 0), (vec![], vec![]));
    }

    #[test]
    fn test_skip_manager_table() {
        // Ten tasks over three workers with the manager at index 0: the
        // manager contributes nothing and the rest is the plain partition.
        let (counts, offsets) = balance_gatherv_skip_manager(10, 3, 0);
        assert_eq!(counts, vec![0, 4, 3, 3]);
        assert_eq!(offsets, vec![0, 0, 4, 7]);
    }

    #[test]
    fn test_skip_manager_in_the_middle_and_at_the_end() {
        let (counts, offsets) = balance_gatherv_skip_manager(10, 3, 1);
        assert_eq!(counts, vec![4, 0, 3, 3]);
        assert_eq!(offsets, vec![0, 4, 4, 7]);

        let (counts, offsets) = balance_gatherv_skip_manager(10, 3, 3);
        assert_eq!(counts, vec![4, 3, 3, 0]);
        assert_eq!(offsets, vec![0, 4, 7, 10]);
    }
}
