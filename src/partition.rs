use std::ops::Range;

/// Half-open range `[start, end)` of contract indices owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPartition {
    pub start: usize,
    pub end: usize,
}

impl WorkPartition {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `[0, item_count)` into `worker_count` contiguous ranges of
/// `item_count / worker_count` items each; the last range absorbs the
/// remainder. A worker count of zero is treated as one.
///
/// With more workers than items every range but the last is empty.
pub fn partition(item_count: usize, worker_count: usize) -> Vec<WorkPartition> {
    let worker_count = worker_count.max(1);
    let per_worker = item_count / worker_count;

    (0..worker_count)
        .map(|worker| {
            let start = worker * per_worker;
            let end = if worker == worker_count - 1 { item_count } else { start + per_worker };
            WorkPartition { start, end }
        })
        .collect()
}

/// True when `partitions`, taken in order, tile `[0, item_count)` exactly.
pub fn covers(partitions: &[WorkPartition], item_count: usize) -> bool {
    let mut next = 0;
    for p in partitions {
        if p.start != next || p.end < p.start {
            return false;
        }
        next = p.end;
    }
    next == item_count
}

#[test]
fn remainder_goes_to_last_worker() {
    let parts = partition(10, 3);
    assert_eq!(
        parts,
        vec![
            WorkPartition { start: 0, end: 3 },
            WorkPartition { start: 3, end: 6 },
            WorkPartition { start: 6, end: 10 }
        ]
    );
    assert!(covers(&parts, 10));
}

#[test]
fn more_workers_than_items() {
    let parts = partition(3, 8);
    assert_eq!(parts.len(), 8);
    assert_eq!(parts.iter().filter(|p| !p.is_empty()).count(), 1);
    assert_eq!(parts[7], WorkPartition { start: 0, end: 3 });
    assert!(covers(&parts, 3));
}

#[test]
fn no_items() {
    let parts = partition(0, 4);
    assert!(parts.iter().all(WorkPartition::is_empty));
    assert!(covers(&parts, 0));
}

#[test]
fn zero_workers_means_one() {
    assert_eq!(partition(5, 0), vec![WorkPartition { start: 0, end: 5 }]);
}

#[test]
fn covers_detects_gaps_and_overlaps() {
    let gap = [WorkPartition { start: 0, end: 2 }, WorkPartition { start: 3, end: 5 }];
    let overlap = [WorkPartition { start: 0, end: 3 }, WorkPartition { start: 2, end: 5 }];
    let short = [WorkPartition { start: 0, end: 4 }];
    assert!(!covers(&gap, 5));
    assert!(!covers(&overlap, 5));
    assert!(!covers(&short, 5));
}

#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn tiles_every_index_exactly_once(items in 0usize..5_000, workers in 1usize..128) {
            let parts = partition(items, workers);
            prop_assert_eq!(parts.len(), workers);
            prop_assert!(covers(&parts, items));

            let mut seen = vec![0u8; items];
            for p in &parts {
                for i in p.range() {
                    seen[i] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&n| n == 1));
            prop_assert!(parts.iter().filter(|p| !p.is_empty()).count() <= items);
        }
    }
}
