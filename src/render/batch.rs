use std::ops::Range;

/// Most tiles decoded at the same time.
pub const MAX_BATCH: usize = 10;

/// Splits sorted `items` into runs of at most `max` consecutive items sharing
/// the same `row_of` key.
pub fn batches<T, K, F>(items: &[T], row_of: F, max: usize) -> Vec<Range<usize>>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let max = max.max(1);
    let mut out = Vec::new();
    let mut start = 0;
    while start < items.len() {
        let row = row_of(&items[start]);
        let mut end = start + 1;
        while end < items.len() && end - start < max && row_of(&items[end]) == row {
            end += 1;
        }
        out.push(start..end);
        start = end;
    }
    out
}
