use super::Volume;

/// Margin, in multiples of the slice count, searched around the densest slice
const MARGIN_PER_SLICE: usize = 5;

/// Selects representative axial slices of a volume
///
/// # Algorithm
///
/// 1. Sum every axial slice and take the densest one (first on ties)
/// 2. Open a window of `num_slices * 5` slices on both sides, clamped to
///    the volume
/// 3. Pick `num_slices` evenly spaced positions across the window,
///    truncated to integers
/// 4. Drop duplicates, keeping ascending order
///
/// The result is strictly ascending, within `0..z_len`, and holds between
/// 1 and `num_slices` indices. It is shorter than requested when the window
/// is narrower than `num_slices`. A `num_slices` of 0 yields no indices.
pub fn find_slices_of_interest(volume: &Volume, num_slices: usize) -> Vec<usize> {
    let sums = volume.slice_sums();
    let best = argmax_first(&sums);

    let margin = num_slices * MARGIN_PER_SLICE;
    let lo = best.saturating_sub(margin);
    let hi = (best + margin).min(sums.len().saturating_sub(1));

    let mut indices = linspace_indices(lo, hi, num_slices);
    indices.dedup();
    indices
}

/// `count` evenly spaced integer positions from `lo` to `hi` inclusive
///
/// Positions are computed as `lo + i * step` and truncated, with the last
/// one pinned to `hi`. Output is non-decreasing and may repeat values.
/// A `hi` below `lo` is raised to `lo`.
pub fn linspace_indices(lo: usize, hi: usize, count: usize) -> Vec<usize> {
    let hi = hi.max(lo);
    match count {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) as f64 / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        hi
                    } else {
                        (i as f64 * step + lo as f64) as usize
                    }
                })
                .collect()
        }
    }
}

/// Index of the largest value, first occurrence on ties; 0 for empty input
///
/// A NaN counts as the largest value, so the first NaN wins.
fn argmax_first(values: &[f64]) -> usize {
    if let Some(nan) = values.iter().position(|v| v.is_nan()) {
        return nan;
    }
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
