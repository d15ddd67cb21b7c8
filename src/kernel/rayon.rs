//! Rayon row-parallel scan (feature-gated).
//!
//! The kernel is prepared once, then each row of placements is scanned
//! independently; the per-row maxima are merged in row order with the same
//! strict comparison as the sequential scan, so the result is identical to
//! [`crate::kernel::scan_best`].

use crate::kernel::{
    best_in_row, no_flat_match, placement_range, scan_best, Kernel, Peak, PreparedProbe,
    ScanParams,
};
use crate::template::TemplatePlan;
use crate::util::EquipMatchResult;
use rayon::prelude::*;

/// Row-parallel variant of [`scan_best`].
pub fn scan_best_par<K: Kernel + Sync>(
    probe: &PreparedProbe<'_>,
    plan: &TemplatePlan,
    params: ScanParams,
) -> EquipMatchResult<Peak> {
    let (max_x, max_y) = placement_range(probe, plan)?;
    if plan.is_flat() {
        return scan_best::<K>(probe, plan, params);
    }

    let kernel = K::prepare(probe, plan);
    let row_best: Vec<Option<Peak>> = (0..=max_y)
        .into_par_iter()
        .map(|y| best_in_row(&kernel, probe, plan, y, max_x, params))
        .collect();

    let mut best = None;
    for peak in row_best.into_iter().flatten() {
        Peak::keep_first_max(&mut best, peak);
    }
    best.ok_or_else(no_flat_match)
}
