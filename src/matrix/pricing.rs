use crate::consts::{HYPER_PRICE_DENSITY, PRICE_SWITCH_DENSITY};

/// Tuning knobs for adaptive row-wise pricing. The densities are empirical,
/// workload-dependent constants; the defaults come from `consts`.
#[derive(Clone, Copy, Debug)]
pub struct PriceControl {
    /// Observed density of recent pricing results. Above `hyper_density` the
    /// indexed phase is skipped outright.
    pub historical_density: f64,
    /// One-way switch: index maintenance is abandoned once the partial
    /// result's density exceeds this.
    pub switch_density: f64,
    /// Historical densities at or below this keep the hyper-sparse phase
    /// eligible.
    pub hyper_density: f64,
    /// Position in the direction's nonzero list to start from, for resuming
    /// a partially priced result.
    pub start: usize,
}

impl Default for PriceControl {
    fn default() -> PriceControl {
        PriceControl {
            historical_density: 0.0,
            switch_density: PRICE_SWITCH_DENSITY,
            hyper_density: HYPER_PRICE_DENSITY,
            start: 0,
        }
    }
}

impl PriceControl {
    /// Configuration that always prefers hyper-sparse pricing: historical
    /// density forced to indicate sparsity and a switch threshold that can
    /// never trigger.
    pub fn hyper() -> PriceControl {
        PriceControl {
            historical_density: -0.1,
            switch_density: 1.1,
            hyper_density: HYPER_PRICE_DENSITY,
            start: 0,
        }
    }
}

/// Phases of one adaptive pricing call. `Hyper` maintains the result index
/// row by row; `Dense` finishes without index bookkeeping and recovers the
/// index with one full scan. The switch is one-way per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PricePhase {
    Hyper(usize),
    Dense(usize),
    Done,
}

/// True when folding a row with `row_nnz` nonbasic entries into a partial
/// result of `result_count` nonzeros should abandon index maintenance:
/// either the fill-in could reach the full column count, or the partial
/// result is already denser than the caller tolerates.
pub(crate) fn should_drop_index(
    result_count: usize,
    row_nnz: usize,
    num_col: usize,
    switch_density: f64,
) -> bool {
    let density = result_count as f64 / num_col as f64;
    result_count + row_nnz >= num_col || density > switch_density
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_drop_index_test() {
        // Potential fill-in reaching the column count triggers the switch.
        assert!(should_drop_index(8, 2, 10, 1.1));
        assert!(should_drop_index(0, 10, 10, 1.1));
        assert!(!should_drop_index(3, 2, 10, 1.1));

        // So does exceeding the density threshold.
        assert!(should_drop_index(5, 1, 10, 0.4));
        assert!(!should_drop_index(4, 1, 10, 0.4));

        // A threshold above 1.0 can never trigger on density alone.
        assert!(!should_drop_index(9, 0, 10, 1.1));
    }

    #[test]
    fn hyper_control_test() {
        let ctrl = PriceControl::hyper();
        assert!(ctrl.historical_density <= ctrl.hyper_density);
        assert!(ctrl.switch_density > 1.0);
        assert_eq!(ctrl.start, 0);
    }
}
