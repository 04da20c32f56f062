/// Magnitude at or below which a computed entry is treated as exact zero.
/// Shared by every kernel so that cross-checks between independently computed
/// results are meaningful.
pub const TINY: f64 = 1e-14;

/// Sentinel stored when an indexed entry cancels to below [`TINY`]. Keeps the
/// slot occupied so the append-if-previously-zero index discipline never
/// records a position twice; compaction passes turn it into an exact zero.
pub const SOFT_ZERO: f64 = 1e-50;

/// Fraction of the universe above which `clear()` wipes the whole dense array
/// instead of walking the index list.
pub const DENSE_CLEAR_RATIO: f64 = 0.3;

/// Historical result densities at or below this keep hyper-sparse row pricing
/// eligible.
pub const HYPER_PRICE_DENSITY: f64 = 0.1;

/// Default partial-result density at which row pricing stops maintaining the
/// result index mid-computation.
pub const PRICE_SWITCH_DENSITY: f64 = 0.1;

/// Tolerance on elementwise and small-value discrepancies in the pricing
/// self-check.
pub const PRICE_CHECK_TOL: f64 = 1e-4;

/// Relative tolerance on the residual-norm criterion of the pricing
/// self-check.
pub const PRICE_CHECK_NORM_TOL: f64 = 1e-3;
