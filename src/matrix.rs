pub mod pricing;

use log::debug;

use crate::{
    consts::{PRICE_CHECK_NORM_TOL, PRICE_CHECK_TOL, SOFT_ZERO, TINY},
    datatype::CsMat,
    matrix::pricing::{should_drop_index, PriceControl, PricePhase},
    sparse::WorkVec,
};

/// Constraint matrix held in both column-major form and a row-major mirror
/// whose rows are partitioned into a nonbasic zone followed by a basic zone.
/// The column copy is immutable after construction; the row partition moves
/// with every basis change.
///
/// Column ids at or beyond `num_col` denote logical (slack) columns: virtual
/// unit vectors that are not stored and never appear in the row mirror.
#[derive(Clone, Debug)]
pub struct ConstraintMatrix {
    num_col: usize,
    num_row: usize,

    // Column copy.
    col_start: Vec<usize>,
    row_index: Vec<usize>,
    value: Vec<f64>,

    // Row copy with the basic/nonbasic partition. For row r, entries in
    // [row_start[r], row_nonbasic_end[r]) belong to nonbasic columns and
    // entries in [row_nonbasic_end[r], row_start[r + 1]) to basic ones.
    row_start: Vec<usize>,
    row_nonbasic_end: Vec<usize>,
    row_col_index: Vec<usize>,
    row_value: Vec<f64>,
}

impl ConstraintMatrix {
    /// Build from column-compressed storage, partitioning each row of the
    /// mirror according to the per-column `nonbasic` flags.
    pub fn new(
        num_col: usize,
        num_row: usize,
        col_start: &[usize],
        row_index: &[usize],
        value: &[f64],
        nonbasic: &[bool],
    ) -> ConstraintMatrix {
        assert_eq!(col_start.len(), num_col + 1);
        assert_eq!(nonbasic.len(), num_col);
        let count = col_start[num_col];
        assert_eq!(row_index.len(), count);
        assert_eq!(value.len(), count);

        // Count the nonbasic and basic entries of each row.
        let mut nonbasic_count = vec![0usize; num_row];
        let mut basic_count = vec![0usize; num_row];
        for col in 0..num_col {
            for k in col_start[col]..col_start[col + 1] {
                if nonbasic[col] {
                    nonbasic_count[row_index[k]] += 1;
                } else {
                    basic_count[row_index[k]] += 1;
                }
            }
        }

        let mut row_start = vec![0usize; num_row + 1];
        for r in 0..num_row {
            row_start[r + 1] = row_start[r] + nonbasic_count[r] + basic_count[r];
        }
        let row_nonbasic_end: Vec<usize> =
            (0..num_row).map(|r| row_start[r] + nonbasic_count[r]).collect();

        // Scatter pass: nonbasic entries ahead of the boundary, basic ones
        // behind it.
        let mut nonbasic_at: Vec<usize> = row_start[..num_row].to_vec();
        let mut basic_at = row_nonbasic_end.clone();
        let mut row_col_index = vec![0usize; count];
        let mut row_value = vec![0.0; count];
        for col in 0..num_col {
            for k in col_start[col]..col_start[col + 1] {
                let row = row_index[k];
                let put = if nonbasic[col] {
                    let at = nonbasic_at[row];
                    nonbasic_at[row] += 1;
                    at
                } else {
                    let at = basic_at[row];
                    basic_at[row] += 1;
                    at
                };
                row_col_index[put] = col;
                row_value[put] = value[k];
            }
        }

        let matrix = ConstraintMatrix {
            num_col,
            num_row,
            col_start: col_start.to_vec(),
            row_index: row_index.to_vec(),
            value: value.to_vec(),
            row_start,
            row_nonbasic_end,
            row_col_index,
            row_value,
        };
        debug!(
            "constraint matrix: {} cols, {} rows, {} nonzeros",
            num_col, num_row, count
        );
        debug_assert!(matrix.partition_consistent(nonbasic));
        matrix
    }

    /// Fast path for a logical starting basis: every structural column is
    /// nonbasic, so the row mirror is filled in one scatter pass and each
    /// row's boundary sits at the row end.
    pub fn with_logical_basis(
        num_col: usize,
        num_row: usize,
        col_start: &[usize],
        row_index: &[usize],
        value: &[f64],
    ) -> ConstraintMatrix {
        assert_eq!(col_start.len(), num_col + 1);
        let count = col_start[num_col];
        assert_eq!(row_index.len(), count);
        assert_eq!(value.len(), count);

        let mut row_count = vec![0usize; num_row];
        for &row in row_index {
            row_count[row] += 1;
        }
        let mut row_start = vec![0usize; num_row + 1];
        for r in 0..num_row {
            row_start[r + 1] = row_start[r] + row_count[r];
        }

        let mut cursor: Vec<usize> = row_start[..num_row].to_vec();
        let mut row_col_index = vec![0usize; count];
        let mut row_value = vec![0.0; count];
        for col in 0..num_col {
            for k in col_start[col]..col_start[col + 1] {
                let row = row_index[k];
                row_col_index[cursor[row]] = col;
                row_value[cursor[row]] = value[k];
                cursor[row] += 1;
            }
        }

        let row_nonbasic_end = row_start[1..].to_vec();
        debug!(
            "constraint matrix (logical basis): {} cols, {} rows, {} nonzeros",
            num_col, num_row, count
        );
        ConstraintMatrix {
            num_col,
            num_row,
            col_start: col_start.to_vec(),
            row_index: row_index.to_vec(),
            value: value.to_vec(),
            row_start,
            row_nonbasic_end,
            row_col_index,
            row_value,
        }
    }

    pub fn from_csc(mat: &CsMat, nonbasic: &[bool]) -> ConstraintMatrix {
        let (col_start, row_index, value) = csc_parts(mat);
        ConstraintMatrix::new(mat.cols(), mat.rows(), &col_start, &row_index, &value, nonbasic)
    }

    pub fn from_csc_logical_basis(mat: &CsMat) -> ConstraintMatrix {
        let (col_start, row_index, value) = csc_parts(mat);
        ConstraintMatrix::with_logical_basis(mat.cols(), mat.rows(), &col_start, &row_index, &value)
    }

    pub fn num_col(&self) -> usize {
        self.num_col
    }

    pub fn num_row(&self) -> usize {
        self.num_row
    }

    pub fn nnz(&self) -> usize {
        self.col_start[self.num_col]
    }

    /// Reflect a basis pivot: `col_in` becomes basic, `col_out` nonbasic.
    /// `col_in` must currently be nonbasic and `col_out` basic; ids at or
    /// beyond `num_col` are logical columns and need no mirror update.
    pub fn update(&mut self, col_in: usize, col_out: usize) {
        if col_in < self.num_col {
            for k in self.col_start[col_in]..self.col_start[col_in + 1] {
                let row = self.row_index[k];
                self.row_nonbasic_end[row] -= 1;
                let swap = self.row_nonbasic_end[row];
                let mut find = self.row_start[row];
                while self.row_col_index[find] != col_in {
                    find += 1;
                    debug_assert!(find <= swap);
                }
                self.row_col_index.swap(find, swap);
                self.row_value.swap(find, swap);
            }
        }

        if col_out < self.num_col {
            for k in self.col_start[col_out]..self.col_start[col_out + 1] {
                let row = self.row_index[k];
                let swap = self.row_nonbasic_end[row];
                self.row_nonbasic_end[row] += 1;
                let mut find = swap;
                while self.row_col_index[find] != col_out {
                    find += 1;
                    debug_assert!(find < self.row_start[row + 1]);
                }
                self.row_col_index.swap(find, swap);
                self.row_value.swap(find, swap);
            }
        }
    }

    /// Inner product of `vector`'s dense values with a column. A logical
    /// column is a unit vector, so the product is the matching component.
    pub fn column_dot(&self, vector: &WorkVec, col: usize) -> f64 {
        debug_assert_eq!(vector.size(), self.num_row);
        if col < self.num_col {
            let mut result = 0.0;
            for k in self.col_start[col]..self.col_start[col + 1] {
                result += vector.array[self.row_index[k]] * self.value[k];
            }
            result
        } else {
            vector.array[col - self.num_col]
        }
    }

    /// Add `multiplier` times a column into the accumulator, registering
    /// newly touched rows in its index.
    pub fn accumulate_column(&self, vector: &mut WorkVec, col: usize, multiplier: f64) {
        debug_assert_eq!(vector.size(), self.num_row);
        if col < self.num_col {
            for k in self.col_start[col]..self.col_start[col + 1] {
                let row = self.row_index[k];
                let x0 = vector.array[row];
                let x1 = x0 + multiplier * self.value[k];
                if x0 == 0.0 {
                    vector.index.push(row);
                }
                vector.array[row] = if x1.abs() < TINY { SOFT_ZERO } else { x1 };
            }
        } else {
            let row = col - self.num_col;
            let x0 = vector.array[row];
            let x1 = x0 + multiplier;
            if x0 == 0.0 {
                vector.index.push(row);
            }
            vector.array[row] = if x1.abs() < TINY { SOFT_ZERO } else { x1 };
        }
        vector.invalidate_pack();
    }

    /// Standard column-wise pricing: one dot product per structural column,
    /// recording those above tolerance. `result` must be clear on entry.
    pub fn price_by_col(&self, result: &mut WorkVec, direction: &WorkVec) {
        debug_assert_eq!(result.size(), self.num_col);
        debug_assert_eq!(direction.size(), self.num_row);
        debug_assert!(result.is_empty());
        result.index.clear();
        for col in 0..self.num_col {
            let mut value = 0.0;
            for k in self.col_start[col]..self.col_start[col + 1] {
                value += direction.array[self.row_index[k]] * self.value[k];
            }
            if value.abs() > TINY {
                result.array[col] = value;
                result.index.push(col);
            }
        }
        result.invalidate_pack();
    }

    /// Vanilla hyper-sparse row-wise pricing: the adaptive kernel configured
    /// so the indexed phase always runs to completion.
    pub fn price_by_row(&self, result: &mut WorkVec, direction: &WorkVec) {
        debug_assert!(result.is_empty());
        self.price_by_row_adaptive(result, direction, &PriceControl::hyper());
    }

    /// Adaptive row-wise pricing over the nonbasic zones of the rows listed
    /// in `direction`. Runs as a one-way state machine: the hyper-sparse
    /// phase maintains `result`'s index row by row until the projected
    /// fill-in or the partial density trips the switch, after which the
    /// remaining rows are folded in densely and the index is recovered by a
    /// single full scan. May be called with `ctrl.start > 0` to resume a
    /// partially priced result.
    pub fn price_by_row_adaptive(
        &self,
        result: &mut WorkVec,
        direction: &WorkVec,
        ctrl: &PriceControl,
    ) {
        debug_assert_eq!(result.size(), self.num_col);
        debug_assert_eq!(direction.size(), self.num_row);
        let direction_count = direction.index.len();

        let mut phase = if ctrl.historical_density > ctrl.hyper_density {
            PricePhase::Dense(ctrl.start)
        } else {
            PricePhase::Hyper(ctrl.start)
        };
        loop {
            phase = match phase {
                PricePhase::Hyper(at) if at >= direction_count => {
                    self.remove_cancellation(result);
                    PricePhase::Done
                }
                PricePhase::Hyper(at) => {
                    let row = direction.index[at];
                    let row_nnz = self.row_nonbasic_end[row] - self.row_start[row];
                    if should_drop_index(result.count(), row_nnz, self.num_col, ctrl.switch_density)
                    {
                        debug!(
                            "price: dropping index maintenance at entry {}, {} of {} columns filled",
                            at,
                            result.count(),
                            self.num_col
                        );
                        PricePhase::Dense(at)
                    } else {
                        let multiplier = direction.array[row];
                        for k in self.row_start[row]..self.row_nonbasic_end[row] {
                            let col = self.row_col_index[k];
                            let x0 = result.array[col];
                            let x1 = x0 + multiplier * self.row_value[k];
                            if x0 == 0.0 {
                                result.index.push(col);
                            }
                            result.array[col] = if x1.abs() < TINY { SOFT_ZERO } else { x1 };
                        }
                        PricePhase::Hyper(at + 1)
                    }
                }
                PricePhase::Dense(at) => {
                    self.price_by_row_no_index(result, direction, at);
                    PricePhase::Done
                }
                PricePhase::Done => break,
            };
        }
        result.invalidate_pack();
    }

    /// Continue row-wise pricing from position `from` in `direction`'s
    /// nonzero list without maintaining `result`'s index, then rebuild the
    /// index with one scan over all columns.
    pub fn price_by_row_no_index(&self, result: &mut WorkVec, direction: &WorkVec, from: usize) {
        debug_assert_eq!(result.size(), self.num_col);
        let dense = result.dense_mut();
        for at in from..direction.index.len() {
            let row = direction.index[at];
            let multiplier = direction.array[row];
            for k in self.row_start[row]..self.row_nonbasic_end[row] {
                let col = self.row_col_index[k];
                let x1 = dense[col] + multiplier * self.row_value[k];
                dense[col] = if x1.abs() < TINY { SOFT_ZERO } else { x1 };
            }
        }
        result.rebuild_index();
    }

    /// Drop result entries that cancelled to within tolerance during
    /// row-wise pricing.
    pub fn remove_cancellation(&self, result: &mut WorkVec) {
        let mut total = 0;
        for at in 0..result.index.len() {
            let col = result.index[at];
            if result.array[col].abs() > TINY {
                result.index[total] = col;
                total += 1;
            } else {
                result.array[col] = 0.0;
            }
        }
        result.index.truncate(total);
        result.invalidate_pack();
    }

    /// Diagnostic: verify that both zones of every row agree with the given
    /// nonbasic flags.
    pub fn partition_consistent(&self, nonbasic: &[bool]) -> bool {
        for row in 0..self.num_row {
            for k in self.row_start[row]..self.row_nonbasic_end[row] {
                let col = self.row_col_index[k];
                if !nonbasic[col] {
                    debug!(
                        "row mirror error: col {} at entry {} of row {} is basic",
                        col, k, row
                    );
                    return false;
                }
            }
            for k in self.row_nonbasic_end[row]..self.row_start[row + 1] {
                let col = self.row_col_index[k];
                if nonbasic[col] {
                    debug!(
                        "row mirror error: col {} at entry {} of row {} is nonbasic",
                        col, k, row
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Diagnostic self-check of a row-wise pricing result against an
    /// independent column-wise recomputation. Returns true when an
    /// inconsistency is detected. Meaningful when every priced column sits in
    /// the nonbasic zone, the state in which row-wise and column-wise pricing
    /// compute the same product.
    pub fn price_check(&self, result: &WorkVec, direction: &WorkVec) -> bool {
        debug_assert_eq!(result.size(), self.num_col);
        let mut reference = WorkVec::new(self.num_col);
        self.price_by_col(&mut reference, direction);

        let mut small_mismatch = 0usize;
        let mut diff_norm2 = 0.0;
        let mut reference_norm2 = 0.0;
        for col in 0..self.num_col {
            let price_v = result.array[col];
            let check_v = reference.array[col];
            if (price_v.abs() > TINY && check_v.abs() <= TINY)
                || (check_v.abs() > TINY && price_v.abs() <= TINY)
            {
                let worst = price_v.abs().max(check_v.abs());
                if worst > PRICE_CHECK_TOL {
                    small_mismatch += 1;
                    debug!(
                        "price check: col {} significant in one result only, {:.4e} vs {:.4e}",
                        col, price_v, check_v
                    );
                }
            }
            let delta = price_v - check_v;
            diff_norm2 += delta * delta;
            reference_norm2 += check_v * check_v;
        }

        // Mass of the reference at positions the checked result never
        // claimed: entries the row-wise computation wrongly omitted.
        for &col in &result.index {
            reference.array[col] = 0.0;
        }
        let mut missed_norm2 = 0.0;
        for col in 0..self.num_col {
            let value = reference.array[col];
            missed_norm2 += value * value;
        }

        let error = small_mismatch > 0
            || diff_norm2.sqrt() > PRICE_CHECK_TOL
            || missed_norm2.sqrt() > PRICE_CHECK_NORM_TOL * reference_norm2.sqrt();
        if error {
            debug!(
                "price check failed: {} mismatches, ||dl|| = {:.4e}, ||missed|| = {:.4e}",
                small_mismatch,
                diff_norm2.sqrt(),
                missed_norm2.sqrt()
            );
        }
        error
    }
}

fn csc_parts(mat: &CsMat) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
    assert!(mat.is_csc());
    let mut col_start = Vec::with_capacity(mat.cols() + 1);
    col_start.push(0);
    let mut row_index = Vec::with_capacity(mat.nnz());
    let mut value = Vec::with_capacity(mat.nnz());
    for col in 0..mat.cols() {
        let (rows, values) = mat.outer_view(col).unwrap().into_raw_storage();
        row_index.extend_from_slice(rows);
        value.extend_from_slice(values);
        col_start.push(row_index.len());
    }
    (col_start, row_index, value)
}
