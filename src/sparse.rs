use crate::consts::{DENSE_CLEAR_RATIO, SOFT_ZERO, TINY};

/// Reusable sparse work vector over a fixed index universe. Carries pricing
/// directions and results between the basis-solve layer, the constraint
/// matrix kernels and the pivot-selection logic.
///
/// Entries listed in `index` own the corresponding dense slots; every other
/// slot reads as zero, though stale exact zeros may linger until a
/// compaction pass.
#[derive(Clone, Debug)]
pub struct WorkVec {
    size: usize,
    pub(crate) index: Vec<usize>,
    pub(crate) array: Vec<f64>,
    /// False marks the dense/defensive regime: the index list is meaningless
    /// and only a full clear or an index rebuild restores it.
    indexed: bool,

    pack_index: Vec<usize>,
    pack_value: Vec<f64>,
    pack_dirty: bool,

    /// Abstract operation-cost accumulator maintained by the owning
    /// algorithm; reset on `clear`, duplicated on `copy_from`.
    pub synthetic_tick: f64,
}

impl WorkVec {
    pub fn new(size: usize) -> WorkVec {
        WorkVec {
            size,
            index: Vec::with_capacity(size),
            array: vec![0.0; size],
            indexed: true,
            pack_index: Vec::with_capacity(size),
            pack_value: Vec::with_capacity(size),
            pack_dirty: false,
            synthetic_tick: 0.0,
        }
    }

    /// Reallocate for a new universe and clear. Used when a work vector
    /// changes role between solves.
    pub fn clear_and_resize(&mut self, size: usize) {
        self.size = size;
        self.array.clear();
        self.array.resize(size, 0.0);
        self.index.clear();
        self.index.reserve(size);
        self.pack_index.clear();
        self.pack_index.reserve(size);
        self.pack_value.clear();
        self.pack_value.reserve(size);
        self.indexed = true;
        self.pack_dirty = true;
        self.synthetic_tick = 0.0;
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Reset to the empty vector, keeping allocated capacity. When the index
    /// list is unusable or the vector has become effectively dense, wipe the
    /// whole array; otherwise zero only the listed positions.
    pub fn clear(&mut self) {
        let in_dense = !self.indexed || self.index.len() as f64 > self.size as f64 * DENSE_CLEAR_RATIO;
        if in_dense {
            for value in self.array.iter_mut() {
                *value = 0.0;
            }
        } else {
            for &i in &self.index {
                self.array[i] = 0.0;
            }
        }
        self.index.clear();
        self.indexed = true;
        self.pack_dirty = true;
        self.synthetic_tick = 0.0;
    }

    /// Compact the index list in place, dropping entries whose magnitude is
    /// at or below the shared tolerance and zeroing their dense slots.
    /// Idempotent.
    pub fn tight(&mut self) {
        debug_assert!(self.indexed);
        let mut total = 0;
        for at in 0..self.index.len() {
            let i = self.index[at];
            if self.array[i].abs() > TINY {
                self.index[total] = i;
                total += 1;
            } else {
                self.array[i] = 0.0;
            }
        }
        self.index.truncate(total);
        self.pack_dirty = true;
    }

    /// Rebuild the packed view if any mutation happened since it was last
    /// built.
    pub fn pack(&mut self) {
        debug_assert!(self.indexed);
        if self.pack_dirty {
            self.pack_index.clear();
            self.pack_value.clear();
            for &i in &self.index {
                self.pack_index.push(i);
                self.pack_value.push(self.array[i]);
            }
            self.pack_dirty = false;
        }
    }

    /// Packed `(index, value)` view for bulk transfer, rebuilt on demand so a
    /// stale view can never be observed.
    pub fn packed(&mut self) -> (&[usize], &[f64]) {
        self.pack();
        (&self.pack_index, &self.pack_value)
    }

    pub fn copy_from(&mut self, source: &WorkVec) {
        assert_eq!(self.size, source.size);
        debug_assert!(source.indexed);
        self.clear();
        self.synthetic_tick = source.synthetic_tick;
        for &i in &source.index {
            self.index.push(i);
            self.array[i] = source.array[i];
        }
    }

    /// Squared 2-norm over the listed entries.
    pub fn norm2(&self) -> f64 {
        debug_assert!(self.indexed);
        let mut result = 0.0;
        for &i in &self.index {
            let value = self.array[i];
            result += value * value;
        }
        result
    }

    /// Add `scalar` times `pivot` into this vector, registering newly touched
    /// positions but not removing cancelled ones; callers that need exact
    /// sparsity run `tight()` afterwards.
    pub fn saxpy(&mut self, scalar: f64, pivot: &WorkVec) {
        debug_assert_eq!(self.size, pivot.size);
        debug_assert!(pivot.indexed);
        for &i in &pivot.index {
            let x0 = self.array[i];
            let x1 = x0 + scalar * pivot.array[i];
            if x0 == 0.0 {
                self.index.push(i);
            }
            self.array[i] = if x1.abs() < TINY { SOFT_ZERO } else { x1 };
        }
        self.pack_dirty = true;
    }

    /// Clear, then fill from `(position, value)` pairs, skipping exact zeros.
    pub fn set(&mut self, entries: impl IntoIterator<Item = (usize, f64)>) {
        self.clear();
        for (i, value) in entries {
            if value == 0.0 {
                continue;
            }
            debug_assert!(self.array[i] == 0.0, "duplicate position {}", i);
            self.index.push(i);
            self.array[i] = value;
        }
    }

    pub fn get(&self, i: usize) -> f64 {
        self.array[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        debug_assert!(self.indexed);
        self.index.iter().map(move |&i| (i, self.array[i]))
    }

    /// Mutable access to the dense array for producers that scatter a result
    /// without tracking positions (e.g. a basis solve). Drops to the
    /// unindexed regime; call [`rebuild_index`](Self::rebuild_index) when the
    /// values are final.
    pub fn dense_mut(&mut self) -> &mut [f64] {
        self.indexed = false;
        self.pack_dirty = true;
        &mut self.array
    }

    /// One full scan recovering the index list from the dense values:
    /// positions above the tolerance are listed, the rest are snapped to
    /// exact zero. Restores the indexed regime.
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for i in 0..self.size {
            if self.array[i].abs() < TINY {
                self.array[i] = 0.0;
            } else {
                self.index.push(i);
            }
        }
        self.indexed = true;
        self.pack_dirty = true;
    }

    pub(crate) fn invalidate_pack(&mut self) {
        self.pack_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_test() {
        let mut vec = WorkVec::new(10);
        vec.set([(1, 2.0), (4, -1.5)]);
        assert_eq!(vec.count(), 2);

        vec.clear();
        assert_eq!(vec.count(), 0);
        assert!(vec.is_empty());
        assert!((0..10).all(|i| vec.get(i) == 0.0));

        // Idempotent.
        vec.clear();
        assert_eq!(vec.count(), 0);
        assert!((0..10).all(|i| vec.get(i) == 0.0));
    }

    #[test]
    fn clear_dense_regime_test() {
        // More than 30% of the universe listed: the full-array wipe path.
        let mut vec = WorkVec::new(10);
        vec.set([(0, 1.0), (3, 2.0), (5, 3.0), (7, 4.0)]);
        vec.clear();
        assert_eq!(vec.count(), 0);
        assert!((0..10).all(|i| vec.get(i) == 0.0));
    }

    #[test]
    fn clear_unindexed_test() {
        let mut vec = WorkVec::new(6);
        {
            let dense = vec.dense_mut();
            dense[2] = 7.0;
            dense[5] = -3.0;
        }
        assert!(!vec.is_indexed());

        vec.clear();
        assert!(vec.is_indexed());
        assert!((0..6).all(|i| vec.get(i) == 0.0));
    }

    #[test]
    fn rebuild_index_test() {
        let mut vec = WorkVec::new(6);
        {
            let dense = vec.dense_mut();
            dense[0] = 1.0;
            dense[3] = 1e-20;
            dense[4] = -2.0;
        }
        vec.rebuild_index();
        assert!(vec.is_indexed());
        assert_eq!(vec.iter().collect::<Vec<_>>(), vec![(0, 1.0), (4, -2.0)]);
        assert_eq!(vec.get(3), 0.0);
    }

    #[test]
    fn tight_test() {
        let mut vec = WorkVec::new(8);
        let mut pivot = WorkVec::new(8);
        pivot.set([(2, 1.0), (5, 3.0)]);
        vec.set([(0, 4.0)]);
        vec.saxpy(1.0, &pivot);
        vec.saxpy(-1.0, &pivot);
        assert_eq!(vec.count(), 3);

        // Cancelled entries are dropped and zeroed; live ones survive.
        vec.tight();
        assert_eq!(vec.iter().collect::<Vec<_>>(), vec![(0, 4.0)]);
        assert_eq!(vec.get(2), 0.0);
        assert_eq!(vec.get(5), 0.0);

        // Idempotent.
        vec.tight();
        assert_eq!(vec.iter().collect::<Vec<_>>(), vec![(0, 4.0)]);
    }

    #[test]
    fn saxpy_test() {
        let mut vec = WorkVec::new(5);
        let mut pivot = WorkVec::new(5);
        pivot.set([(0, 2.0), (3, -1.0)]);

        vec.saxpy(3.0, &pivot);
        assert_eq!(vec.count(), 2);
        assert_eq!(vec.get(0), 6.0);
        assert_eq!(vec.get(3), -3.0);

        // Accumulating into existing positions must not relist them.
        vec.saxpy(1.0, &pivot);
        assert_eq!(vec.count(), 2);
        assert_eq!(vec.get(0), 8.0);
        assert_eq!(vec.get(3), -4.0);
    }

    #[test]
    fn saxpy_cancellation_test() {
        let mut vec = WorkVec::new(4);
        let mut pivot = WorkVec::new(4);
        pivot.set([(1, 2.0), (3, 1.0)]);

        vec.saxpy(1.0, &pivot);
        vec.saxpy(-1.0, &pivot);

        // Cancelled positions stay listed but read as zero within tolerance.
        assert_eq!(vec.count(), 2);
        for (_, value) in vec.iter() {
            assert!(value.abs() <= TINY);
        }

        // Touching a cancelled slot again must not duplicate its index entry.
        vec.saxpy(1.0, &pivot);
        assert_eq!(vec.count(), 2);
        assert_eq!(vec.get(1), 2.0);
        assert_eq!(vec.get(3), 1.0);

        vec.saxpy(-1.0, &pivot);
        vec.tight();
        assert_eq!(vec.count(), 0);
        assert!((0..4).all(|i| vec.get(i) == 0.0));
    }

    #[test]
    fn pack_test() {
        let mut vec = WorkVec::new(6);
        vec.set([(4, 1.0), (1, -2.0)]);

        let (index, value) = vec.packed();
        assert_eq!(index, [4, 1]);
        assert_eq!(value, [1.0, -2.0]);

        // A mutation invalidates the packed view; the next read rebuilds it.
        let mut pivot = WorkVec::new(6);
        pivot.set([(2, 5.0)]);
        vec.saxpy(1.0, &pivot);
        let (index, value) = vec.packed();
        assert_eq!(index, [4, 1, 2]);
        assert_eq!(value, [1.0, -2.0, 5.0]);

        // Repacking without mutation is stable.
        vec.pack();
        let (index, _) = vec.packed();
        assert_eq!(index, [4, 1, 2]);
    }

    #[test]
    fn copy_from_test() {
        let mut source = WorkVec::new(7);
        source.set([(0, 1.0), (6, -4.0)]);
        source.synthetic_tick = 12.5;

        let mut vec = WorkVec::new(7);
        vec.set([(3, 9.0)]);
        vec.copy_from(&source);

        assert_eq!(vec.count(), 2);
        assert_eq!(vec.get(0), 1.0);
        assert_eq!(vec.get(3), 0.0);
        assert_eq!(vec.get(6), -4.0);
        assert_eq!(vec.synthetic_tick, 12.5);
    }

    #[test]
    fn norm2_test() {
        let mut vec = WorkVec::new(5);
        vec.set([(0, 3.0), (2, 4.0)]);
        assert_eq!(vec.norm2(), 25.0);
        assert_eq!(WorkVec::new(5).norm2(), 0.0);
    }

    #[test]
    fn clear_and_resize_test() {
        let mut vec = WorkVec::new(3);
        vec.set([(1, 2.0)]);
        vec.clear_and_resize(8);
        assert_eq!(vec.size(), 8);
        assert_eq!(vec.count(), 0);
        assert!((0..8).all(|i| vec.get(i) == 0.0));

        vec.set([(7, 1.0)]);
        assert_eq!(vec.count(), 1);
    }

    #[test]
    fn set_skips_zeros_test() {
        let mut vec = WorkVec::new(4);
        vec.set([(0, 0.0), (2, 5.0)]);
        assert_eq!(vec.count(), 1);
        assert_eq!(vec.iter().collect::<Vec<_>>(), vec![(2, 5.0)]);
    }
}
