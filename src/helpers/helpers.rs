use sprs::CsVecBase;
use std::ops::Deref;

use crate::datatype::CsMat;

/// Expand a sparse vector into a dense one, mostly for comparisons in tests.
pub fn to_dense<IStorage, DStorage>(vec: &CsVecBase<IStorage, DStorage, f64>) -> Vec<f64>
where
    IStorage: Deref<Target = [usize]>,
    DStorage: Deref<Target = [f64]>,
{
    let mut dense = vec![0.0; vec.dim()];
    vec.scatter(&mut dense);
    dense
}

/// Build a column-compressed matrix from (row, col, value) triplets.
pub fn mat_from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> CsMat {
    let mut mat = sprs::TriMat::new((rows, cols));
    for &(r, c, value) in triplets {
        mat.add_triplet(r, c, value);
    }
    mat.to_csc()
}
