//! Sparse linear-algebra core for a revised simplex solver: the constraint
//! matrix in a dual column-wise / basis-partitioned row-wise representation,
//! reusable sparse work vectors, and hyper-sparse/dense adaptive pricing
//! kernels.

pub mod consts;
pub mod datatype;
pub mod helpers;
pub mod instrument;
pub mod matrix;
pub mod sparse;
