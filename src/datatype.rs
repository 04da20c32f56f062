/// Compressed sparse matrix used for interchange with the problem-loading
/// and basis-factorization layers.
pub type CsMat = sprs::CsMat<f64>;
