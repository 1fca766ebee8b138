//! Low-level kernels behind the similarity metric.
//!
//! Exposed for benchmarks and for checking the SIMD path against the scalar
//! reference. Most users should call [`crate::similarity`] instead.

pub use crate::similarity::scalar::dot_and_norms as dot_and_norms_scalar;
#[cfg(feature = "simd")]
pub use crate::similarity::simd::dot_and_norms as dot_and_norms_simd;
pub use crate::tracking::neighbor_regions;
pub use crate::value::assemble_reading;
