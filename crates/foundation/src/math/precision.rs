//! Precision policies.
//!
//! Small and conservative: canonical float bits for hashing and cache keys.

/// Canonicalize a floating-point value for deterministic hashing.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Little-endian bytes of the canonical value; stable input for structural hashes.
#[inline]
pub fn canonical_f64_bytes(v: f64) -> [u8; 8] {
    canonical_f64(v).to_bits().to_le_bytes()
}
