//! Numeric helpers shared by the tracker and the value models.

const RTOL: f32 = 1e-5;
const ATOL: f32 = 1e-8;

/// Returns true when `a` and `b` are equal within `|a - b| <= atol + rtol * |b|`.
pub(crate) fn allclose(a: f32, b: f32) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Formats a reading the way a human writes it: integral values keep one decimal.
pub(crate) fn format_reading(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::{allclose, format_reading};

    #[test]
    fn allclose_uses_relative_tolerance() {
        assert!(allclose(0.999_999, 1.0));
        assert!(!allclose(0.99, 1.0));
        assert!(allclose(0.0, 0.0));
    }

    #[test]
    fn format_reading_keeps_one_decimal_for_integers() {
        assert_eq!(format_reading(15.2), "15.2");
        assert_eq!(format_reading(17.0), "17.0");
        assert_eq!(format_reading(-3.25), "-3.25");
    }
}
