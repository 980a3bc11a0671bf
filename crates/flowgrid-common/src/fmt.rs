//! Fixed-width numeric formatting for the plain-text grid formats.
//!
//! The files this workspace exchanges data with are written by Fortran
//! programs, which print scientific notation with a signed two-digit
//! exponent ("1.50000000e+03"). Rust's `{:e}` renders the same value as
//! "1.5e3", so the writers go through these helpers.

/// Format `value` in scientific notation with `precision` fractional
/// digits and a signed exponent of at least two digits.
pub fn sci(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    let raw = format!("{:.*e}", precision, value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(rest) => ('-', rest),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => raw,
    }
}

/// Like [`sci`], right-aligned to `width`.
pub fn sci_pad(value: f64, width: usize, precision: usize) -> String {
    format!("{:>width$}", sci(value, precision))
}

/// Format a value that is conventionally integral, such as a nodata
/// marker, without a fractional part when possible.
pub fn compact(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        sci(value, 15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sci_exponent_form() {
        assert_eq!(sci(1.5, 8), "1.50000000e+00");
        assert_eq!(sci(-0.001, 8), "-1.00000000e-03");
        assert_eq!(sci(0.0, 8), "0.00000000e+00");
        assert_eq!(sci(1.0e123, 2), "1.00e+123");
    }

    #[test]
    fn test_sci_pad_width() {
        let s = sci_pad(2.5, 18, 8);
        assert_eq!(s.len(), 18);
        assert!(s.ends_with("2.50000000e+00"));
    }

    #[test]
    fn test_sci_round_trips() {
        for &v in &[0.0, 1.0, -12.75, 3.0e-9, 9.87654321e20] {
            let parsed: f64 = sci(v, 15).parse().unwrap();
            assert!((parsed - v).abs() <= v.abs() * 1e-14);
        }
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact(-9999.0), "-9999");
        assert_eq!(compact(0.0), "0");
        assert_eq!(compact(1.5), "1.500000000000000e+00");
    }
}
