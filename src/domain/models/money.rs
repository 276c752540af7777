use serde::Serializer;

/// Converts a major-unit amount (dollars) to minor units (cents), rounding to the nearest cent.
pub fn to_minor_units(major: f64) -> i64 {
    (major * 100.0).round() as i64
}

/// Like [`to_minor_units`], but `None` when the amount is not finite or the cents
/// would not fit in an `i64` (the plain cast saturates).
pub fn checked_minor_units(major: f64) -> Option<i64> {
    let minor = (major * 100.0).round();
    (minor.is_finite() && minor >= i64::MIN as f64 && minor < i64::MAX as f64).then_some(minor as i64)
}

pub fn to_major_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

pub fn serialize_major<S: Serializer>(minor: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(to_major_units(*minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_round_instead_of_truncate() {
        // 19.99 * 100 = 1998.9999999999998 in f64
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(0.295), 30);
        assert_eq!(to_minor_units(30.0), 3000);
        assert_eq!(to_minor_units(-10.0), -1000);
    }

    #[test]
    fn test_checked_minor_units_rejects_out_of_range() {
        assert_eq!(checked_minor_units(19.99), Some(1999));
        assert_eq!(checked_minor_units(1e17), None);
        assert_eq!(checked_minor_units(-1e17), None);
        assert_eq!(checked_minor_units(f64::NAN), None);
        assert_eq!(checked_minor_units(f64::INFINITY), None);
    }

    #[test]
    fn test_major_units() {
        assert_eq!(to_major_units(2000), 20.0);
        assert_eq!(to_major_units(1999), 19.99);
        assert_eq!(to_major_units(-1000), -10.0);
    }
}
