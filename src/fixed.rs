//! 3.12 fixed-point conversion for GTE vertex data.

/// Fractional bits
pub const FRAC_BITS: u32 = 12;
/// 1.0 in fixed point
pub const ONE: i32 = 1 << FRAC_BITS;

/// Convert to 3.12 fixed point, clamped to the i16 range.
///
/// Values are scaled by 4096 and truncated toward zero; anything outside
/// [-8.0, 8.0) saturates instead of wrapping. NaN maps to 0.
#[inline]
pub fn to_fixed12(value: f32) -> i16 {
    let scaled = (value as f64 * ONE as f64).trunc();
    scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Convert a row-major 3×3 rotation matrix element by element.
pub fn matrix_to_fixed12(m: &[[f32; 3]; 3]) -> [[i16; 3]; 3] {
    m.map(|row| row.map(to_fixed12))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_values() {
        assert_eq!(to_fixed12(1.0), 4096);
        assert_eq!(to_fixed12(-1.0), -4096);
        assert_eq!(to_fixed12(0.5), 2048);
        assert_eq!(to_fixed12(0.0), 0);
    }

    #[test]
    fn test_clamps_instead_of_wrapping() {
        assert_eq!(to_fixed12(8.0), i16::MAX);
        assert_eq!(to_fixed12(1000.0), i16::MAX);
        assert_eq!(to_fixed12(-8.0), i16::MIN);
        assert_eq!(to_fixed12(-1e9), i16::MIN);
        assert_eq!(to_fixed12(f32::NAN), 0);
    }

    #[test]
    fn test_truncates_toward_zero() {
        assert_eq!(to_fixed12(1.0 / 8192.0), 0);
        assert_eq!(to_fixed12(-1.0 / 8192.0), 0);
        assert_eq!(to_fixed12(3.0 / 4096.0 + 1e-7), 3);
    }

    #[test]
    fn test_exact_fractions() {
        assert_eq!(to_fixed12(-2.25), -9216);
        assert_eq!(to_fixed12(7.75), 31744);
    }

    #[test]
    fn test_matrix_clamps_per_element() {
        let m = [[0.5, -9.0, 0.0], [0.0, 0.25, 0.0], [10.0, 0.0, -1.0]];
        assert_eq!(
            matrix_to_fixed12(&m),
            [[2048, i16::MIN, 0], [0, 1024, 0], [i16::MAX, 0, -4096]]
        );
    }

    #[test]
    fn test_identity_matrix() {
        let m = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(
            matrix_to_fixed12(&m),
            [[4096, 0, 0], [0, 4096, 0], [0, 0, 4096]]
        );
    }
}
