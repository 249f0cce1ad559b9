//! sRGB transfer functions and relative luminance

use once_cell::sync::Lazy;

/// sRGB (gamma encoded, 8-bit) to linear light, one entry per level
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
static SRGB_TO_LINEAR: Lazy<[f32; 256]> = Lazy::new(|| {
    let mut table = [0.0f32; 256];
    for (level, value) in table.iter_mut().enumerate() {
        let c = level as f64 / 255.0;
        let linear = if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
        *value = linear as f32;
    }
    table
});

/// Linear value of an 8-bit sRGB channel
#[inline]
#[must_use]
pub fn to_linear(level: u8) -> f32 {
    SRGB_TO_LINEAR[level as usize]
}

/// Encode a linear value in [0, 1] with the sRGB gamma curve
#[inline]
#[must_use]
pub fn to_gamma(linear: f32) -> f32 {
    let c = linear.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Relative luminance (WCAG) of an 8-bit sRGB pixel.
///
/// Computed in single precision; the weights are applied as integers over
/// 10000 so that pure white maps to exactly 1.0.
#[inline]
#[must_use]
pub fn relative_luminance(rgb: [u8; 3]) -> f32 {
    let weighted =
        2126.0 * to_linear(rgb[0]) + 7152.0 * to_linear(rgb[1]) + 722.0 * to_linear(rgb[2]);
    (weighted / 10_000.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        assert_eq!(to_linear(0), 0.0);
        assert_eq!(to_linear(255), 1.0);
        assert_eq!(relative_luminance([255, 255, 255]), 1.0);
        assert_eq!(relative_luminance([0, 0, 0]), 0.0);
    }

    #[test]
    fn test_gamma_roundtrip_levels() {
        for level in [0u8, 1, 10, 64, 128, 200, 255] {
            let back = (to_gamma(to_linear(level)) * 255.0).round() as u8;
            assert_eq!(back, level);
        }
    }

    #[test]
    fn test_mid_gray_luminance() {
        let lum = relative_luminance([128, 128, 128]);
        assert!((lum - 0.2158).abs() < 1e-3);
    }
}
