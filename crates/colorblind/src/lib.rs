//! Colour vision deficiency simulation
//!
//! Frames are converted to linear RGB, projected into LMS cone space, reduced
//! to the two cone responses a dichromat retains and converted back. The
//! resulting images are only used as alternative luminance sources for the
//! contrast check; text geometry is always taken from the original frame.
//!
//! Tritanopia uses two projection planes. Each pixel is projected onto the
//! plane on its side of the neutral axis, selected by comparing its M/L cone
//! ratio with the ratio of white.

use fonttik_common::srgb::{to_gamma, to_linear};
use fonttik_common::{ColorblindParams, ColorblindType, Matrix3, ProcessingError, Result};
use image::{imageops, RgbImage};
use ndarray::{Array2, Zip};
use tracing::debug;

/// Determinants smaller than this make a colour matrix unusable
const SINGULAR_EPSILON: f64 = 1e-12;

/// Simulates how a frame looks with each supported vision deficiency
#[derive(Debug, Clone)]
pub struct ColorblindFilter {
    rgb_to_lms: Array2<f64>,
    lms_to_rgb: Array2<f64>,
    protanopia: Array2<f64>,
    deuteranopia: Array2<f64>,
    tritanopia_high: Array2<f64>,
    tritanopia_low: Array2<f64>,
    neutral_ratio: f64,
}

impl ColorblindFilter {
    /// Build a filter from the configured matrices.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the RGB→LMS matrix is not invertible
    /// or maps white to a zero L response.
    pub fn new(params: &ColorblindParams) -> Result<Self> {
        let rgb_to_lms = to_array(&params.rgb_to_lms);
        let lms_to_rgb = invert(&params.rgb_to_lms).ok_or_else(|| {
            ProcessingError::InvalidConfiguration("RGB to LMS matrix is singular".to_string())
        })?;

        let white = rgb_to_lms.dot(&ndarray::arr1(&[1.0, 1.0, 1.0]));
        if white[0].abs() < SINGULAR_EPSILON {
            return Err(ProcessingError::InvalidConfiguration(
                "RGB to LMS matrix maps white to zero L response".to_string(),
            ));
        }
        let neutral_ratio = white[1] / white[0];
        debug!("Colorblind filter ready (neutral M/L ratio {:.5})", neutral_ratio);

        Ok(Self {
            rgb_to_lms,
            lms_to_rgb,
            protanopia: to_array(&params.protanopia),
            deuteranopia: to_array(&params.deuteranopia),
            tritanopia_high: to_array(&params.tritanopia_high),
            tritanopia_low: to_array(&params.tritanopia_low),
            neutral_ratio,
        })
    }

    /// M/L cone ratio of white, separating the two tritanopia planes
    #[must_use]
    pub fn neutral_ratio(&self) -> f64 {
        self.neutral_ratio
    }

    /// Simulate one vision type over the whole image
    #[must_use]
    pub fn simulate(&self, image: &RgbImage, kind: ColorblindType) -> RgbImage {
        let projection = match kind {
            ColorblindType::Grayscale => {
                let gray = imageops::grayscale(image);
                return RgbImage::from_fn(image.width(), image.height(), |x, y| {
                    let level = gray.get_pixel(x, y).0[0];
                    image::Rgb([level, level, level])
                });
            }
            ColorblindType::Protanopia => &self.protanopia,
            ColorblindType::Deuteranopia => &self.deuteranopia,
            ColorblindType::Tritanopia => {
                return self.simulate_tritanopia(image);
            }
        };

        // Rows are pixels, so every matrix is applied transposed
        let lms = linear_pixels(image).dot(&self.rgb_to_lms.t());
        let simulated = lms.dot(&projection.t());
        encode(&simulated.dot(&self.lms_to_rgb.t()), image.width(), image.height())
    }

    fn simulate_tritanopia(&self, image: &RgbImage) -> RgbImage {
        let lms = linear_pixels(image).dot(&self.rgb_to_lms.t());
        let mut simulated = lms.dot(&self.tritanopia_high.t());
        let low = lms.dot(&self.tritanopia_low.t());

        let neutral = self.neutral_ratio;
        Zip::from(simulated.rows_mut())
            .and(low.rows())
            .and(lms.rows())
            .for_each(|mut out, low, cones| {
                // M/L < neutral, without dividing by a zero L response
                if cones[1] < neutral * cones[0] {
                    out.assign(&low);
                }
            });

        encode(&simulated.dot(&self.lms_to_rgb.t()), image.width(), image.height())
    }

    /// Simulate every supported vision type
    #[must_use]
    pub fn simulate_all(&self, image: &RgbImage) -> Vec<(ColorblindType, RgbImage)> {
        ColorblindType::ALL
            .iter()
            .map(|&kind| (kind, self.simulate(image, kind)))
            .collect()
    }
}

fn to_array(matrix: &Matrix3) -> Array2<f64> {
    Array2::from_shape_fn((3, 3), |(row, col)| matrix[row][col])
}

/// Inverse of a 3x3 matrix via the adjugate
fn invert(m: &Matrix3) -> Option<Array2<f64>> {
    let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
    };
    let det = m[0][0] * cofactor(1, 2, 1, 2) - m[0][1] * cofactor(1, 2, 0, 2)
        + m[0][2] * cofactor(1, 2, 0, 1);
    if det.abs() < SINGULAR_EPSILON {
        return None;
    }

    let adjugate = [
        [
            cofactor(1, 2, 1, 2),
            -cofactor(0, 2, 1, 2),
            cofactor(0, 1, 1, 2),
        ],
        [
            -cofactor(1, 2, 0, 2),
            cofactor(0, 2, 0, 2),
            -cofactor(0, 1, 0, 2),
        ],
        [
            cofactor(1, 2, 0, 1),
            -cofactor(0, 2, 0, 1),
            cofactor(0, 1, 0, 1),
        ],
    ];
    Some(Array2::from_shape_fn((3, 3), |(row, col)| {
        adjugate[row][col] / det
    }))
}

/// Linear RGB of every pixel as an N x 3 array
fn linear_pixels(image: &RgbImage) -> Array2<f64> {
    let mut pixels = Array2::zeros(((image.width() * image.height()) as usize, 3));
    for (mut row, pixel) in pixels.rows_mut().into_iter().zip(image.pixels()) {
        for (channel, &level) in pixel.0.iter().enumerate() {
            row[channel] = f64::from(to_linear(level));
        }
    }
    pixels
}

/// Shift out-of-gamut pixels back into range and gamma encode
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode(linear: &Array2<f64>, width: u32, height: u32) -> RgbImage {
    let mut out = RgbImage::new(width, height);
    for (pixel, row) in out.pixels_mut().zip(linear.rows()) {
        let lowest = row.iter().copied().fold(0.0f64, f64::min);
        for (channel, &value) in row.iter().enumerate() {
            let shifted = (value - lowest) as f32;
            pixel.0[channel] = (to_gamma(shifted) * 255.0).round() as u8;
        }
    }
    out
}
