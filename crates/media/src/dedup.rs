use image::RgbImage;

/// Detects frames that barely differ from the last analysed one.
///
/// The difference is the mean absolute channel difference scaled to [0, 1].
#[derive(Debug, Clone)]
pub struct FrameDeduplicator {
    threshold: f64,
    reference: Option<RgbImage>,
}

impl FrameDeduplicator {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            reference: None,
        }
    }

    /// Mean absolute difference of two equally sized images in [0, 1]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn difference(a: &RgbImage, b: &RgbImage) -> f64 {
        if a.dimensions() != b.dimensions() {
            return 1.0;
        }
        let raw_a: &[u8] = a.as_raw();
        let raw_b: &[u8] = b.as_raw();
        if raw_a.is_empty() {
            return 0.0;
        }
        let total: u64 = raw_a
            .iter()
            .zip(raw_b)
            .map(|(x, y)| u64::from(x.abs_diff(*y)))
            .sum();
        total as f64 / (raw_a.len() as f64 * 255.0)
    }

    /// Whether `frame` duplicates the last kept frame. Frames that are not
    /// duplicates become the new reference.
    pub fn is_duplicate(&mut self, frame: &RgbImage) -> bool {
        if let Some(reference) = &self.reference {
            if Self::difference(reference, frame) < self.threshold {
                return true;
            }
        }
        self.reference = Some(frame.clone());
        false
    }
}
