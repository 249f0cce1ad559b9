use fonttik_common::{Point, Rect};

/// Quadrilateral text region as reported by a detector.
///
/// Points run clockwise from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub points: [Point; 4],
    /// Detector confidence in [0, 1]
    pub score: f32,
}

impl Quad {
    #[must_use]
    pub const fn new(points: [Point; 4], score: f32) -> Self {
        Self { points, score }
    }

    /// Axis-aligned quad covering a rectangle
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_rect(rect: Rect, score: f32) -> Self {
        let (left, top) = (rect.x as f32, rect.y as f32);
        let (right, bottom) = (rect.right() as f32, rect.bottom() as f32);
        Self::new(
            [
                Point::new(left, top),
                Point::new(right, top),
                Point::new(right, bottom),
                Point::new(left, bottom),
            ],
            score,
        )
    }

    /// Angle of the first edge against the horizontal, in degrees (0-90)
    #[must_use]
    pub fn tilt_degrees(&self) -> f64 {
        let dx = f64::from(self.points[1].x - self.points[0].x);
        let dy = f64::from(self.points[1].y - self.points[0].y);
        let hypotenuse = dx.hypot(dy);
        if hypotenuse == 0.0 {
            return 0.0;
        }
        (dy.abs() / hypotenuse).asin().to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tilt() {
        let flat = Quad::from_rect(Rect::new(0, 0, 10, 5), 1.0);
        assert_eq!(flat.tilt_degrees(), 0.0);

        let diagonal = Quad::new(
            [
                Point::new(0.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(5.0, 15.0),
                Point::new(-5.0, 5.0),
            ],
            1.0,
        );
        assert!((diagonal.tilt_degrees() - 45.0).abs() < 1e-9);

        let degenerate = Quad::new([Point::new(3.0, 3.0); 4], 0.0);
        assert_eq!(degenerate.tilt_degrees(), 0.0);
    }
}
