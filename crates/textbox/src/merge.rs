//! Overlap measurement, box merging and line grouping

use crate::TextBox;
use fonttik_common::{MergeThreshold, Rect, TextDetectionParams};
use tracing::debug;

/// Per-axis overlap of two rectangles.
///
/// Each component is the intersection extent on that axis divided by the
/// smaller of the two extents, so a contained rectangle scores `(1, 1)`.
/// Disjoint rectangles score `(0, 0)`.
#[must_use]
pub fn overlap_axis_percentage(a: &Rect, b: &Rect) -> (f64, f64) {
    let Some(intersection) = a.intersection(b) else {
        return (0.0, 0.0);
    };
    let x = f64::from(intersection.width) / f64::from(a.width.min(b.width));
    let y = f64::from(intersection.height) / f64::from(a.height.min(b.height));
    (x, y)
}

/// Merge overlapping boxes in place.
///
/// Pairs are compared in order; when box `j` overlaps box `i` by at least the
/// threshold on both axes it is folded into `i` and the scan over `j` starts
/// again from `i + 1`, since the grown box may now reach earlier candidates.
pub fn merge_boxes(boxes: &mut Vec<TextBox>, threshold: MergeThreshold) {
    let before = boxes.len();
    let mut i = 0;
    while i < boxes.len() {
        let mut j = i + 1;
        while j < boxes.len() {
            let (a, b) = (boxes[i].rect(), boxes[j].rect());
            let (x, y) = overlap_axis_percentage(&a, &b);
            if a.intersection(&b).is_some() && x >= threshold.x && y >= threshold.y {
                let absorbed = boxes.remove(j);
                boxes[i].merge_with(&absorbed);
                j = i + 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    if boxes.len() != before {
        debug!("Merged {} boxes into {}", before, boxes.len());
    }
}

/// Parameters of the greedy line sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGrouping {
    /// Maximum vertical centre distance as a fraction of the line height
    pub height_ratio: f64,
    /// Maximum gap in pixels between the line's right edge and the next word
    pub max_gap: i32,
    /// Words whose tops fall in the same bucket of this height sort as one row
    pub sort_tolerance: i32,
}

impl LineGrouping {
    #[must_use]
    pub fn from_params(params: &TextDetectionParams) -> Self {
        Self {
            height_ratio: params.line_height_ratio,
            max_gap: params.line_gap,
            sort_tolerance: params.line_sort_tolerance,
        }
    }
}

impl Default for LineGrouping {
    fn default() -> Self {
        Self::from_params(&TextDetectionParams::default())
    }
}

/// Group words into lines with a single left-to-right, top-to-bottom sweep
#[must_use]
pub fn group_lines(words: &[TextBox], grouping: LineGrouping) -> Vec<TextBox> {
    let tolerance = grouping.sort_tolerance.max(1);
    let mut sorted: Vec<Rect> = words.iter().map(TextBox::rect).collect();
    sorted.sort_by_key(|r| (r.y.div_euclid(tolerance), r.x));

    let mut lines = Vec::new();
    let mut open: Option<Rect> = None;
    for word in sorted {
        open = Some(match open {
            Some(line) if joins_line(&line, &word, grouping) => line.union(&word),
            Some(line) => {
                lines.push(TextBox::with_rect(line));
                word
            }
            None => word,
        });
    }
    if let Some(line) = open {
        lines.push(TextBox::with_rect(line));
    }
    lines
}

fn joins_line(line: &Rect, word: &Rect, grouping: LineGrouping) -> bool {
    let (_, line_center) = line.center();
    let (_, word_center) = word.center();
    let vertical = f64::from((word_center - line_center).abs());
    // Rows can interleave across sort buckets, so the gap is checked on both sides
    vertical <= grouping.height_ratio * f64::from(line.height)
        && word.x <= line.right() + grouping.max_gap
        && word.right() >= line.x - grouping.max_gap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(rects: &[Rect]) -> Vec<TextBox> {
        rects.iter().map(|r| TextBox::from_rect(*r, 1920, 1080)).collect()
    }

    #[test]
    fn test_overlap_basics() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(overlap_axis_percentage(&a, &a), (1.0, 1.0));
        assert_eq!(overlap_axis_percentage(&a, &Rect::new(2, 2, 4, 4)), (1.0, 1.0));
        assert_eq!(overlap_axis_percentage(&a, &Rect::new(50, 50, 4, 4)), (0.0, 0.0));
    }

    #[test]
    fn test_merge_threshold_scenario() {
        // Overlap is 0.7 horizontally, 0.1 vertically
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(30, 90, 100, 100);
        assert_eq!(overlap_axis_percentage(&a, &b), (0.7, 0.1));

        let mut merged = boxes(&[a, b]);
        merge_boxes(&mut merged, MergeThreshold { x: 0.2, y: 0.0 });
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rect(), Rect::new(0, 0, 130, 190));

        let mut kept = boxes(&[a, b]);
        merge_boxes(&mut kept, MergeThreshold { x: 0.5, y: 0.5 });
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_merge_chains_through_grown_box() {
        // c only overlaps the union of a and b
        let mut merged = boxes(&[
            Rect::new(0, 0, 20, 10),
            Rect::new(40, 0, 20, 10),
            Rect::new(15, 0, 30, 10),
        ]);
        merge_boxes(&mut merged, MergeThreshold { x: 0.1, y: 0.5 });
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rect(), Rect::new(0, 0, 60, 10));
    }

    #[test]
    fn test_touching_boxes_do_not_merge() {
        let mut merged = boxes(&[Rect::new(0, 0, 10, 10), Rect::new(10, 0, 10, 10)]);
        merge_boxes(&mut merged, MergeThreshold { x: 0.0, y: 0.0 });
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_group_lines() {
        let words = boxes(&[
            Rect::new(130, 102, 60, 30),
            Rect::new(10, 100, 100, 30),
            Rect::new(10, 200, 80, 30),
            // Same row as the first line but too far right
            Rect::new(400, 100, 50, 30),
        ]);
        let lines = group_lines(&words, LineGrouping::default());
        let rects: Vec<Rect> = lines.iter().map(TextBox::rect).collect();
        assert_eq!(
            rects,
            vec![
                Rect::new(10, 100, 180, 32),
                Rect::new(400, 100, 50, 30),
                Rect::new(10, 200, 80, 30),
            ]
        );
    }

    #[test]
    fn test_group_lines_keeps_distant_words_across_sort_buckets() {
        // Tops 7 and 8 fall in different buckets, so the right word sorts first
        let words = boxes(&[Rect::new(500, 7, 60, 30), Rect::new(10, 8, 60, 30)]);
        let lines = group_lines(&words, LineGrouping::default());
        let rects: Vec<Rect> = lines.iter().map(TextBox::rect).collect();
        assert_eq!(
            rects,
            vec![Rect::new(500, 7, 60, 30), Rect::new(10, 8, 60, 30)]
        );
    }

    #[test]
    fn test_group_lines_empty() {
        assert!(group_lines(&[], LineGrouping::default()).is_empty());
    }
}
