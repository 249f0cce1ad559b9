//! Check verdicts: per textbox, per frame, and aggregated per media item

use crate::geometry::Rect;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Verdict of a single check.
///
/// Variants are declared from least to most severe so that `Ord` gives the
/// precedence used when merging verdicts: FAIL > WARNING > UNRECOGNIZED > PASS.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultType {
    #[default]
    Pass,
    Unrecognized,
    Warning,
    Fail,
}

impl ResultType {
    /// The more severe of two verdicts
    #[must_use]
    pub fn worst(self, other: ResultType) -> ResultType {
        self.max(other)
    }

    /// Only FAIL breaks compliance; warnings and unrecognized boxes do not
    #[must_use]
    pub const fn is_pass(self) -> bool {
        !matches!(self, ResultType::Fail)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ResultType::Pass => "PASS",
            ResultType::Unrecognized => "UNRECOGNIZED",
            ResultType::Warning => "WARNING",
            ResultType::Fail => "FAIL",
        }
    }
}

/// Simulated colour vision deficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorblindType {
    Protanopia,
    Deuteranopia,
    Tritanopia,
    Grayscale,
}

impl ColorblindType {
    pub const ALL: [ColorblindType; 4] = [
        ColorblindType::Protanopia,
        ColorblindType::Deuteranopia,
        ColorblindType::Tritanopia,
        ColorblindType::Grayscale,
    ];

    /// Key prefix used in the JSON output (`protanValue`, `protanType`, ...)
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            ColorblindType::Protanopia => "protan",
            ColorblindType::Deuteranopia => "deutan",
            ColorblindType::Tritanopia => "tritan",
            ColorblindType::Grayscale => "gray",
        }
    }
}

/// Contrast measured for one textbox under one simulated vision type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorblindResult {
    pub value: f64,
    pub result_type: ResultType,
}

/// Frame-level verdict for one simulated vision type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorblindVerdict {
    pub pass: bool,
    pub result_type: ResultType,
}

/// Verdict for one textbox
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBox {
    pub result_type: ResultType,
    pub rect: Rect,
    /// Measured metric: text height in pixels or contrast ratio
    pub value: f64,
    pub text: String,
    pub colorblind: BTreeMap<ColorblindType, ColorblindResult>,
}

impl ResultBox {
    #[must_use]
    pub fn new(result_type: ResultType, rect: Rect, value: f64) -> Self {
        Self {
            result_type,
            rect,
            value,
            text: String::new(),
            colorblind: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

impl Serialize for ResultBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7 + 2 * self.colorblind.len()))?;
        map.serialize_entry("type", &self.result_type)?;
        map.serialize_entry("x", &self.rect.x)?;
        map.serialize_entry("y", &self.rect.y)?;
        map.serialize_entry("width", &self.rect.width)?;
        map.serialize_entry("height", &self.rect.height)?;
        map.serialize_entry("value", &self.value)?;
        map.serialize_entry("text", &self.text)?;
        for (kind, result) in &self.colorblind {
            map.serialize_entry(&format!("{}Value", kind.prefix()), &result.value)?;
            map.serialize_entry(&format!("{}Type", kind.prefix()), &result.result_type)?;
        }
        map.end()
    }
}

/// Outcome of one check type (size or contrast) on one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResults {
    /// Frame index, `-1` when no text was evaluated
    pub frame: i64,
    pub timestamp: Option<f64>,
    pub overall_pass: bool,
    pub results: Vec<ResultBox>,
    pub colorblind: BTreeMap<ColorblindType, ColorblindVerdict>,
}

impl FrameResults {
    /// Frame index marking "no content evaluated"
    pub const NO_CONTENT: i64 = -1;

    /// Build a frame verdict from per-box results (kept in input order).
    ///
    /// The frame passes unless a box failed; colorblind verdicts take the worst
    /// type over every box that carries a value for that vision type.
    #[must_use]
    pub fn from_boxes(frame: i64, timestamp: Option<f64>, results: Vec<ResultBox>) -> Self {
        let overall_pass = results.iter().all(|r| r.result_type.is_pass());

        let mut colorblind: BTreeMap<ColorblindType, ColorblindVerdict> = BTreeMap::new();
        for result in &results {
            for (kind, cb) in &result.colorblind {
                let entry = colorblind.entry(*kind).or_insert(ColorblindVerdict {
                    pass: true,
                    result_type: ResultType::Pass,
                });
                entry.result_type = entry.result_type.worst(cb.result_type);
                entry.pass = entry.result_type.is_pass();
            }
        }

        Self {
            frame,
            timestamp,
            overall_pass,
            results,
            colorblind,
        }
    }

    /// Empty but valid verdict for a frame without any text
    #[must_use]
    pub fn no_content() -> Self {
        Self::from_boxes(Self::NO_CONTENT, None, Vec::new())
    }

    #[must_use]
    pub const fn is_no_content(&self) -> bool {
        self.frame == Self::NO_CONTENT
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameRecord<'a> {
    id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_stamp: Option<f64>,
    results: &'a [ResultBox],
}

impl Serialize for FrameResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FrameRecord {
            id: self.frame,
            time_stamp: self.timestamp,
            results: &self.results,
        }
        .serialize(serializer)
    }
}

/// Aggregated verdicts for every checked frame of one media item
#[derive(Debug, Clone)]
pub struct Results {
    contrast_results: Vec<FrameResults>,
    size_results: Vec<FrameResults>,
    empty_frames: Vec<i64>,
    overall_contrast_pass: bool,
    overall_size_pass: bool,
    sorted_contrast: bool,
    sorted_size: bool,
}

impl Default for Results {
    fn default() -> Self {
        Self {
            contrast_results: Vec::new(),
            size_results: Vec::new(),
            empty_frames: Vec::new(),
            overall_contrast_pass: true,
            overall_size_pass: true,
            sorted_contrast: true,
            sorted_size: true,
        }
    }
}

impl Results {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contrast_results(&mut self, results: FrameResults) {
        self.overall_contrast_pass &= results.overall_pass;
        if let Some(last) = self.contrast_results.last() {
            self.sorted_contrast &= last.frame <= results.frame;
        }
        self.contrast_results.push(results);
    }

    pub fn add_size_results(&mut self, results: FrameResults) {
        self.overall_size_pass &= results.overall_pass;
        if let Some(last) = self.size_results.last() {
            self.sorted_size &= last.frame <= results.frame;
        }
        self.size_results.push(results);
    }

    /// Record a frame that was analysed but held no text. It has no verdict
    /// boxes, but it ends the previous frame's verdict for rendering.
    pub fn add_empty_frame(&mut self, frame: i64) {
        let at = self.empty_frames.partition_point(|&f| f < frame);
        if self.empty_frames.get(at) != Some(&frame) {
            self.empty_frames.insert(at, frame);
        }
    }

    /// Analysed frames without text, ascending
    #[must_use]
    pub fn empty_frames(&self) -> &[i64] {
        &self.empty_frames
    }

    /// Contrast verdicts in ascending frame order
    pub fn contrast_results(&mut self) -> &[FrameResults] {
        if !self.sorted_contrast {
            self.contrast_results.sort_by_key(|r| r.frame);
            self.sorted_contrast = true;
        }
        &self.contrast_results
    }

    /// Size verdicts in ascending frame order
    pub fn size_results(&mut self) -> &[FrameResults] {
        if !self.sorted_size {
            self.size_results.sort_by_key(|r| r.frame);
            self.sorted_size = true;
        }
        &self.size_results
    }

    #[must_use]
    pub const fn overall_contrast_pass(&self) -> bool {
        self.overall_contrast_pass
    }

    #[must_use]
    pub const fn overall_size_pass(&self) -> bool {
        self.overall_size_pass
    }

    #[must_use]
    pub fn frames_checked(&self) -> usize {
        self.size_results.len().max(self.contrast_results.len())
    }

    #[must_use]
    pub const fn is_contrast_sorted(&self) -> bool {
        self.sorted_contrast
    }

    #[must_use]
    pub const fn is_size_sorted(&self) -> bool {
        self.sorted_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: i64, pass: bool) -> FrameResults {
        let result_type = if pass {
            ResultType::Pass
        } else {
            ResultType::Fail
        };
        FrameResults::from_boxes(
            index,
            None,
            vec![ResultBox::new(result_type, Rect::new(0, 0, 10, 10), 30.0)],
        )
    }

    #[test]
    fn test_result_type_precedence() {
        assert_eq!(ResultType::Pass.worst(ResultType::Fail), ResultType::Fail);
        assert_eq!(
            ResultType::Warning.worst(ResultType::Unrecognized),
            ResultType::Warning
        );
        assert_eq!(
            ResultType::Unrecognized.worst(ResultType::Pass),
            ResultType::Unrecognized
        );
        assert!(ResultType::Warning.is_pass());
        assert!(!ResultType::Fail.is_pass());
    }

    #[test]
    fn test_results_sorted_after_out_of_order_insert() {
        let mut results = Results::new();
        results.add_size_results(frame(5, true));
        results.add_size_results(frame(2, true));
        results.add_size_results(frame(9, true));

        let frames: Vec<i64> = results.size_results().iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![2, 5, 9]);
        assert!(results.is_size_sorted());

        // Sorting once must not stop a later out-of-order insert from resorting
        results.add_size_results(frame(1, true));
        assert!(!results.is_size_sorted());
        let frames: Vec<i64> = results.size_results().iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![1, 2, 5, 9]);
    }

    #[test]
    fn test_in_order_insert_stays_sorted() {
        let mut results = Results::new();
        for i in 0..4 {
            results.add_contrast_results(frame(i, true));
        }
        assert!(results.is_contrast_sorted());
    }

    #[test]
    fn test_overall_pass_is_sticky() {
        let mut results = Results::new();
        results.add_contrast_results(frame(0, true));
        assert!(results.overall_contrast_pass());
        results.add_contrast_results(frame(1, false));
        results.add_contrast_results(frame(2, true));
        assert!(!results.overall_contrast_pass());
        assert!(results.overall_size_pass());
    }

    #[test]
    fn test_frame_colorblind_verdict_takes_worst() {
        let mut a = ResultBox::new(ResultType::Pass, Rect::new(0, 0, 4, 4), 5.0);
        a.colorblind.insert(
            ColorblindType::Protanopia,
            ColorblindResult {
                value: 3.0,
                result_type: ResultType::Warning,
            },
        );
        let mut b = ResultBox::new(ResultType::Pass, Rect::new(8, 0, 4, 4), 5.0);
        b.colorblind.insert(
            ColorblindType::Protanopia,
            ColorblindResult {
                value: 2.0,
                result_type: ResultType::Fail,
            },
        );

        let frame = FrameResults::from_boxes(3, Some(0.1), vec![a, b]);
        assert!(frame.overall_pass);
        let verdict = frame.colorblind[&ColorblindType::Protanopia];
        assert_eq!(verdict.result_type, ResultType::Fail);
        assert!(!verdict.pass);
    }

    #[test]
    fn test_json_layout() {
        let mut rb = ResultBox::new(ResultType::Warning, Rect::new(1, 2, 3, 4), 4.2).with_text("Hi");
        rb.colorblind.insert(
            ColorblindType::Tritanopia,
            ColorblindResult {
                value: 4.0,
                result_type: ResultType::Fail,
            },
        );
        let frame = FrameResults::from_boxes(7, Some(0.25), vec![rb]);
        let json = serde_json::to_value(&frame).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["timeStamp"], 0.25);
        let first = &json["results"][0];
        assert_eq!(first["type"], "WARNING");
        assert_eq!(first["x"], 1);
        assert_eq!(first["height"], 4);
        assert_eq!(first["text"], "Hi");
        assert_eq!(first["tritanType"], "FAIL");
        assert_eq!(first["tritanValue"], 4.0);

        let no_ts = serde_json::to_value(FrameResults::no_content()).unwrap();
        assert!(no_ts.get("timeStamp").is_none());
        assert_eq!(no_ts["id"], -1);
    }

    #[test]
    fn test_empty_frames_stay_sorted_and_unique() {
        let mut results = Results::new();
        results.add_empty_frame(9);
        results.add_empty_frame(2);
        results.add_empty_frame(9);
        assert_eq!(results.empty_frames(), &[2, 9]);
        assert_eq!(results.frames_checked(), 0);
        assert!(results.overall_size_pass());
    }
}
