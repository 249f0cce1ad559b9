//! Text regions and the per-region algorithms used by the accessibility checks
//!
//! A [`TextBox`] is a candidate text region reported by a detector. This crate
//! computes its relative luminance, extracts a binary glyph mask (Otsu
//! thresholding with polarity correction and glyph-cluster refinement), and
//! coalesces overlapping boxes or words into lines.
//!
//! # Example
//! ```
//! use fonttik_common::Rect;
//! use fonttik_textbox::TextBox;
//! use image::{Rgb, RgbImage};
//!
//! let mut frame = RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]));
//! for x in 10..40 {
//!     for y in 8..24 {
//!         frame.put_pixel(x, y, Rgb([0, 0, 0]));
//!     }
//! }
//!
//! let mut text_box = TextBox::from_rect(Rect::new(4, 2, 44, 28), 64, 32);
//! text_box.calculate_luminance(&frame);
//! text_box.calculate_text_mask().unwrap();
//! assert_eq!(text_box.text_rect().height, 16);
//! ```

pub mod luminance;
pub mod mask;
pub mod merge;
mod textbox;

pub use luminance::{contrast_between_regions, contrast_ratio, flip_region, luminance_map};
pub use mask::{extract_text_mask, TextMask};
pub use merge::{group_lines, merge_boxes, overlap_axis_percentage, LineGrouping};
pub use textbox::TextBox;
