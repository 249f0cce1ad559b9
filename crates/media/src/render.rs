//! Result outlines drawn over frames

use fonttik_common::{FrameResults, OutlineColors, Rect, ResultType};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as DrawRect;

/// Outline colour for a verdict
#[must_use]
pub fn color_for(result_type: ResultType, colors: &OutlineColors) -> Rgb<u8> {
    Rgb(match result_type {
        ResultType::Pass => colors.pass,
        ResultType::Fail => colors.fail,
        ResultType::Warning => colors.warning,
        ResultType::Unrecognized => colors.unrecognized,
    })
}

/// Draw a rectangle outline `thickness` pixels wide, growing outwards
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
pub fn draw_outline(image: &mut RgbImage, rect: Rect, color: Rgb<u8>, thickness: u32) {
    for step in 0..thickness.max(1) as i32 {
        let ring = rect.inflate(step, step);
        if ring.is_empty() {
            continue;
        }
        let shape = DrawRect::at(ring.x, ring.y).of_size(ring.width as u32, ring.height as u32);
        draw_hollow_rect_mut(image, shape, color);
    }
}

/// Draw every result box of a frame verdict
pub fn draw_results(image: &mut RgbImage, results: &FrameResults, colors: &OutlineColors) {
    for result in &results.results {
        draw_outline(
            image,
            result.rect,
            color_for(result.result_type, colors),
            colors.thickness,
        );
    }
}

/// Verdict shown on frame `index`: the latest result at or before it
#[must_use]
pub fn result_for_frame(results: &[FrameResults], index: i64) -> Option<&FrameResults> {
    let end = results.partition_point(|r| r.frame <= index);
    end.checked_sub(1).map(|i| &results[i])
}

/// Verdict shown on frame `index`, or `None` when an analysed frame without
/// text lies between the latest verdict and `index`
#[must_use]
pub fn verdict_for_frame<'a>(
    results: &'a [FrameResults],
    empty_frames: &[i64],
    index: i64,
) -> Option<&'a FrameResults> {
    let verdict = result_for_frame(results, index)?;
    let cleared = empty_frames
        .partition_point(|&f| f <= index)
        .checked_sub(1)
        .is_some_and(|i| empty_frames[i] > verdict.frame);
    (!cleared).then_some(verdict)
}

/// Copy of `image` annotated with a frame verdict
#[must_use]
pub fn annotate(image: &RgbImage, results: &FrameResults, colors: &OutlineColors) -> RgbImage {
    let mut annotated = image.clone();
    draw_results(&mut annotated, results, colors);
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use fonttik_common::ResultBox;

    #[test]
    fn test_outline_colours_follow_result_type() {
        let colors = OutlineColors::default();
        let results = FrameResults::from_boxes(
            0,
            None,
            vec![
                ResultBox::new(ResultType::Pass, Rect::new(2, 2, 10, 10), 30.0),
                ResultBox::new(ResultType::Fail, Rect::new(20, 2, 10, 10), 10.0),
            ],
        );
        let image = RgbImage::new(40, 20);
        let annotated = annotate(&image, &results, &colors);

        assert_eq!(annotated.get_pixel(2, 2).0, colors.pass);
        assert_eq!(annotated.get_pixel(20, 5).0, colors.fail);
        // Interior untouched
        assert_eq!(annotated.get_pixel(7, 7).0, [0, 0, 0]);
        // Second ring of a 2 px outline
        assert_eq!(annotated.get_pixel(1, 1).0, colors.pass);
    }

    #[test]
    fn test_result_for_frame_holds_forward() {
        let frames: Vec<FrameResults> = [0, 5, 9]
            .iter()
            .map(|&i| FrameResults::from_boxes(i, None, Vec::new()))
            .collect();
        assert_eq!(result_for_frame(&frames, 0).map(|r| r.frame), Some(0));
        assert_eq!(result_for_frame(&frames, 7).map(|r| r.frame), Some(5));
        assert_eq!(result_for_frame(&frames, 20).map(|r| r.frame), Some(9));
        assert!(result_for_frame(&frames[1..], 2).is_none());
    }

    #[test]
    fn test_empty_frame_ends_held_verdict() {
        let frames: Vec<FrameResults> = [0, 5]
            .iter()
            .map(|&i| FrameResults::from_boxes(i, None, Vec::new()))
            .collect();
        let empty = [2, 3];
        assert_eq!(verdict_for_frame(&frames, &empty, 1).map(|r| r.frame), Some(0));
        assert!(verdict_for_frame(&frames, &empty, 2).is_none());
        assert!(verdict_for_frame(&frames, &empty, 4).is_none());
        assert_eq!(verdict_for_frame(&frames, &empty, 5).map(|r| r.frame), Some(5));
        assert_eq!(verdict_for_frame(&frames, &empty, 8).map(|r| r.frame), Some(5));
        assert!(verdict_for_frame(&[], &empty, 8).is_none());
    }

    #[test]
    fn test_outline_outside_image_is_clipped() {
        let mut image = RgbImage::new(10, 10);
        draw_outline(&mut image, Rect::new(-5, -5, 30, 30), Rgb([1, 2, 3]), 3);
        draw_outline(&mut image, Rect::new(3, 3, 0, 4), Rgb([1, 2, 3]), 1);
        assert_eq!(image.get_pixel(5, 5).0, [0, 0, 0]);
    }
}
