//! Contour detector on synthetic captures

use fonttik_common::{Rect, TextDetectionParams};
use fonttik_detection::{create_detector, ContourDetector, TextDetector};
use image::{Rgb, RgbImage};

/// Five bars (8 px wide, 4 px apart) standing in for a word
fn draw_word(frame: &mut RgbImage, x: u32, y: u32, height: u32) {
    for bar in 0..5 {
        for dx in 0..8 {
            for dy in 0..height {
                frame.put_pixel(x + bar * 12 + dx, y + dy, Rgb([0, 0, 0]));
            }
        }
    }
}

#[test]
fn test_words_grouped_into_lines() {
    let mut frame = RgbImage::from_pixel(1920, 1080, Rgb([255, 255, 255]));
    // First line: two words 24 px apart (closer than padding + line gap)
    draw_word(&mut frame, 100, 100, 40);
    draw_word(&mut frame, 180, 100, 40);
    // Second line
    draw_word(&mut frame, 100, 300, 40);

    let mut detector = create_detector(&TextDetectionParams::default()).unwrap();
    let result = detector.detect_lines_and_words(&frame).unwrap();

    assert_eq!(result.words.len(), 3);
    assert_eq!(result.lines.len(), 2);

    let first_line = result.lines[0].rect();
    assert!(first_line.contains_rect(&Rect::new(100, 100, 136, 40)));
    assert!(result
        .words
        .iter()
        .all(|w| w.rect().height == 60 && w.rect().width == 76));
}

#[test]
fn test_boxes_stay_inside_frame() {
    let mut frame = RgbImage::from_pixel(320, 180, Rgb([255, 255, 255]));
    draw_word(&mut frame, 0, 0, 30);
    draw_word(&mut frame, 250, 140, 30);

    let mut detector = ContourDetector::new(TextDetectionParams::default());
    let boxes = detector.detect_boxes(&frame).unwrap();
    assert_eq!(boxes.len(), 2);
    let frame_rect = Rect::new(0, 0, 320, 180);
    for text_box in &boxes {
        assert!(frame_rect.contains_rect(&text_box.rect()));
    }
}
