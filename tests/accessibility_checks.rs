//! Workspace-level checks through the public facade

use fonttik::{
    ColorblindType, Configuration, Fonttik, FrameResults, Rect, ResultBox, ResultType, Results,
};
use image::{Rgb, RgbImage};
use std::sync::Arc;

fn frame(index: i64, result_type: ResultType) -> FrameResults {
    FrameResults::from_boxes(
        index,
        Some(index as f64 / 30.0),
        vec![ResultBox::new(result_type, Rect::new(0, 0, 10, 10), 5.0)],
    )
}

#[test]
fn test_results_stay_sorted_after_sort_then_insert() {
    let mut results = Results::new();
    results.add_size_results(frame(5, ResultType::Pass));
    results.add_size_results(frame(2, ResultType::Pass));
    let first: Vec<i64> = results.size_results().iter().map(|r| r.frame).collect();
    assert_eq!(first, vec![2, 5]);

    results.add_size_results(frame(3, ResultType::Fail));
    assert!(!results.is_size_sorted());
    let second: Vec<i64> = results.size_results().iter().map(|r| r.frame).collect();
    assert_eq!(second, vec![2, 3, 5]);
    assert!(results.is_size_sorted());
    assert!(!results.overall_size_pass());
}

#[test]
fn test_result_json_layout() {
    let mut result = ResultBox::new(ResultType::Warning, Rect::new(3, 4, 50, 20), 3.9)
        .with_text("Options");
    result.colorblind.insert(
        ColorblindType::Tritanopia,
        fonttik::common::ColorblindResult {
            value: 2.5,
            result_type: ResultType::Fail,
        },
    );
    let json = serde_json::to_value(FrameResults::from_boxes(7, Some(0.25), vec![result])).unwrap();

    assert_eq!(json["id"], 7);
    assert_eq!(json["timeStamp"], 0.25);
    let entry = &json["results"][0];
    assert_eq!(entry["type"], "WARNING");
    assert_eq!(entry["x"], 3);
    assert_eq!(entry["height"], 20);
    assert_eq!(entry["value"], 3.9);
    assert_eq!(entry["text"], "Options");
    assert_eq!(entry["tritanValue"], 2.5);
    assert_eq!(entry["tritanType"], "FAIL");
    assert!(entry.get("protanValue").is_none());
}

#[test]
fn test_configuration_file_drives_the_check() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let config_path = temp.path().join("fonttik.json");
    std::fs::write(
        &config_path,
        r#"{
            "guideline": { "resolutions": { "1080": { "height": 12 } } },
            "textDetection": { "detector": "contour" },
            "appSettings": { "saveOutlines": false, "outputDir": null },
            "outlineColors": "broken"
        }"#,
    )?;
    let config = Configuration::load(&config_path)?;
    assert_eq!(config.guideline.resolutions[&1080].height, 12);
    assert_eq!(config.outline_colors, fonttik::common::OutlineColors::default());

    // 16 px text passes a 12 px minimum
    let mut capture = RgbImage::from_pixel(1920, 1080, Rgb([255, 255, 255]));
    for y in 500..516 {
        for x in 800..1100 {
            capture.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    let input = temp.path().join("hud.png");
    capture.save(&input)?;

    let mut fonttik = Fonttik::new(Arc::new(config))?;
    let mut report = fonttik.process_path(&input)?;
    assert!(report.results.overall_size_pass());
    assert_eq!(report.results.size_results()[0].results[0].value, 16.0);

    let written = temp.path().join("hud").join("sizeChecks.json");
    assert_eq!(report.outputs.len(), 2);
    assert!(written.exists());
    Ok(())
}
