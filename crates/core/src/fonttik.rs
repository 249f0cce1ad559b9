//! Per media item orchestration
//!
//! For every media item the guideline is resolved from the frame size, the
//! focus/ignore mask is built, and each analysed frame goes through
//! detection, merging, luminance and mask extraction, then the contrast
//! check (on words) and the size check (on lines, or words when line
//! grouping is off). Results are saved as JSON and annotated outlines.

use crate::contrast::ContrastChecker;
use crate::save_pipeline::{run_pipeline, AnnotatedVideoSink, RenderItem};
use crate::size::SizeChecker;
use fonttik_colorblind::ColorblindFilter;
use fonttik_common::{
    ActiveGuideline, Configuration, FrameResults, Rect, Result, ResultBox, Results,
};
use fonttik_detection::{
    create_detector, create_recognizer, LinesAndWords, TextDetector, TextRecognizer,
};
use fonttik_media::output::annotated_path;
use fonttik_media::{
    open_media, write_results_json, Frame, FrameDeduplicator, Media, VIDEO_OUTPUT_EXTENSION,
};
use fonttik_textbox::{merge_boxes, TextBox};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Frame rate used for annotated output when the source reports none
const DEFAULT_OUTPUT_FPS: f64 = 30.0;

/// Size and contrast verdicts for one analysed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCheck {
    pub size: FrameResults,
    pub contrast: FrameResults,
}

impl FrameCheck {
    /// Verdicts for a frame without any text
    #[must_use]
    pub fn no_content() -> Self {
        Self {
            size: FrameResults::no_content(),
            contrast: FrameResults::no_content(),
        }
    }

    #[must_use]
    pub fn is_no_content(&self) -> bool {
        self.size.is_no_content() && self.contrast.is_no_content()
    }
}

/// Everything produced for one media item
#[derive(Debug)]
pub struct MediaReport {
    pub guideline: ActiveGuideline,
    pub results: Results,
    /// Result files and annotated outputs written
    pub outputs: Vec<PathBuf>,
}

/// Accessibility checker for images and video.
///
/// Each instance owns its detector and recognizer, so it is used by a single
/// thread; share the configuration between instances instead.
pub struct Fonttik {
    config: Arc<Configuration>,
    detector: Box<dyn TextDetector>,
    recognizer: Option<Box<dyn TextRecognizer>>,
    colorblind: Option<ColorblindFilter>,
}

impl Fonttik {
    /// Build a checker with the detector and recognizer named in the configuration
    ///
    /// # Errors
    /// Returns an error if a backend cannot be created or the colorblind
    /// matrices are invalid.
    pub fn new(config: Arc<Configuration>) -> Result<Self> {
        let detector = create_detector(&config.text_detection)?;
        let recognizer = create_recognizer(&config.text_recognition)?;
        Self::with_backends(config, detector, recognizer)
    }

    /// Build a checker around existing backends
    ///
    /// # Errors
    /// Returns an error if the colorblind matrices are invalid.
    pub fn with_backends(
        config: Arc<Configuration>,
        detector: Box<dyn TextDetector>,
        recognizer: Option<Box<dyn TextRecognizer>>,
    ) -> Result<Self> {
        let colorblind = if config.colorblindness.enabled {
            Some(ColorblindFilter::new(&config.colorblindness)?)
        } else {
            None
        };
        debug!(
            "Checker ready: detector={}, recognizer={}, colorblind={}",
            detector.name(),
            recognizer.as_ref().map_or("none", |r| r.name()),
            colorblind.is_some()
        );
        Ok(Self {
            config,
            detector,
            recognizer,
            colorblind,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Open a file, check it and save its artifacts under the configured
    /// output directory
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or checked.
    pub fn process_path(&mut self, path: &Path) -> Result<MediaReport> {
        let output_root = self.config.app_settings.output_dir.clone();
        let mut media = open_media(path, output_root.as_deref())?;
        self.process_media(media.as_mut())
    }

    /// Check every frame of a media item and save its artifacts
    ///
    /// # Errors
    /// Returns `UnresolvedResolution` if no guideline applies to the frame
    /// size, or the first decoding, detection or output error.
    pub fn process_media(&mut self, media: &mut dyn Media) -> Result<MediaReport> {
        let config = Arc::clone(&self.config);
        let settings = &config.app_settings;
        let (width, height) = media.dimensions();
        let guideline = config.guideline.resolve(width, height)?;
        info!(
            "Checking {} ({}x{}, {}p guideline)",
            media.path().display(),
            width,
            height,
            guideline.resolution
        );

        media.calculate_mask(settings);
        let mut results = Results::new();
        let mut outputs = Vec::new();

        if media.is_video() && settings.save_outlines && settings.async_video_save {
            outputs.extend(self.process_video_async(media, &guideline, &mut results)?);
        } else {
            self.analyse_frames(media, &guideline, &mut results, |_, _| Ok(()))?;
            if settings.save_outlines {
                outputs.extend(media.save_results_outlines(&mut results, &config.outline_colors)?);
            }
        }

        if settings.save_json {
            outputs.extend(write_results_json(media.output_path(), &mut results)?);
        }

        info!(
            "{}: size {}, contrast {} ({} frames checked)",
            media.path().display(),
            pass_label(results.overall_size_pass()),
            pass_label(results.overall_contrast_pass()),
            results.frames_checked()
        );
        Ok(MediaReport {
            guideline,
            results,
            outputs,
        })
    }

    /// Analyse while a render thread writes the annotated videos
    fn process_video_async(
        &mut self,
        media: &mut dyn Media,
        guideline: &ActiveGuideline,
        results: &mut Results,
    ) -> Result<Vec<PathBuf>> {
        let capacity = self.config.app_settings.queue_capacity;
        let output_dir = media.output_path().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        let size_path = annotated_path(&output_dir, media.path(), "size", VIDEO_OUTPUT_EXTENSION);
        let contrast_path =
            annotated_path(&output_dir, media.path(), "contrast", VIDEO_OUTPUT_EXTENSION);
        let fps = media.fps().unwrap_or(DEFAULT_OUTPUT_FPS);

        let mut sink = AnnotatedVideoSink::create(
            &size_path,
            &contrast_path,
            media.dimensions(),
            fps,
            self.config.outline_colors,
        )?;
        let rendered =
            self.stream_frames(media, guideline, results, capacity, |item| sink.render(item))?;
        debug!("Rendered {} frames for {}", rendered, media.path().display());
        sink.finish()
    }

    /// Analyse every frame on this thread while `render` consumes the frames,
    /// in order, on a second thread.
    ///
    /// Analysed frames carry their new verdicts; skipped frames are sent as
    /// [`RenderItem::held`]. Returns the number of frames rendered.
    ///
    /// # Errors
    /// Returns the first analysis or render error, or a queue protocol
    /// violation.
    pub fn stream_frames<R>(
        &mut self,
        media: &mut dyn Media,
        guideline: &ActiveGuideline,
        results: &mut Results,
        capacity: usize,
        render: R,
    ) -> Result<usize>
    where
        R: FnMut(RenderItem) -> Result<()> + Send,
    {
        let rendered = run_pipeline(
            capacity,
            |queue| {
                self.analyse_frames(media, guideline, results, |frame, check| {
                    let item = match check {
                        Some(check) => RenderItem {
                            index: frame.index,
                            image: frame.image,
                            size: Some(check.size.clone()),
                            contrast: Some(check.contrast.clone()),
                        },
                        None => RenderItem::held(frame.index, frame.image),
                    };
                    queue.push(item)?;
                    Ok(())
                })
            },
            render,
        )?;
        Ok(rendered)
    }

    /// Load and check frames until the source is exhausted.
    ///
    /// Every loaded frame is handed to `on_frame`, with its verdict when it
    /// was analysed. Frames off the frame step, or duplicates of the last
    /// analysed frame, are passed on without one.
    fn analyse_frames<F>(
        &mut self,
        media: &mut dyn Media,
        guideline: &ActiveGuideline,
        results: &mut Results,
        mut on_frame: F,
    ) -> Result<()>
    where
        F: FnMut(Frame, Option<&FrameCheck>) -> Result<()>,
    {
        let config = Arc::clone(&self.config);
        let settings = &config.app_settings;
        let step = i64::from(settings.frame_step.max(1));
        let mut dedup = FrameDeduplicator::new(settings.frame_dedup_threshold);
        let mut analysed = 0usize;
        let mut loaded = 0usize;

        while media.load_frame()? {
            let Some(frame) = media.take_frame() else {
                break;
            };
            loaded += 1;

            let due = frame.index % step == 0;
            if !due || (media.is_video() && dedup.is_duplicate(&frame.image)) {
                on_frame(frame, None)?;
                continue;
            }

            let check = self.check_frame(&frame, guideline)?;
            analysed += 1;
            if check.is_no_content() {
                results.add_empty_frame(frame.index);
            } else {
                results.add_size_results(check.size.clone());
                results.add_contrast_results(check.contrast.clone());
            }
            on_frame(frame, Some(&check))?;
        }

        debug!("Analysed {} of {} frames", analysed, loaded);
        if loaded == 0 {
            warn!("No frames decoded from {}", media.path().display());
        }
        Ok(())
    }

    /// Run both checks on one frame
    ///
    /// # Errors
    /// Returns an error if detection or recognition fails.
    pub fn check_frame(&mut self, frame: &Frame, guideline: &ActiveGuideline) -> Result<FrameCheck> {
        let config = Arc::clone(&self.config);
        let params = &config.text_detection;
        let settings = &config.app_settings;
        let image = frame.analysis_image();

        let (mut words, mut lines) = if params.group_by_line {
            let LinesAndWords { lines, words } = self.detector.detect_lines_and_words(&image)?;
            (words, lines)
        } else {
            (self.detector.detect_boxes(&image)?, Vec::new())
        };
        merge_boxes(&mut words, params.merge_threshold);
        merge_boxes(&mut lines, params.merge_threshold);

        if words.is_empty() && lines.is_empty() {
            debug!("Frame {}: no text detected", frame.index);
            return Ok(FrameCheck::no_content());
        }
        debug!(
            "Frame {}: {} words, {} lines",
            frame.index,
            words.len(),
            lines.len()
        );

        for textbox in words.iter_mut().chain(lines.iter_mut()) {
            textbox.calculate_luminance(&image);
            textbox.calculate_text_mask()?;
        }

        let variants = self
            .colorblind
            .as_ref()
            .map(|filter| filter.simulate_all(&image))
            .unwrap_or_default();
        let mut contrast = ContrastChecker::new(
            guideline,
            settings.background_radius,
            settings.fails_as_warnings,
        )
        .check_boxes(&words, &variants);

        let size_targets = if lines.is_empty() { &mut words } else { &mut lines };
        let recognizer: Option<&mut dyn TextRecognizer> = match self.recognizer.as_mut() {
            Some(recognizer) => Some(&mut **recognizer),
            None => None,
        };
        let size = SizeChecker::new(guideline, settings.fails_as_warnings).check_boxes(
            size_targets,
            &image,
            recognizer,
        )?;

        backfill_text(&mut contrast, &size);

        Ok(FrameCheck {
            size: FrameResults::from_boxes(frame.index, frame.timestamp, size),
            contrast: FrameResults::from_boxes(frame.index, frame.timestamp, contrast),
        })
    }
}

/// Copy recognized text onto contrast results that have none.
///
/// A contrast box takes the text of the size result whose rectangle contains
/// its centre, preferring the one it overlaps most.
pub fn backfill_text(contrast: &mut [ResultBox], size: &[ResultBox]) {
    for result in contrast.iter_mut().filter(|r| r.text.is_empty()) {
        let (cx, cy) = result.rect.center();
        let source = size
            .iter()
            .filter(|s| !s.text.is_empty() && s.rect.contains_point(cx, cy))
            .max_by_key(|s| overlap_area(&s.rect, &result.rect));
        if let Some(source) = source {
            result.text.clone_from(&source.text);
        }
    }
}

fn overlap_area(a: &Rect, b: &Rect) -> i64 {
    a.intersection(b).map_or(0, |r| r.area())
}

fn pass_label(pass: bool) -> &'static str {
    if pass {
        "PASS"
    } else {
        "FAIL"
    }
}
