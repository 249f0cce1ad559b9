//! Concurrent analysis and annotated video rendering
//!
//! The analysing thread pushes every decoded frame, together with any new
//! verdict, into a bounded queue. A render thread pops frames in order and
//! writes the size and contrast annotated videos. Frames arriving without a
//! verdict show the most recent one.
//!
//! ```text
//! decode + analyse ──push──▶ [bounded queue] ──pop──▶ render ─┬─▶ *_size.mp4
//!                                                             └─▶ *_contrast.mp4
//! ```

use crate::error::{PipelineError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use fonttik_common::{FrameResults, OutlineColors, ProcessingError};
use fonttik_media::render::annotate;
use fonttik_media::VideoWriter;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// How long a blocked push or pop waits before re-checking the queue state
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Bounded single-producer/single-consumer queue with completion tracking
pub struct FrameQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    done: AtomicBool,
    closed: AtomicBool,
    pushed: AtomicUsize,
    popped: AtomicUsize,
}

impl<T> FrameQueue<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            done: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            pushed: AtomicUsize::new(0),
            popped: AtomicUsize::new(0),
        }
    }

    /// Append an item, blocking while the queue is full.
    ///
    /// # Errors
    /// Returns `ConsumerClosed` if the consumer stopped popping.
    pub fn push(&self, mut item: T) -> Result<()> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(PipelineError::ConsumerClosed);
            }
            match self.sender.send_timeout(item, POLL_INTERVAL) {
                Ok(()) => {
                    self.pushed.fetch_add(1, Ordering::AcqRel);
                    return Ok(());
                }
                Err(SendTimeoutError::Timeout(returned)) => item = returned,
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(PipelineError::ConsumerClosed)
                }
            }
        }
    }

    /// Next item in push order. Returns `None` only once the producer is
    /// done and every pushed item has been popped.
    pub fn pop(&self) -> Option<T> {
        loop {
            match self.receiver.recv_timeout(POLL_INTERVAL) {
                Ok(item) => {
                    self.popped.fetch_add(1, Ordering::AcqRel);
                    return Some(item);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.done.load(Ordering::Acquire) {
                        // Items pushed before `done` are already in the channel
                        let item = self.receiver.try_recv().ok()?;
                        self.popped.fetch_add(1, Ordering::AcqRel);
                        return Some(item);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Signal that no further items will be pushed
    pub fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn pushed(&self) -> usize {
        self.pushed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn popped(&self) -> usize {
        self.popped.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Check that every pushed item was consumed
    ///
    /// # Errors
    /// Returns `Undrained` or `CountMismatch` on a protocol violation.
    pub fn verify_drained(&self) -> Result<usize> {
        if !self.is_empty() {
            return Err(PipelineError::Undrained(self.len()));
        }
        let (pushed, popped) = (self.pushed(), self.popped());
        if pushed != popped {
            return Err(PipelineError::CountMismatch { pushed, popped });
        }
        Ok(popped)
    }
}

/// Marks the queue closed when the consumer exits, including by panic
struct CloseOnExit<'a, T>(&'a FrameQueue<T>);

impl<T> Drop for CloseOnExit<'_, T> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Run `produce` on the calling thread and `consume` on a render thread,
/// connected by a queue of `capacity` items.
///
/// Returns the number of items that went through the queue.
///
/// # Errors
/// Returns the consumer's error first, then the producer's, then any queue
/// protocol violation.
pub fn run_pipeline<T, P, C>(capacity: usize, produce: P, mut consume: C) -> Result<usize>
where
    T: Send,
    P: FnOnce(&FrameQueue<T>) -> std::result::Result<(), ProcessingError>,
    C: FnMut(T) -> std::result::Result<(), ProcessingError> + Send,
{
    let queue = FrameQueue::new(capacity);
    let queue = &queue;

    thread::scope(|scope| {
        let consumer = scope.spawn(move || {
            let _guard = CloseOnExit(queue);
            while let Some(item) = queue.pop() {
                consume(item)?;
            }
            Ok::<(), ProcessingError>(())
        });

        let produced = produce(queue);
        queue.mark_done();

        let consumed = consumer
            .join()
            .map_err(|_| PipelineError::ThreadPanicked("Render"))?;
        consumed?;
        produced?;

        let count = queue.verify_drained()?;
        debug!("Render queue drained {} items", count);
        Ok(count)
    })
}

/// A decoded frame on its way to the renderer
pub struct RenderItem {
    pub index: i64,
    pub image: RgbImage,
    /// New size verdict produced for this frame, if it was analysed
    pub size: Option<FrameResults>,
    /// New contrast verdict produced for this frame, if it was analysed
    pub contrast: Option<FrameResults>,
}

impl RenderItem {
    /// A frame that reuses the previous verdict
    #[must_use]
    pub fn held(index: i64, image: RgbImage) -> Self {
        Self {
            index,
            image,
            size: None,
            contrast: None,
        }
    }
}

/// Latest verdict for one check type. An analysed frame without text clears it.
#[derive(Default)]
struct HeldVerdict(Option<FrameResults>);

impl HeldVerdict {
    fn update(&mut self, verdict: Option<FrameResults>) {
        if let Some(verdict) = verdict {
            self.0 = (!verdict.is_no_content()).then_some(verdict);
        }
    }

    fn render(&self, image: &RgbImage, colors: &OutlineColors) -> Option<RgbImage> {
        self.0.as_ref().map(|verdict| annotate(image, verdict, colors))
    }
}

/// The two annotated video outputs of one media item
pub struct AnnotatedVideoSink {
    size_writer: VideoWriter,
    contrast_writer: VideoWriter,
    size: HeldVerdict,
    contrast: HeldVerdict,
    colors: OutlineColors,
    last_index: Option<i64>,
}

impl AnnotatedVideoSink {
    /// Start both encoders
    ///
    /// # Errors
    /// Returns an error if either encoder cannot be started.
    pub fn create(
        size_path: &Path,
        contrast_path: &Path,
        (width, height): (u32, u32),
        fps: f64,
        colors: OutlineColors,
    ) -> std::result::Result<Self, ProcessingError> {
        Ok(Self {
            size_writer: VideoWriter::create(size_path, width, height, fps)?,
            contrast_writer: VideoWriter::create(contrast_path, width, height, fps)?,
            size: HeldVerdict::default(),
            contrast: HeldVerdict::default(),
            colors,
            last_index: None,
        })
    }

    /// Render one frame into both outputs, each on its own thread.
    ///
    /// # Errors
    /// Returns an error if frames arrive out of order or encoding fails.
    pub fn render(&mut self, item: RenderItem) -> std::result::Result<(), ProcessingError> {
        if self.last_index.is_some_and(|last| item.index <= last) {
            return Err(ProcessingError::Other(format!(
                "Frame {} rendered after frame {:?}",
                item.index, self.last_index
            )));
        }
        self.last_index = Some(item.index);
        self.size.update(item.size);
        self.contrast.update(item.contrast);

        let image = &item.image;
        let colors = &self.colors;
        let (size, size_writer) = (&self.size, &mut self.size_writer);
        let (contrast, contrast_writer) = (&self.contrast, &mut self.contrast_writer);

        thread::scope(|scope| {
            let size_thread = scope.spawn(move || match size.render(image, colors) {
                Some(annotated) => size_writer.write_frame(&annotated),
                None => size_writer.write_frame(image),
            });
            let contrast_thread = scope.spawn(move || match contrast.render(image, colors) {
                Some(annotated) => contrast_writer.write_frame(&annotated),
                None => contrast_writer.write_frame(image),
            });

            let size_written = size_thread
                .join()
                .map_err(|_| ProcessingError::Other("Size render thread panicked".into()))?;
            let contrast_written = contrast_thread
                .join()
                .map_err(|_| ProcessingError::Other("Contrast render thread panicked".into()))?;
            size_written?;
            contrast_written
        })
    }

    /// Close both encoders
    ///
    /// # Errors
    /// Returns an error if either encoder failed.
    pub fn finish(self) -> std::result::Result<Vec<PathBuf>, ProcessingError> {
        let size = self.size_writer.finish()?;
        let contrast = self.contrast_writer.finish()?;
        info!("Saved annotated videos {} and {}", size.display(), contrast.display());
        Ok(vec![size, contrast])
    }
}
