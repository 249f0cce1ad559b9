//! Video decoding and encoding through the ffmpeg command-line tools
//!
//! Frames travel as raw RGB24 over pipes: `ffmpeg -f rawvideo` on stdout for
//! decoding, and on stdin for encoding annotated output.

use fonttik_common::{ProcessingError, Result};
use image::RgbImage;
use serde::Deserialize;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, warn};

/// Frame rate assumed when the container does not report one
const FALLBACK_FPS: f64 = 30.0;

/// Stream properties reported by ffprobe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse an ffprobe rate such as "30000/1001" or "25"
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num.parse::<f64>().ok()? / den
        }
        None => rate.parse().ok()?,
    };
    (value > 0.0).then_some(value)
}

fn parse_probe(json: &str) -> Result<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json)?;
    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or(ProcessingError::NoVideoStream)?;

    let (Some(width), Some(height)) = (stream.width, stream.height) else {
        return Err(ProcessingError::CorruptedFile(
            "video stream without dimensions".to_string(),
        ));
    };
    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .unwrap_or(FALLBACK_FPS);
    let duration = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse().ok());

    Ok(VideoInfo {
        width,
        height,
        fps,
        duration,
    })
}

/// Read the first video stream's properties
///
/// # Errors
/// Returns `FFmpegError` if ffprobe cannot run or rejects the file, and
/// `NoVideoStream` if the container has no video.
pub fn probe(path: &Path) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| ProcessingError::FFmpegError(format!("Failed to execute ffprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProcessingError::FFmpegError(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            stderr.trim()
        )));
    }

    let info = parse_probe(&String::from_utf8_lossy(&output.stdout))?;
    debug!(
        "Probed {}: {}x{} @ {:.3} fps",
        path.display(),
        info.width,
        info.height,
        info.fps
    );
    Ok(info)
}

/// Sequential RGB frame reader backed by an ffmpeg child process
pub struct FrameDecoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    finished: bool,
}

impl FrameDecoder {
    /// Start decoding `path`
    ///
    /// # Errors
    /// Returns `FFmpegError` if ffmpeg cannot be started.
    pub fn open(path: &Path, width: u32, height: u32) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessingError::FFmpegError(format!("Failed to start ffmpeg: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessingError::FFmpegError("ffmpeg stdout unavailable".into()))?;

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            width,
            height,
            finished: false,
        })
    }

    /// Next decoded frame, `None` at the end of the stream
    ///
    /// # Errors
    /// Returns an error if the pipe breaks mid-frame or ffmpeg exits with a
    /// failure status.
    pub fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }
        let mut buffer = vec![0u8; (self.width * self.height * 3) as usize];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.finish()?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        RgbImage::from_raw(self.width, self.height, buffer)
            .map(Some)
            .ok_or_else(|| ProcessingError::CorruptedFile("short raw frame".into()))
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait()?;
        if status.success() {
            return Ok(());
        }
        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        Err(ProcessingError::FFmpegError(format!(
            "ffmpeg decode failed ({status}): {}",
            stderr.trim()
        )))
    }
}

impl Drop for FrameDecoder {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// H.264 encoder fed with RGB frames through ffmpeg's stdin
pub struct VideoWriter {
    child: Child,
    stdin: Option<ChildStdin>,
    path: PathBuf,
    frames: u64,
}

impl VideoWriter {
    /// Start encoding to `path`
    ///
    /// # Errors
    /// Returns `FFmpegError` if ffmpeg cannot be started.
    pub fn create(path: &Path, width: u32, height: u32, fps: f64) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24", "-s"])
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(format!("{fps}"))
            .args(["-i", "-", "-c:v", "libx264", "-pix_fmt", "yuv420p"])
            // yuv420p needs even dimensions
            .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessingError::FFmpegError(format!("Failed to start ffmpeg: {e}")))?;
        let stdin = child.stdin.take();

        Ok(Self {
            child,
            stdin,
            path: path.to_path_buf(),
            frames: 0,
        })
    }

    /// Append one frame
    ///
    /// # Errors
    /// Returns an error if the encoder has exited.
    pub fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ProcessingError::FFmpegError("encoder already finished".into()))?;
        stdin.write_all(frame.as_raw()).map_err(|e| {
            ProcessingError::FFmpegError(format!("Failed to write to encoder: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    /// Close the stream and wait for the encoder
    ///
    /// # Errors
    /// Returns `FFmpegError` if encoding failed.
    pub fn finish(mut self) -> Result<PathBuf> {
        drop(self.stdin.take());
        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let status = self.child.wait()?;
        if !status.success() {
            return Err(ProcessingError::FFmpegError(format!(
                "ffmpeg encode failed for {} ({status}): {}",
                self.path.display(),
                stderr.trim()
            )));
        }
        debug!("Encoded {} frames to {}", self.frames, self.path.display());
        Ok(self.path.clone())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            warn!("Video writer for {} dropped before finish", self.path.display());
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("25"), Some(25.0));
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("garbage"), None);
    }

    #[test]
    fn test_parse_probe_picks_video_stream() {
        let json = r#"{
            "streams": [
                { "codec_type": "audio" },
                { "codec_type": "video", "width": 1920, "height": 1080,
                  "r_frame_rate": "60/1", "avg_frame_rate": "0/0" }
            ],
            "format": { "duration": "12.5" }
        }"#;
        let info = parse_probe(json).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(info.fps, 60.0);
        assert_eq!(info.duration, Some(12.5));
    }

    #[test]
    fn test_parse_probe_without_video() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ] }"#;
        assert!(matches!(
            parse_probe(json),
            Err(ProcessingError::NoVideoStream)
        ));
    }
}
