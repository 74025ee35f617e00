//! Encoding rendered frames into animations.
//!
//! A [`VideoEncoder`] receives raw frames and forwards them to a
//! [`FrameSink`] chosen from the output file extension: `.gif` writes an
//! animated GIF, image extensions (`.png`, `.jpg`, `.bmp`, `.tif`) write a
//! numbered image sequence next to the requested file. Other extensions fall
//! back to GIF.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, ImageFormat, RgbaImage};
use thiserror::Error;

/// Errors reported by the video encoder.
#[derive(Error, Debug)]
pub enum VideoError {
    /// Frame sizes must be multiples of 8.
    #[error("video frame resolution ({width}, {height}) is not a multiple of 8")]
    InvalidSize { width: u32, height: u32 },

    /// All frames of a video must have the same size.
    #[error("frame size ({width}, {height}) differs from the video resolution ({expected_width}, {expected_height})")]
    SizeChanged {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// The pixel buffer does not match the frame size and pixel format.
    #[error("frame buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    /// Image encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Layout of the raw pixel data passed to [`VideoEncoder::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// RGB 8:8:8, 24bpp.
    Rgb888,
    /// BGR 8:8:8, 24bpp.
    Bgr888,
    /// RGBA 8:8:8:8, 32bpp.
    Rgba8888,
    /// BGRA 8:8:8:8, 32bpp.
    Bgra8888,
}

impl PixelFormat {
    #[must_use]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb888 | PixelFormat::Bgr888 => 3,
            PixelFormat::Rgba8888 | PixelFormat::Bgra8888 => 4,
        }
    }

    /// Converts raw pixels to an RGBA image. Rows are top to bottom.
    fn to_rgba(self, data: &[u8], width: u32, height: u32) -> Result<RgbaImage, VideoError> {
        let expected = (width as usize) * (height as usize) * self.channels();
        if data.len() != expected {
            return Err(VideoError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        let rgba: Vec<u8> = data
            .chunks_exact(self.channels())
            .flat_map(|p| match self {
                PixelFormat::Rgb888 => [p[0], p[1], p[2], 255],
                PixelFormat::Bgr888 => [p[2], p[1], p[0], 255],
                PixelFormat::Rgba8888 => [p[0], p[1], p[2], p[3]],
                PixelFormat::Bgra8888 => [p[2], p[1], p[0], p[3]],
            })
            .collect();
        RgbaImage::from_raw(width, height, rgba).ok_or(VideoError::BufferSize {
            expected,
            actual: data.len(),
        })
    }
}

/// Destination of encoded frames.
pub trait FrameSink {
    /// Appends one frame.
    fn write_frame(&mut self, frame: RgbaImage) -> Result<(), VideoError>;

    /// Flushes and closes the output.
    fn finish(&mut self) -> Result<(), VideoError>;
}

/// Animated GIF output.
pub struct GifSink {
    encoder: Option<GifEncoder<BufWriter<File>>>,
    delay: Delay,
}

impl GifSink {
    pub fn create(path: &Path, framerate: u32) -> Result<Self, VideoError> {
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = GifEncoder::new_with_speed(file, 10);
        encoder.set_repeat(Repeat::Infinite)?;
        Ok(Self {
            encoder: Some(encoder),
            delay: Delay::from_numer_denom_ms(1000, framerate.max(1)),
        })
    }
}

impl FrameSink for GifSink {
    fn write_frame(&mut self, frame: RgbaImage) -> Result<(), VideoError> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.encode_frame(Frame::from_parts(frame, 0, 0, self.delay))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        // Dropping the encoder writes the trailer.
        self.encoder = None;
        Ok(())
    }
}

/// Numbered image files `<stem>_00000.<ext>`, `<stem>_00001.<ext>`, ...
pub struct ImageSequenceSink {
    directory: PathBuf,
    stem: String,
    extension: String,
    format: ImageFormat,
    next: usize,
}

impl ImageSequenceSink {
    #[must_use]
    pub fn new(path: &Path, format: ImageFormat) -> Self {
        Self {
            directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            stem: path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("frame")
                .to_string(),
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("png")
                .to_string(),
            format,
            next: 0,
        }
    }

    /// Path of frame `index`.
    #[must_use]
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(format!("{}_{index:05}.{}", self.stem, self.extension))
    }
}

impl FrameSink for ImageSequenceSink {
    fn write_frame(&mut self, frame: RgbaImage) -> Result<(), VideoError> {
        let path = self.frame_path(self.next);
        match self.format {
            ImageFormat::Jpeg | ImageFormat::Bmp => image::DynamicImage::ImageRgba8(frame)
                .to_rgb8()
                .save_with_format(&path, self.format)?,
            _ => frame.save_with_format(&path, self.format)?,
        }
        self.next += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        Ok(())
    }
}

/// Output containers the encoder can write, by file extension.
pub const SUPPORTED_FORMATS: &[&str] = &["gif", "png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Collects frames of equal size and writes them as an animation.
///
/// ```ignore
/// let mut encoder = VideoEncoder::new("orbit.gif", 30, 8_000_000);
/// for frame in frames {
///     encoder.encode(&frame, 800, 600, PixelFormat::Rgba8888)?;
/// }
/// encoder.end()?;
/// ```
pub struct VideoEncoder {
    file_name: PathBuf,
    framerate: u32,
    bitrate: u64,
    sink: Option<Box<dyn FrameSink>>,
    /// The sink came from [`VideoEncoder::with_sink`] and outlives [`VideoEncoder::end`].
    custom_sink: bool,
    size: Option<(u32, u32)>,
    frames: usize,
}

impl VideoEncoder {
    /// Creates an encoder writing to `file_name`. The output is opened with
    /// the first frame. `bitrate` is informative; the supported containers
    /// are lossless or palette based.
    pub fn new(file_name: impl Into<PathBuf>, framerate: u32, bitrate: u64) -> Self {
        let file_name = file_name.into();
        log::info!("output file name: {}", file_name.display());
        log::info!("video framerate: {framerate}");
        log::info!("video bitrate: {} Mbits/sec", bitrate / (1024 * 1024));
        Self {
            file_name,
            framerate: framerate.max(1),
            bitrate,
            sink: None,
            custom_sink: false,
            size: None,
            frames: 0,
        }
    }

    /// Uses a custom sink instead of one chosen from the file extension.
    ///
    /// The sink is kept across [`end`](Self::end), so it receives every video
    /// the encoder produces.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.sink = Some(sink);
        self.custom_sink = true;
        self
    }

    #[must_use]
    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    #[must_use]
    pub fn framerate(&self) -> u32 {
        self.framerate
    }

    #[must_use]
    pub fn bitrate(&self) -> u64 {
        self.bitrate
    }

    /// Number of frames in the current video.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Whether a frame size can be encoded.
    #[must_use]
    pub fn is_size_acceptable(width: u32, height: u32) -> bool {
        width > 0 && height > 0 && width % 8 == 0 && height % 8 == 0
    }

    /// Appends a frame. The first frame fixes the video resolution.
    pub fn encode(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<(), VideoError> {
        if !Self::is_size_acceptable(width, height) {
            log::error!("video frame resolution ({width}, {height}) is not a multiple of 8");
            return Err(VideoError::InvalidSize { width, height });
        }
        match self.size {
            Some((w, h)) if (w, h) != (width, height) => {
                log::error!("image size differs from the size of the previously created video stream");
                return Err(VideoError::SizeChanged {
                    width,
                    height,
                    expected_width: w,
                    expected_height: h,
                });
            }
            Some(_) => {}
            None => {
                if self.sink.is_none() {
                    self.sink = Some(self.open_sink()?);
                }
                self.size = Some((width, height));
            }
        }

        let frame = format.to_rgba(data, width, height)?;
        if let Some(sink) = self.sink.as_mut() {
            sink.write_frame(frame)?;
            self.frames += 1;
        }
        Ok(())
    }

    /// Finishes the output and returns the number of frames written.
    ///
    /// Further frames start a new video, replacing the output file (or the
    /// numbered images of a sequence).
    pub fn end(&mut self) -> Result<usize, VideoError> {
        let frames = std::mem::take(&mut self.frames);
        let started = self.size.take().is_some();
        if !self.custom_sink {
            if let Some(mut sink) = self.sink.take() {
                sink.finish()?;
            }
        } else if let (true, Some(sink)) = (started, self.sink.as_mut()) {
            sink.finish()?;
        }
        if started {
            log::info!("{frames} frames written to {}", self.file_name.display());
        }
        Ok(frames)
    }

    fn open_sink(&mut self) -> Result<Box<dyn FrameSink>, VideoError> {
        let extension = self
            .file_name
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if extension != "gif" {
            if let Some(format) = easy3d_render::screenshot::image_format_for(&self.file_name) {
                return Ok(Box::new(ImageSequenceSink::new(&self.file_name, format)));
            }
            log::warn!(
                "output format is not supported: '{extension}', writing a GIF instead. Supported formats: {}",
                SUPPORTED_FORMATS.join(", ")
            );
            self.file_name.set_extension("gif");
        }
        Ok(Box::new(GifSink::create(&self.file_name, self.framerate)?))
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        if self.size.is_some() {
            if let Err(e) = self.end() {
                log::error!("failed to finish video {}: {e}", self.file_name.display());
            }
        }
    }
}
