//! Frame sources feeding the scanner.
//!
//! A source hands out one frame per call and blocks until that frame is
//! available. The scanner never learns where frames come from.

use image::{DynamicImage, ImageFormat};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::StreamConfig;
use crate::error::{Result, ScanError};

/// Supplier of frames for the acquisition loop.
pub trait FrameSource {
    /// Next frame, or `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>>;
}

/// A single still image read from disk.
pub struct ImageFileSource {
    path: PathBuf,
    consumed: bool,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            consumed: false,
        }
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        if self.consumed {
            return Ok(None);
        }
        self.consumed = true;

        let img = image::open(&self.path)
            .map_err(|e| ScanError::FrameUnavailable(format!("{}: {}", self.path.display(), e)))?;
        log::debug!("Image loaded: {}x{}", img.width(), img.height());
        Ok(Some(img))
    }
}

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];
const READ_CHUNK: usize = 16 * 1024;
/// Give up on a frame that grows past this without an end marker.
const MAX_FRAME_BYTES: usize = 32 * 1024 * 1024;

/// Motion-JPEG stream, as served by phone camera apps over HTTP.
///
/// Multipart headers and boundaries are skipped; frames are cut at the JPEG
/// start and end markers.
pub struct MjpegStream<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    eof: bool,
}

impl MjpegStream<reqwest::blocking::Response> {
    /// Open `http://host:port/path` and start reading frames from it.
    pub fn connect(stream: &StreamConfig) -> Result<Self> {
        let url = stream.url();
        log::info!("Connecting to video stream {}", url);

        // No overall timeout: the body of a live stream never ends
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(stream.timeout_secs))
            .timeout(None)
            .build()?;

        let response = client
            .get(&url)
            .header("User-Agent", "cardocr")
            .send()?;

        if !response.status().is_success() {
            return Err(ScanError::FrameUnavailable(format!(
                "{} answered HTTP {}",
                url,
                response.status()
            )));
        }
        Ok(Self::new(response))
    }
}

impl<R: Read> MjpegStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            eof: false,
        }
    }

    /// Raw bytes of the next complete JPEG, or `None` at end of stream.
    /// A frame cut off by the end of the stream is discarded.
    pub fn next_jpeg(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match find_marker(&self.buffer, SOI, 0) {
                Some(start) => {
                    if let Some(end) = find_marker(&self.buffer, EOI, start + 2) {
                        let jpeg = self.buffer[start..end + 2].to_vec();
                        self.buffer.drain(..end + 2);
                        return Ok(Some(jpeg));
                    }
                    self.buffer.drain(..start);
                    if self.buffer.len() > MAX_FRAME_BYTES {
                        self.buffer.clear();
                        return Err(ScanError::FrameUnavailable(
                            "frame exceeds size limit without end marker".into(),
                        ));
                    }
                }
                None => {
                    // A trailing 0xFF may be the first half of a start marker
                    let keep_from = self.buffer.len().saturating_sub(1);
                    self.buffer.drain(..keep_from);
                }
            }

            if self.eof {
                return Ok(None);
            }
            let mut chunk = [0u8; READ_CHUNK];
            let n = self.reader.read(&mut chunk)?;
            if n == 0 {
                self.eof = true;
            } else {
                self.buffer.extend_from_slice(&chunk[..n]);
            }
        }
    }
}

impl<R: Read> FrameSource for MjpegStream<R> {
    fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        let Some(jpeg) = self.next_jpeg()? else {
            return Ok(None);
        };
        let frame = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)?;
        Ok(Some(frame))
    }
}

fn find_marker(data: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    if from >= data.len() {
        return None;
    }
    data[from..]
        .windows(2)
        .position(|w| w == marker)
        .map(|pos| pos + from)
}
