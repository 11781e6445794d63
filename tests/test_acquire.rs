mod common;

use std::collections::VecDeque;
use std::io::Cursor;

use cardocr::{
    scan_one, scan_stream, Assembly, CardScanner, FrameOutcome, FrameSource, MjpegStream, NoopObserver,
    ScanConfig, ScanError, StageObserver,
};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, Luma};

use common::*;

const NUMBER: &str = "4532918067215346";

/// In-memory frames, optionally ending in a source error.
struct QueueSource {
    frames: VecDeque<DynamicImage>,
    fail_at_end: bool,
    pulled: usize,
}

impl QueueSource {
    fn new(frames: Vec<DynamicImage>) -> Self {
        Self {
            frames: frames.into(),
            fail_at_end: false,
            pulled: 0,
        }
    }
}

impl FrameSource for QueueSource {
    fn next_frame(&mut self) -> cardocr::error::Result<Option<DynamicImage>> {
        match self.frames.pop_front() {
            Some(frame) => {
                self.pulled += 1;
                Ok(Some(frame))
            }
            None if self.fail_at_end => Err(ScanError::FrameUnavailable("camera went away".into())),
            None => Ok(None),
        }
    }
}

/// Fails while processing the first frame it sees.
#[derive(Default)]
struct FailFirstFrame {
    frame: usize,
}

impl StageObserver for FailFirstFrame {
    fn observe(&mut self, stage: &str, _index: usize, _image: &DynamicImage) {
        if self.frame == 1 {
            panic!("stage {} failed", stage);
        }
    }

    fn begin_frame(&mut self, frame: usize) {
        self.frame = frame;
    }
}

fn scanner() -> CardScanner {
    CardScanner::with_library(ScanConfig::default(), library()).expect("Failed to create scanner")
}

fn card() -> DynamicImage {
    DynamicImage::ImageLuma8(card_region(NUMBER))
}

fn blank() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(CARD_W, CARD_H, Luma([CARD_BACKGROUND])))
}

/// Multipart MJPEG body carrying the given JPEG frames.
fn mjpeg_body(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for frame in frames {
        body.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(frame);
        body.extend_from_slice(b"\r\n");
    }
    body
}

fn card_jpeg() -> Vec<u8> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 95)
        .encode_image(&card_region(NUMBER))
        .expect("Failed to encode card frame");
    out
}

#[test]
fn test_scan_one_reports_miss_and_read() {
    let scanner = scanner();

    assert_eq!(scan_one(&scanner, &blank(), false, &mut NoopObserver), FrameOutcome::Miss);
    match scan_one(&scanner, &card(), false, &mut NoopObserver) {
        FrameOutcome::Read(assembly) => assert_eq!(assembly.digits(), Some(NUMBER)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_scan_one_contains_failure() {
    let mut observer = FailFirstFrame { frame: 1 };

    let outcome = scan_one(&scanner(), &card(), false, &mut observer);

    match outcome {
        FrameOutcome::Failed(reason) => assert!(reason.contains("failed"), "reason: {}", reason),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_stream_stops_at_first_read() {
    let mut source = QueueSource::new(vec![blank(), blank(), card(), blank()]);

    let assembly = scan_stream(&scanner(), &mut source, false, None, &mut NoopObserver).unwrap();

    assert_eq!(assembly.digits(), Some(NUMBER));
    assert_eq!(source.pulled, 3);
}

#[test]
fn test_stream_skips_failed_frame() {
    let mut source = QueueSource::new(vec![card(), card()]);
    let mut observer = FailFirstFrame::default();

    let assembly = scan_stream(&scanner(), &mut source, false, None, &mut observer).unwrap();

    assert!(assembly.found());
    assert_eq!(source.pulled, 2);
}

#[test]
fn test_stream_respects_frame_limit() {
    let mut source = QueueSource::new(vec![blank(), blank(), card()]);

    let assembly = scan_stream(&scanner(), &mut source, false, Some(2), &mut NoopObserver).unwrap();

    assert_eq!(assembly, Assembly::NotFound);
    assert_eq!(source.pulled, 2);
}

#[test]
fn test_exhausted_source_is_not_found() {
    let mut source = QueueSource::new(vec![blank()]);

    let assembly = scan_stream(&scanner(), &mut source, false, None, &mut NoopObserver).unwrap();

    assert_eq!(assembly, Assembly::NotFound);
}

#[test]
fn test_stream_skips_corrupt_frame() {
    let corrupt = vec![0xFF, 0xD8, 0x00, 0x01, 0xFF, 0xD9];
    let mut source = MjpegStream::new(Cursor::new(mjpeg_body(&[corrupt, card_jpeg()])));

    let assembly = scan_stream(&scanner(), &mut source, false, None, &mut NoopObserver).unwrap();

    assert_eq!(assembly.digits(), Some(NUMBER));
}

#[test]
fn test_corrupt_frames_count_toward_limit() {
    let corrupt = vec![0xFF, 0xD8, 0x00, 0x01, 0xFF, 0xD9];
    let mut source = MjpegStream::new(Cursor::new(mjpeg_body(&[corrupt, card_jpeg()])));

    let assembly = scan_stream(&scanner(), &mut source, false, Some(1), &mut NoopObserver).unwrap();

    assert_eq!(assembly, Assembly::NotFound);
}

#[test]
fn test_source_error_propagates() {
    let mut source = QueueSource::new(vec![blank()]);
    source.fail_at_end = true;

    let result = scan_stream(&scanner(), &mut source, false, None, &mut NoopObserver);

    assert!(matches!(result, Err(ScanError::FrameUnavailable(_))));
}

#[test]
fn test_located_frames_without_card_are_misses() {
    let frame = DynamicImage::ImageLuma8(GrayImage::from_pixel(800, 500, Luma([90u8])));
    let mut source = QueueSource::new(vec![frame]);

    let assembly = scan_stream(&scanner(), &mut source, true, None, &mut NoopObserver).unwrap();

    assert_eq!(assembly, Assembly::NotFound);
}
