//! Frame-by-frame acquisition loop.

use std::panic::{self, AssertUnwindSafe};

use crate::detection::CardScanner;
use crate::error::{Result, ScanError};
use crate::models::Assembly;
use crate::pipeline::StageObserver;
use crate::source::FrameSource;

/// How a single frame was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame produced a full card number.
    Read(Assembly),
    /// Nothing usable in this frame.
    Miss,
    /// Processing the frame failed; the frame is treated as a miss.
    Failed(String),
}

/// Scan one frame, turning a processing failure into `FrameOutcome::Failed`
/// so a streaming loop can move on to the next frame.
pub fn scan_one(
    scanner: &CardScanner,
    frame: &image::DynamicImage,
    locate_card: bool,
    observer: &mut dyn StageObserver,
) -> FrameOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        if locate_card {
            scanner.scan_frame_observed(frame, observer)
        } else {
            scanner.read_card_observed(frame, observer)
        }
    }));

    match result {
        Ok(Assembly::NotFound) => FrameOutcome::Miss,
        Ok(assembly) => FrameOutcome::Read(assembly),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown failure".to_string());
            FrameOutcome::Failed(reason)
        }
    }
}

/// Pull frames until one yields a card number.
///
/// Stops at the first read, when the source is exhausted, or after
/// `max_frames` frames. A frame that fails to decode counts as a miss; any
/// other source error ends the loop and is returned.
pub fn scan_stream(
    scanner: &CardScanner,
    source: &mut dyn FrameSource,
    locate_card: bool,
    max_frames: Option<usize>,
    observer: &mut dyn StageObserver,
) -> Result<Assembly> {
    let mut frames = 0usize;
    while max_frames.is_none_or(|max| frames < max) {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::debug!("Frame source exhausted after {} frames", frames);
                break;
            }
            Err(ScanError::CorruptFrame(e)) => {
                frames += 1;
                log::warn!("Frame {} skipped: {}", frames, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        frames += 1;
        observer.begin_frame(frames);

        match scan_one(scanner, &frame, locate_card, observer) {
            FrameOutcome::Read(assembly) => {
                log::debug!("Card read on frame {}", frames);
                return Ok(assembly);
            }
            FrameOutcome::Miss => log::debug!("Frame {}: no card number", frames),
            FrameOutcome::Failed(reason) => log::warn!("Frame {} skipped: {}", frames, reason),
        }
    }
    Ok(Assembly::NotFound)
}
