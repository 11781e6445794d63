use image::DynamicImage;
use std::path::{Path, PathBuf};
use anyhow::Result;

/// Receives intermediate images as the scanner moves through its stages.
///
/// `index` distinguishes several images emitted by the same stage, e.g. one
/// per digit group. Observers must not influence the scan result.
pub trait StageObserver {
    fn observe(&mut self, stage: &str, index: usize, image: &DynamicImage);

    /// Called by the acquisition loop before each frame, counting from 1.
    fn begin_frame(&mut self, _frame: usize) {}
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn observe(&mut self, _stage: &str, _index: usize, _image: &DynamicImage) {}
}

/// Writes every stage image to a debug directory.
///
/// Layout: `<dir>/<NN>_<stage>/<index>.png`, stage directories numbered in
/// the order the stages first report.
#[derive(Debug)]
pub struct DebugDirObserver {
    output_dir: PathBuf,
    stages: Vec<String>,
    frame: usize,
}

impl DebugDirObserver {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self {
            output_dir,
            stages: Vec::new(),
            frame: 0,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn stage_dir(&mut self, stage: &str) -> PathBuf {
        let position = match self.stages.iter().position(|s| s == stage) {
            Some(position) => position,
            None => {
                self.stages.push(stage.to_string());
                self.stages.len() - 1
            }
        };
        let dir_name = format!("{:02}_{}", position + 1, stage.to_lowercase().replace(' ', "_"));
        self.output_dir.join(dir_name)
    }

    /// Frames after the first get an `fNNN-` prefix so a streamed scan does
    /// not overwrite earlier frames.
    fn filename(&self, index: usize) -> String {
        if self.frame <= 1 {
            format!("{:02}.png", index + 1)
        } else {
            format!("f{:03}-{:02}.png", self.frame, index + 1)
        }
    }

    fn save(&mut self, stage: &str, index: usize, image: &DynamicImage) -> Result<PathBuf> {
        let step_dir = self.stage_dir(stage);
        std::fs::create_dir_all(&step_dir)?;

        let output_path = step_dir.join(self.filename(index));
        image.save(&output_path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        Ok(output_path)
    }
}

impl StageObserver for DebugDirObserver {
    fn observe(&mut self, stage: &str, index: usize, image: &DynamicImage) {
        match self.save(stage, index, image) {
            Ok(path) => log::trace!("Debug: saved {}", path.display()),
            Err(e) => log::warn!("Debug output for stage '{}' dropped: {}", stage, e),
        }
    }

    fn begin_frame(&mut self, frame: usize) {
        self.frame = frame;
    }
}
