//! Dataset layout on disk.
//!
//! One batch lands under `<root>/<domain>_task/`: a directory per sample with
//! the two stills, the prompt text and the optional video, plus a
//! `dataset.json` index over the whole batch.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::core::FrameRgba;
use crate::error::{SignalgenError, SignalgenResult};
use crate::model::TaskSample;

/// One `dataset.json` record. Artifact paths are relative to the task
/// directory so the dataset stays relocatable.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub domain: String,
    pub task_type: u8,
    pub prompt: String,
    pub first_frame: String,
    pub final_frame: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

pub struct OutputWriter {
    task_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_root: impl Into<PathBuf>, domain: &str) -> Self {
        let task_dir = output_root.into().join(format!("{domain}_task"));
        Self { task_dir }
    }

    pub fn task_dir(&self) -> &Path {
        &self.task_dir
    }

    pub fn sample_dir(&self, id: &str) -> PathBuf {
        self.task_dir.join(id)
    }

    /// Where a sample's video belongs. The encoder writes here directly while
    /// frames stream, so the path exists before the sample is assembled.
    pub fn video_path(&self, id: &str) -> PathBuf {
        self.sample_dir(id).join("video.mp4")
    }

    /// Write the stills and prompt for one sample and return its index record.
    pub fn write_sample(&self, sample: &TaskSample) -> SignalgenResult<ManifestEntry> {
        let dir = self.sample_dir(&sample.id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create sample directory '{}'", dir.display()))?;

        save_png(&dir.join("first_frame.png"), &sample.first_frame)?;
        save_png(&dir.join("final_frame.png"), &sample.final_frame)?;

        let prompt_path = dir.join("prompt.txt");
        std::fs::write(&prompt_path, &sample.prompt)
            .with_context(|| format!("write prompt '{}'", prompt_path.display()))?;

        Ok(ManifestEntry {
            id: sample.id.clone(),
            domain: sample.domain.clone(),
            task_type: sample.task_type.index(),
            prompt: sample.prompt.clone(),
            first_frame: format!("{}/first_frame.png", sample.id),
            final_frame: format!("{}/final_frame.png", sample.id),
            video: sample
                .video
                .as_ref()
                .map(|_| format!("{}/video.mp4", sample.id)),
        })
    }

    /// Write the batch index and return its path.
    pub fn write_manifest(&self, entries: &[ManifestEntry]) -> SignalgenResult<PathBuf> {
        std::fs::create_dir_all(&self.task_dir)
            .with_context(|| format!("create task directory '{}'", self.task_dir.display()))?;
        let path = self.task_dir.join("dataset.json");
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| SignalgenError::serde(e.to_string()))?;
        std::fs::write(&path, json)
            .with_context(|| format!("write manifest '{}'", path.display()))?;
        Ok(path)
    }
}

fn save_png(path: &Path, frame: &FrameRgba) -> SignalgenResult<()> {
    frame.validate()?;
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
