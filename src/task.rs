//! Batch task generation.
//!
//! `Generator` owns the run's RNG, sampler, renderer and sequencing settings;
//! every sample flows sampler → simulator → renderer → sequencer → encoder →
//! writer. Configuration problems are fatal at construction, per-sample
//! failures are isolated and reported in the batch summary.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, instrument, warn};

use crate::anim::{SequenceParams, sequence};
use crate::core::{Canvas, Fps};
use crate::encode::{FfmpegSink, FfmpegSinkOpts, SinkConfig, encode_frames, is_ffmpeg_on_path};
use crate::error::{SignalgenError, SignalgenResult};
use crate::model::{TaskSample, TaskType};
use crate::output::OutputWriter;
use crate::prompt::{self, PromptInputs};
use crate::render::{RenderOptions, RenderScene, SceneRenderer};
use crate::sample::{CountdownRange, Sampler, TypeMix};
use crate::sim::advance;

#[derive(Clone, Debug)]
pub struct GenerateConfig {
    /// Name prefix for sample ids and the task directory.
    pub domain: String,
    pub canvas: Canvas,
    /// `None` seeds from the OS; a run is reproducible only when set.
    pub seed: Option<u64>,
    pub generate_videos: bool,
    pub video_fps: Fps,
    pub hold_count: u32,
    pub frames_per_step: u32,
    /// Distribution over task types.
    pub mix: TypeMix,
    pub basic_range: CountdownRange,
    pub extended_range: CountdownRange,
    pub show_zero_countdown: bool,
    pub font_dir: Option<PathBuf>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            domain: "traffic_light".to_string(),
            canvas: Canvas {
                width: 600,
                height: 600,
            },
            seed: None,
            generate_videos: true,
            video_fps: Fps { num: 2, den: 1 },
            hold_count: 5,
            frames_per_step: 2,
            mix: TypeMix::default(),
            basic_range: CountdownRange { lo: 2, hi: 10 },
            extended_range: CountdownRange { lo: 8, hi: 20 },
            show_zero_countdown: false,
            font_dir: None,
        }
    }
}

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: usize,
    /// Sample counts indexed by task type.
    pub per_type: [usize; 4],
    /// (sample index, reason) for every failed sample.
    pub failures: Vec<(usize, String)>,
    pub manifest_path: Option<PathBuf>,
}

impl BatchReport {
    pub fn count_for(&self, ty: TaskType) -> usize {
        self.per_type[(ty.index() - 1) as usize]
    }
}

pub struct Generator {
    config: GenerateConfig,
    sampler: Sampler,
    renderer: SceneRenderer,
    seq: SequenceParams,
    rng: SmallRng,
    video_enabled: bool,
}

impl Generator {
    pub fn new(config: GenerateConfig) -> SignalgenResult<Self> {
        // Config structs carry public fields, so everything is re-checked
        // through the validating constructors before the run starts.
        Canvas::new(config.canvas.width, config.canvas.height)?;
        if config.generate_videos
            && (!config.canvas.width.is_multiple_of(2) || !config.canvas.height.is_multiple_of(2))
        {
            return Err(SignalgenError::validation(
                "canvas width/height must be even when videos are enabled",
            ));
        }
        Fps::new(config.video_fps.num, config.video_fps.den)?;
        let seq = SequenceParams {
            hold_count: config.hold_count,
            frames_per_step: config.frames_per_step,
        };
        seq.validate()?;

        let basic = CountdownRange::new(config.basic_range.lo, config.basic_range.hi)?;
        let extended = CountdownRange::new(config.extended_range.lo, config.extended_range.hi)?;
        let sampler = Sampler::new(config.mix.clone(), basic, extended)?;

        let renderer = SceneRenderer::new(RenderOptions {
            canvas: config.canvas,
            show_zero_countdown: config.show_zero_countdown,
            font_dir: config.font_dir.clone(),
        });

        let video_enabled = if config.generate_videos {
            let found = is_ffmpeg_on_path();
            if !found {
                warn!("ffmpeg not found on PATH, videos will be skipped");
            }
            found
        } else {
            false
        };

        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        Ok(Self {
            config,
            sampler,
            renderer,
            seq,
            rng,
            video_enabled,
        })
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Whether this run will actually encode videos.
    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Generate one sample. When `video_path` is set the walk is encoded
    /// there; the stills are always part of the returned sample.
    #[instrument(skip(self, video_path))]
    pub fn generate_sample(
        &mut self,
        id: &str,
        video_path: Option<&Path>,
    ) -> SignalgenResult<TaskSample> {
        let sampled = self.sampler.sample(&mut self.rng);
        let initial = sampled.scene;
        let final_scene = advance(initial, sampled.elapsed)?;

        let prompt = prompt::choose(
            sampled.task_type,
            &mut self.rng,
            PromptInputs {
                countdown_a: initial.light_a.countdown,
                countdown_b: initial.light_b.countdown,
                time_elapsed: sampled.elapsed,
            },
        );

        let first_frame = self.renderer.render(initial)?;
        let final_frame = self.renderer.render(final_scene)?;

        let video = match video_path {
            Some(path) => {
                let frames = sequence(&self.renderer, initial, final_scene, self.seq)?;
                let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(path));
                let cfg = SinkConfig {
                    width: self.config.canvas.width,
                    height: self.config.canvas.height,
                    fps: self.config.video_fps,
                };
                encode_frames(&mut sink, cfg, &frames)?;
                Some(path.to_path_buf())
            }
            None => None,
        };

        Ok(TaskSample {
            id: id.to_string(),
            domain: self.config.domain.clone(),
            task_type: sampled.task_type,
            prompt,
            first_frame,
            final_frame,
            video,
        })
    }

    /// Generate `n` samples into `writer`'s task directory and write the
    /// batch manifest. A failed sample is logged and recorded, the batch
    /// keeps going.
    #[instrument(skip(self, writer))]
    pub fn generate(&mut self, n: usize, writer: &OutputWriter) -> SignalgenResult<BatchReport> {
        let mut report = BatchReport::default();
        let mut entries = Vec::with_capacity(n);

        for i in 0..n {
            let id = format!("{}_{:04}", self.config.domain, i);
            let video_path = self.video_enabled.then(|| writer.video_path(&id));

            match self.generate_sample(&id, video_path.as_deref()) {
                Ok(sample) => match writer.write_sample(&sample) {
                    Ok(entry) => {
                        report.per_type[(sample.task_type.index() - 1) as usize] += 1;
                        report.written += 1;
                        entries.push(entry);
                    }
                    Err(err) => {
                        warn!(id = %id, error = %err, "failed to write sample");
                        report.failures.push((i, err.to_string()));
                    }
                },
                Err(err) => {
                    warn!(id = %id, error = %err, "failed to generate sample");
                    report.failures.push((i, err.to_string()));
                }
            }

            if (i + 1) % 10 == 0 {
                info!(done = i + 1, total = n, "batch progress");
            }
        }

        report.manifest_path = Some(writer.write_manifest(&entries)?);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenerateConfig {
        GenerateConfig {
            canvas: Canvas {
                width: 64,
                height: 64,
            },
            seed: Some(77),
            generate_videos: false,
            ..GenerateConfig::default()
        }
    }

    #[test]
    fn construction_rejects_bad_fps() {
        let cfg = GenerateConfig {
            video_fps: Fps { num: 0, den: 1 },
            ..config()
        };
        assert!(Generator::new(cfg).is_err());
    }

    #[test]
    fn construction_rejects_empty_range() {
        let cfg = GenerateConfig {
            basic_range: CountdownRange { lo: 9, hi: 2 },
            ..config()
        };
        assert!(Generator::new(cfg).is_err());
    }

    #[test]
    fn construction_rejects_zero_hold() {
        let cfg = GenerateConfig {
            hold_count: 0,
            ..config()
        };
        assert!(Generator::new(cfg).is_err());
    }

    #[test]
    fn odd_canvas_is_fatal_only_with_videos() {
        let odd = Canvas {
            width: 63,
            height: 64,
        };
        let with_videos = GenerateConfig {
            canvas: odd,
            generate_videos: true,
            ..config()
        };
        assert!(Generator::new(with_videos).is_err());

        let stills_only = GenerateConfig {
            canvas: odd,
            ..config()
        };
        assert!(Generator::new(stills_only).is_ok());
    }

    #[test]
    fn videos_disabled_without_request() {
        let generator = Generator::new(config()).unwrap();
        assert!(!generator.video_enabled());
    }

    #[test]
    fn same_seed_reproduces_samples() {
        let mut a = Generator::new(config()).unwrap();
        let mut b = Generator::new(config()).unwrap();
        for i in 0..4 {
            let id = format!("traffic_light_{i:04}");
            let sa = a.generate_sample(&id, None).unwrap();
            let sb = b.generate_sample(&id, None).unwrap();
            assert_eq!(sa.task_type, sb.task_type);
            assert_eq!(sa.prompt, sb.prompt);
            assert_eq!(sa.first_frame, sb.first_frame);
            assert_eq!(sa.final_frame, sb.final_frame);
        }
    }

    #[test]
    fn sample_stills_match_canvas() {
        let mut generator = Generator::new(config()).unwrap();
        let sample = generator.generate_sample("traffic_light_0000", None).unwrap();
        assert_eq!(sample.first_frame.width, 64);
        assert_eq!(sample.first_frame.height, 64);
        assert!(sample.video.is_none());
    }
}
