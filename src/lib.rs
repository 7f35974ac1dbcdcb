#![forbid(unsafe_code)]

pub mod anim;
pub mod core;
pub mod encode;
pub mod error;
pub mod model;
pub mod output;
pub mod prompt;
pub mod render;
pub mod sample;
pub mod sim;
pub mod task;

pub use anim::{SequenceParams, WALK_SAFETY_CAP, sequence};
pub use crate::core::{Canvas, Fps, FrameIndex, FrameRgba};
pub use encode::{
    FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig, encode_frames,
    is_ffmpeg_on_path,
};
pub use error::{SignalgenError, SignalgenResult};
pub use model::{Light, LightId, LightState, Scene, TaskSample, TaskType};
pub use output::{ManifestEntry, OutputWriter};
pub use prompt::PromptInputs;
pub use render::{RenderOptions, RenderScene, SceneRenderer};
pub use sample::{CountdownRange, Sampled, Sampler, TypeMix};
pub use sim::{advance, auto_horizon, step_once};
pub use task::{BatchReport, GenerateConfig, Generator};
