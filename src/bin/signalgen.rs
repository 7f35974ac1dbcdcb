use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signalgen::{Canvas, GenerateConfig, Generator, OutputWriter, TaskType, TypeMix};

#[derive(Parser, Debug)]
#[command(name = "signalgen", version)]
struct Cli {
    /// Number of samples to generate.
    #[arg(long)]
    num_samples: usize,

    /// Output root; the batch lands under `<output>/traffic_light_task/`.
    #[arg(long, default_value = "data/questions")]
    output: PathBuf,

    /// RNG seed. Omit for a fresh batch every run.
    #[arg(long)]
    seed: Option<u64>,

    /// Skip video encoding; stills and prompts are still written.
    #[arg(long)]
    no_videos: bool,

    /// Restrict generation to these task types (1-4), uniformly weighted.
    /// Overrides the ratio flags.
    #[arg(long, value_name = "TYPE", num_args = 1..)]
    types: Option<Vec<u8>>,

    /// Weight for type 1 (basic countdown).
    #[arg(long, value_name = "RATIO")]
    type1_ratio: Option<f64>,

    /// Weight for type 2 (extended countdown).
    #[arg(long, value_name = "RATIO")]
    type2_ratio: Option<f64>,

    /// Weight for type 3 (dual countdown).
    #[arg(long, value_name = "RATIO")]
    type3_ratio: Option<f64>,

    /// Weight for type 4 (explicit horizon).
    #[arg(long, value_name = "RATIO")]
    type4_ratio: Option<f64>,

    /// Canvas size in pixels.
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"], default_values_t = [600u32, 600u32])]
    image_size: Vec<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signalgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mix = resolve_mix(&cli)?;
    let canvas = Canvas::new(cli.image_size[0], cli.image_size[1])?;

    let config = GenerateConfig {
        canvas,
        seed: cli.seed,
        generate_videos: !cli.no_videos,
        mix,
        font_dir: Some(cli.output.join("fonts")),
        ..GenerateConfig::default()
    };

    let writer = OutputWriter::new(&cli.output, &config.domain);
    let mut generator = Generator::new(config)?;
    let report = generator.generate(cli.num_samples, &writer)?;

    for (index, reason) in &report.failures {
        eprintln!("sample {index} failed: {reason}");
    }
    eprintln!(
        "wrote {} samples to {} (types 1-4: {}/{}/{}/{})",
        report.written,
        writer.task_dir().display(),
        report.per_type[0],
        report.per_type[1],
        report.per_type[2],
        report.per_type[3],
    );
    Ok(())
}

/// Resolve the task-type distribution from the CLI flags: an explicit subset
/// is uniform; otherwise the ratio flags override the default weights and the
/// result is normalized.
fn resolve_mix(cli: &Cli) -> anyhow::Result<TypeMix> {
    if let Some(types) = &cli.types {
        let mut subset = Vec::with_capacity(types.len());
        for t in types {
            subset.push(TaskType::from_index(*t)?);
        }
        return Ok(TypeMix::uniform(&subset)?);
    }

    let mut weights = Vec::with_capacity(4);
    for (ty, default_weight) in TypeMix::default().weights() {
        let override_weight = match ty {
            TaskType::Basic => cli.type1_ratio,
            TaskType::Extended => cli.type2_ratio,
            TaskType::DualCountdown => cli.type3_ratio,
            TaskType::ExplicitHorizon => cli.type4_ratio,
        };
        weights.push((*ty, override_weight.unwrap_or(*default_weight)));
    }
    Ok(TypeMix::new(&weights)?)
}
