use clap::{Parser, ValueEnum};
use image::ImageReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cardsight::classify::recognition::OcrsRecognizer;
use cardsight::detection::templates::{AssetStore, DirectoryAssetStore};
use cardsight::{Frame, FrameOutcome, FramePipeline, HeuristicClassifier, PipelineConfig, Strategy, TemplateClassifier};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// Match rank and suit glyph templates
    Template,
    /// Colour and intensity heuristics, no templates needed
    Heuristic,
    /// Whole-frame text recognition, results arrive asynchronously
    Ocr,
}

#[derive(Parser)]
#[command(name = "cardsight")]
#[command(about = "Find playing cards in a sequence of frames and label them")]
struct Cli {
    /// Frames to replay, in capture order
    #[arg(value_name = "FRAME", required = true)]
    frames: Vec<PathBuf>,

    /// Classification strategy
    #[arg(short, long, value_enum, default_value = "template")]
    strategy: StrategyArg,

    /// Directory holding ranks/*.png, suits/*.png and an optional font.ttf
    #[arg(long, value_name = "DIR", default_value = "assets")]
    assets: PathBuf,

    /// JSON pipeline configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Simulated time between captured frames
    #[arg(long, default_value_t = 500)]
    frame_interval_ms: u64,

    /// Write composited frames here
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Save intermediate analysis images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Directory with the ocrs models (defaults to ~/.cache/ocrs)
    #[arg(long, value_name = "DIR")]
    ocr_models: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let assets = Arc::new(DirectoryAssetStore::new(&args.assets));

    let strategy = match args.strategy {
        StrategyArg::Template => {
            Strategy::Regions(Arc::new(TemplateClassifier::new(assets.clone(), config.match_threshold)))
        }
        StrategyArg::Heuristic => Strategy::Regions(Arc::new(HeuristicClassifier {
            saturation_max: config.saturation_max,
            value_min: config.value_min,
        })),
        StrategyArg::Ocr => Strategy::TextRecognition {
            recognizer: Arc::new(OcrsRecognizer::new(args.ocr_models.as_deref())?),
            runtime: runtime.handle().clone(),
        },
    };

    let mut pipeline = FramePipeline::new(config, strategy).with_font(assets.load_font());
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }
    if let Some(out) = &args.out {
        std::fs::create_dir_all(out)?;
    }

    let start = Instant::now();
    let mut pending = Vec::new();

    for (idx, path) in args.frames.iter().enumerate() {
        let image = ImageReader::open(path)?
            .decode()
            .map_err(|e| anyhow::anyhow!("Failed to decode {}: {}", path.display(), e))?
            .to_rgba8();
        let timestamp = start + Duration::from_millis(args.frame_interval_ms * idx as u64);
        let mut frame = Frame::new(image, timestamp);

        match pipeline.process_frame(&mut frame) {
            FrameOutcome::Submitted(handle) => pending.push(handle),
            FrameOutcome::Analyzed | FrameOutcome::Throttled => {}
        }

        let text = pipeline.state().display_text();
        println!("{}: {}", path.display(), if text.is_empty() { "-" } else { text.as_str() });

        if let Some(out) = &args.out {
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| format!("frame_{:04}.png", idx).into());
            frame.image.save(out.join(name))?;
        }
    }

    // let outstanding recognitions land before reporting the final text
    for handle in pending {
        if let Err(e) = runtime.block_on(handle) {
            warn!("Recognition task failed: {}", e);
        }
    }

    let stats = pipeline.stats();
    info!(
        "Processed {} frames: {} analysed, {} submitted, {} throttled",
        stats.frames, stats.analyzed, stats.submitted, stats.throttled
    );
    println!("Final: {}", pipeline.state().display_text());

    Ok(())
}
