use std::path::PathBuf;
use std::process;

use clap::Parser;

use mouthkey_core::action::domain::action_target::TargetLocator;
use mouthkey_core::action::domain::event_dispatcher::EventDispatcher;
use mouthkey_core::action::infrastructure::command_locator::CommandLocator;
use mouthkey_core::action::infrastructure::log_locator::LogLocator;
use mouthkey_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use mouthkey_core::detection::infrastructure::replay_landmark_extractor::ReplayLandmarkExtractor;
use mouthkey_core::pipeline::frame_pipeline::FramePipeline;
use mouthkey_core::pipeline::infrastructure::threaded_session_executor::ThreadedSessionExecutor;
use mouthkey_core::pipeline::session_executor::SessionConfig;
use mouthkey_core::pipeline::session_logger::StdoutSessionLogger;
use mouthkey_core::pipeline::watch_mouth_use_case::WatchMouthUseCase;
use mouthkey_core::render::domain::render_sink::RenderSink;
use mouthkey_core::render::infrastructure::image_dump_render_sink::ImageDumpRenderSink;
use mouthkey_core::render::infrastructure::log_render_sink::LogRenderSink;
use mouthkey_core::shared::constants::PREVIEW_SIZE;
use mouthkey_core::shared::settings::Settings;

/// Fires an action every time the watched mouth opens.
#[derive(Parser)]
#[command(name = "mouthkey")]
struct Cli {
    /// Directory of captured frames, played back in file-name order.
    #[arg(long, required_unless_present = "save_config")]
    frames: Option<PathBuf>,

    /// Landmark track (JSON) recorded for the same frames.
    #[arg(long, required_unless_present = "save_config")]
    landmarks: Option<PathBuf>,

    /// Settings file (default: <config dir>/MouthKey/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mouth aspect ratio above which the mouth counts as open.
    #[arg(long)]
    threshold: Option<f64>,

    /// First landmark index of the mouth slice.
    #[arg(long)]
    mouth_start: Option<usize>,

    /// One past the last landmark index of the mouth slice.
    #[arg(long)]
    mouth_end: Option<usize>,

    /// Ratio drop below the threshold required before closing again.
    #[arg(long)]
    hysteresis: Option<f64>,

    /// Consecutive frames a new state must hold before it counts.
    #[arg(long)]
    dwell_frames: Option<u32>,

    /// Program to run on every opening (looked up on PATH).
    #[arg(long)]
    trigger_command: Option<String>,

    /// Argument passed to the trigger program (repeatable).
    #[arg(long = "trigger-arg", allow_hyphen_values = true)]
    trigger_args: Vec<String>,

    /// Write annotated frames and labels to this directory.
    #[arg(long)]
    render_dir: Option<PathBuf>,

    /// Play frames back at this rate instead of as fast as possible.
    #[arg(long)]
    fps: Option<f64>,

    /// Write the effective settings to this file and exit.
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    if let Some(path) = &cli.save_config {
        settings.save(path)?;
        log::info!("Settings written to {}", path.display());
        return Ok(());
    }

    let frames_dir = cli.frames.as_ref().ok_or("--frames is required")?;
    let landmarks_path = cli.landmarks.as_ref().ok_or("--landmarks is required")?;
    validate(&cli)?;

    let mut source = ImageSequenceSource::open(frames_dir)?;
    if source.is_empty() {
        return Err(format!("No images found in {}", frames_dir.display()).into());
    }
    if let Some(fps) = cli.fps {
        source = source.with_fps(fps);
    }
    log::info!("Watching {} frames from {}", source.len(), frames_dir.display());

    let extractor = ReplayLandmarkExtractor::from_file(landmarks_path)?;
    let pipeline = FramePipeline::new(
        Box::new(extractor),
        settings.mouth_range()?,
        settings.classifier_config(),
        settings.diagnostic_interval(),
    );
    let dispatcher = EventDispatcher::new(build_locator(&settings));
    let render = build_render_sink(&cli);

    let config = SessionConfig {
        retry_delay: settings.retry_delay(),
        max_read_failures: settings.max_read_failures,
        render_capacity: settings.render_capacity,
        ..SessionConfig::default()
    };

    let mut use_case = WatchMouthUseCase::new(
        Box::new(source),
        pipeline,
        dispatcher,
        render,
        Box::new(StdoutSessionLogger::default()),
        Box::new(ThreadedSessionExecutor::new()),
        config,
    );
    let report = use_case.execute()?;

    log::info!(
        "Final state {}; {} triggered, {} skipped, {} failed; {} render payloads dropped",
        report.final_state,
        report.dispatch.triggered,
        report.dispatch.skipped,
        report.dispatch.failed,
        report.render_dropped
    );
    Ok(())
}

/// Settings file first, then any flags given on the command line.
fn resolve_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    if let Some(threshold) = cli.threshold {
        settings.mar_threshold = threshold;
    }
    if let Some(start) = cli.mouth_start {
        settings.mouth_start = start;
    }
    if let Some(end) = cli.mouth_end {
        settings.mouth_end = end;
    }
    if let Some(hysteresis) = cli.hysteresis {
        settings.hysteresis = hysteresis;
    }
    if let Some(dwell) = cli.dwell_frames {
        settings.dwell_frames = dwell;
    }
    if let Some(command) = &cli.trigger_command {
        settings.trigger_command = Some(command.clone());
        settings.trigger_args = cli.trigger_args.clone();
    } else if !cli.trigger_args.is_empty() {
        settings.trigger_args = cli.trigger_args.clone();
    }

    settings.validate()?;
    Ok(settings)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(frames) = &cli.frames {
        if !frames.is_dir() {
            return Err(format!("Frames directory not found: {}", frames.display()).into());
        }
    }
    if let Some(landmarks) = &cli.landmarks {
        if !landmarks.is_file() {
            return Err(format!("Landmark track not found: {}", landmarks.display()).into());
        }
    }
    if let Some(fps) = cli.fps {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(format!("FPS must be a positive number, got {fps}").into());
        }
    }
    Ok(())
}

fn build_locator(settings: &Settings) -> Box<dyn TargetLocator> {
    match &settings.trigger_command {
        Some(program) => Box::new(CommandLocator::new(
            program.clone(),
            settings.trigger_args.clone(),
        )),
        None => {
            log::info!("No trigger command configured; openings will only be logged");
            Box::new(LogLocator::new("dry-run"))
        }
    }
}

fn build_render_sink(cli: &Cli) -> Box<dyn RenderSink> {
    match &cli.render_dir {
        Some(dir) => Box::new(ImageDumpRenderSink::new(dir).with_max_size(PREVIEW_SIZE)),
        None => Box::new(LogRenderSink::new()),
    }
}
