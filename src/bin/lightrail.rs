use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "lightrail", version, about = "Light-trail effect for a camera or video file")]
struct Cli {
    /// Camera index (all digits) or video file path.
    #[arg(short = 'i', long = "in", default_value = "0")]
    input: String,

    /// Playback speed multiplier of the recording [default: 1].
    #[arg(short, long, allow_negative_numbers = true)]
    speed: Option<i64>,

    /// Shrink both frame dimensions by this factor [default: 4].
    #[arg(short, long, allow_negative_numbers = true)]
    downscale: Option<i64>,

    /// Use the decaying residual compositor instead of the echo window.
    #[arg(short, long)]
    residual: bool,

    /// Residual decay per frame, in (0, 1] [default: 0.99].
    #[arg(long)]
    decay: Option<f64>,

    /// Echo window length in frames [default: 60].
    #[arg(long)]
    echoes: Option<usize>,

    /// Echo blend between window max and window mean [default: balanced].
    #[arg(long, value_enum)]
    blend: Option<BlendChoice>,

    /// Output video path; `.avi` records MJPEG, anything else H.264 [default: out.avi].
    #[arg(long)]
    out: Option<PathBuf>,

    /// Do not record.
    #[arg(long)]
    no_record: bool,

    /// Capture on a background thread and composite the newest frame each tick.
    #[arg(long)]
    async_feed: bool,

    /// Keep the latest composite in this PNG while running.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Write the preview every N frames.
    #[arg(long, default_value_t = 15)]
    preview_every: u64,

    /// JSON config file; flags given on the command line override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. `info`, `lightrail=debug`).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BlendChoice {
    MaxOnly,
    Balanced,
    Bright,
}

impl From<BlendChoice> for lightrail::BlendWeights {
    fn from(b: BlendChoice) -> Self {
        match b {
            BlendChoice::MaxOnly => Self::MAX_ONLY,
            BlendChoice::Balanced => Self::BALANCED,
            BlendChoice::Bright => Self::BRIGHT,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = build_config(&cli)?;
    lightrail::init_logging(&cfg.logging);

    let mut playback = lightrail::PlaybackLoop::new(cfg)?;
    let cfg = playback.config().clone();

    let quit = lightrail::QuitSignal::new();
    quit.install_ctrlc()?;
    quit.watch_for_quit_key(std::io::BufReader::new(std::io::stdin()))?;
    let mut display: Box<dyn lightrail::Display> = match &cli.preview {
        Some(path) => Box::new(lightrail::SnapshotDisplay::new(
            path,
            cli.preview_every,
            quit.clone(),
        )),
        None => Box::new(lightrail::HeadlessDisplay::new(quit.clone())),
    };

    let mut sink = cfg.record.then(|| lightrail::FfmpegSink::new(&cfg.output));
    let id = lightrail::SourceId::parse(&cli.input);
    let report = playback.run(
        &lightrail::FfmpegSourceOpener,
        &id,
        sink.as_mut().map(|s| s as &mut dyn lightrail::FrameSink),
        display.as_mut(),
    )?;

    eprintln!(
        "{:?} after {} frames ({} composited, {} written)",
        report.state, report.frames_read, report.frames_composited, report.frames_written
    );
    if cfg.record {
        eprintln!("wrote {}", cfg.output.display());
    }
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<lightrail::TrailConfig> {
    let mut cfg = match &cli.config {
        Some(path) => lightrail::TrailConfig::from_json_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => lightrail::TrailConfig::default(),
    };

    if let Some(v) = cli.speed {
        cfg.speed = v;
    }
    if let Some(v) = cli.downscale {
        cfg.downscale = v;
    }
    if cli.residual {
        cfg.mode = lightrail::TrailMode::Residual;
    }
    if let Some(v) = cli.decay {
        cfg.decay = v;
    }
    if let Some(v) = cli.echoes {
        cfg.num_echoes = v;
    }
    if let Some(b) = cli.blend {
        cfg.weights = b.into();
    }
    if let Some(out) = &cli.out {
        cfg.output = out.clone();
    }
    if cli.no_record {
        cfg.record = false;
    }
    if cli.async_feed {
        cfg.async_feed = true;
    }
    if let Some(level) = &cli.log_level {
        cfg.logging.level = level.clone();
    }
    if cli.log_json {
        cfg.logging.json = true;
    }
    Ok(cfg)
}
