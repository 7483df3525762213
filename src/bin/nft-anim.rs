use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nft_anim::{AnimationSettings, CssColor, SteppedClock, Studio, StudioConfig, TokenMetadata};

#[derive(Parser, Debug)]
#[command(name = "nft-anim", version, about = "Animate layered avatars and export clips")]
struct Cli {
    /// Studio configuration JSON. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct Overrides {
    /// Speech bubble text.
    #[arg(long, global = true)]
    text: Option<String>,

    /// Typing duration in seconds, clamped to [0.1, 10].
    #[arg(long, global = true)]
    duration: Option<f64>,

    /// Type the text once instead of looping.
    #[arg(long, global = true)]
    no_loop: bool,

    /// Background CSS color.
    #[arg(long, global = true)]
    background: Option<String>,

    /// Directory recordings are written to.
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved layer stack as JSON.
    Resolve {
        /// Token metadata JSON.
        #[arg(long)]
        metadata: PathBuf,
    },
    /// Render one frame, bubble included, as a PNG.
    Frame {
        /// Token metadata JSON.
        #[arg(long)]
        metadata: PathBuf,

        /// Time in seconds.
        #[arg(long, default_value_t = 0.0)]
        t: f64,

        /// Output PNG path.
        #[arg(long)]
        out: PathBuf,
    },
    /// Record a clip (requires `ffmpeg` on PATH).
    Record {
        /// Token metadata JSON.
        #[arg(long)]
        metadata: PathBuf,

        /// Disable the arm wave.
        #[arg(long)]
        no_wave: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), &cli.overrides)?;
    match cli.cmd {
        Command::Resolve { metadata } => cmd_resolve(config, &metadata),
        Command::Frame { metadata, t, out } => cmd_frame(config, &metadata, t, &out),
        Command::Record { metadata, no_wave } => cmd_record(config, &metadata, no_wave),
    }
}

fn load_config(path: Option<&Path>, o: &Overrides) -> anyhow::Result<StudioConfig> {
    let mut cfg = match path {
        Some(path) => StudioConfig::load(path)?,
        None => StudioConfig::default(),
    };
    if let Some(text) = &o.text {
        cfg.settings.bubble_text = text.clone();
    }
    if let Some(secs) = o.duration {
        cfg.settings.typing_duration_secs = AnimationSettings::clamp_duration(secs);
    }
    if o.no_loop {
        cfg.settings.is_typing_loop = false;
    }
    if let Some(bg) = &o.background {
        cfg.settings.background_color = CssColor::parse(bg)?;
    }
    if let Some(dir) = &o.out_dir {
        cfg.output_dir = dir.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn read_metadata(path: &Path) -> anyhow::Result<TokenMetadata> {
    TokenMetadata::from_path(path)
        .with_context(|| format!("load token metadata '{}'", path.display()))
}

fn cmd_resolve(config: StudioConfig, metadata: &Path) -> anyhow::Result<()> {
    let meta = read_metadata(metadata)?;
    let mut studio = Studio::new(config, SteppedClock::new())?;
    let stack = studio.load_token(&meta)?;
    println!("{}", serde_json::to_string_pretty(&*stack)?);
    Ok(())
}

fn cmd_frame(config: StudioConfig, metadata: &Path, t: f64, out: &Path) -> anyhow::Result<()> {
    let meta = read_metadata(metadata)?;
    let mut studio = Studio::new(config, SteppedClock::new())?;
    studio.load_token(&meta)?;
    let frame = studio.preview_frame(t)?;

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.write_png(out)?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_record(config: StudioConfig, metadata: &Path, no_wave: bool) -> anyhow::Result<()> {
    let meta = read_metadata(metadata)?;
    let mut studio = Studio::new(config, SteppedClock::new())?;
    studio.set_wave_enabled(!no_wave);
    studio.load_token(&meta)?;

    let summary = studio.record_to_file()?;
    studio.stop();
    match &summary.out_path {
        Some(path) => eprintln!(
            "wrote {} ({} frames, {:.2}s)",
            path.display(),
            summary.frames,
            summary.duration.as_secs_f64()
        ),
        None => eprintln!("recorded {} frames", summary.frames),
    }
    Ok(())
}
