use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use ffd_morph::{CpuRasterizer, ImageLibrary, MorphSession, Project, SessionOpts};

#[derive(Parser, Debug)]
#[command(name = "ffd-morph", version)]
struct Cli {
    /// Session options JSON (resolution, pick radius, background, export fps cap).
    #[arg(long, global = true)]
    opts: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single blended frame as a PNG.
    Frame(FrameArgs),
    /// Export the full morph as a looping animated GIF.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Blend factor in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    t: f32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Play a single forward sweep instead of forward-then-backward.
    #[arg(long, default_value_t = false)]
    one_way: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let opts = load_opts(cli.opts.as_deref())?;
    match cli.cmd {
        Command::Frame(args) => cmd_frame(opts, args),
        Command::Export(args) => cmd_export(opts, args),
    }
}

fn load_opts(path: Option<&std::path::Path>) -> anyhow::Result<SessionOpts> {
    let Some(path) = path else {
        return Ok(SessionOpts::default());
    };
    let f = std::fs::File::open(path)
        .with_context(|| format!("open options '{}'", path.display()))?;
    let opts: SessionOpts = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse options JSON '{}'", path.display()))?;
    opts.validate()?;
    Ok(opts)
}

fn open(
    opts: SessionOpts,
    project: &std::path::Path,
) -> anyhow::Result<(MorphSession, CpuRasterizer)> {
    let mut session = MorphSession::new(opts)?;
    let mut rasterizer = CpuRasterizer::default();
    let mut library = ImageLibrary::new();
    Project::open(project, &mut session, &mut library, &mut rasterizer)?;
    Ok((session, rasterizer))
}

fn cmd_frame(opts: SessionOpts, args: FrameArgs) -> anyhow::Result<()> {
    let (mut session, mut rasterizer) = open(opts, &args.project)?;
    session.animation_mut().set_t(args.t);
    let frame = session.capture_frame(&mut rasterizer)?;
    ffd_morph::save_frame_png(&frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(opts: SessionOpts, args: ExportArgs) -> anyhow::Result<()> {
    let (mut session, mut rasterizer) = open(opts, &args.project)?;
    if args.one_way {
        session.animation_mut().set_bidirectional(false);
    }
    let frames = session.export_gif(&mut rasterizer, &args.out)?;

    eprintln!("wrote {} ({frames} frames)", args.out.display());
    Ok(())
}
