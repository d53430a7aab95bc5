use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "twibbon", version)]
struct Cli {
    /// Log filter (e.g. `warn`, `debug`, `twibbon=trace`).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a photo into a frame and write a PNG.
    Compose(ComposeArgs),
    /// Print the face-fit plan for a photo as JSON.
    Plan(PlanArgs),
    /// Build a frame manifest from a directory of `layerN` files.
    Manifest(ManifestArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Frame manifest JSON or a directory of `layerN` files.
    #[arg(long)]
    frame: PathBuf,

    /// User photo (png/jpg/jpeg).
    #[arg(long)]
    photo: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Scale percent of the natural fit; overrides the face plan.
    #[arg(long)]
    scale: Option<f64>,

    /// Horizontal pan in frame pixels.
    #[arg(long)]
    x: Option<f64>,

    /// Vertical pan in frame pixels.
    #[arg(long)]
    y: Option<f64>,

    /// Face box `x,y,w,h` in analysis-bitmap pixels.
    #[arg(long, value_parser = parse_face)]
    face: Option<twibbon::Rect>,

    /// Config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Frame manifest JSON or a directory of `layerN` files.
    #[arg(long)]
    frame: PathBuf,

    /// User photo (png/jpg/jpeg).
    #[arg(long)]
    photo: PathBuf,

    /// Face box `x,y,w,h` in analysis-bitmap pixels.
    #[arg(long, value_parser = parse_face)]
    face: twibbon::Rect,

    /// Config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ManifestArgs {
    /// Directory holding `layer1.png`, `layer2.svg`, ...
    #[arg(long)]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Plan(args) => cmd_plan(args),
        Command::Manifest(args) => cmd_manifest(args),
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .with_context(|| format!("invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn parse_face(s: &str) -> Result<twibbon::Rect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("face must be x,y,w,h: {e}"))?;
    match parts.as_slice() {
        &[x, y, w, h] if w >= 0.0 && h >= 0.0 => Ok(twibbon::Rect::new(x, y, x + w, y + h)),
        &[_, _, _, _] => Err("face width/height must be >= 0".to_string()),
        _ => Err(format!("face must be x,y,w,h, got {} values", parts.len())),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<twibbon::TwibbonConfig> {
    Ok(match path {
        Some(p) => twibbon::TwibbonConfig::from_path(p)?,
        None => twibbon::TwibbonConfig::default(),
    })
}

fn read_frame(path: &Path) -> anyhow::Result<twibbon::FrameSpec> {
    if path.is_dir() {
        Ok(twibbon::FrameSpec::discover_dir(path, |p| {
            tracing::info!(fetched = p.fetched, total = p.total, "{}", p.status);
        })?)
    } else {
        Ok(twibbon::FrameSpec::from_path(path)?)
    }
}

fn plan(
    photo: &twibbon::Photo,
    face: twibbon::Rect,
    controller: &twibbon::ControllerBox,
    cfg: &twibbon::TwibbonConfig,
) -> Option<twibbon::FaceFit> {
    let analysis = twibbon::analysis_bitmap(photo, cfg.analysis_max_edge);
    let size = twibbon::Size::new(f64::from(analysis.width()), f64::from(analysis.height()));
    twibbon::plan_face_fit(&[face], size, controller, cfg)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;
    let frame = read_frame(&args.frame)?;
    let photo = twibbon::load_photo(&args.photo, &cfg)?;

    let controller =
        twibbon::ControllerBox::for_frame(cfg.controller_width, frame.width, frame.height);
    let mut session =
        twibbon::TransformSession::new(controller, twibbon::ScaleLimits::from(&cfg));

    if args.scale.is_none()
        && let Some(face) = args.face
    {
        match plan(&photo, face, &controller, &cfg) {
            Some(fit) => {
                session.seed(fit);
            }
            None => eprintln!("face plan rejected, using the natural fit"),
        }
    }

    session.load(photo.image.size());
    if let Some(scale) = args.scale {
        session.set_scale(scale);
    }
    if args.x.is_some() || args.y.is_some() {
        let current = session.state().position;
        session.set_position(twibbon::Vec2::new(
            args.x.unwrap_or(current.x),
            args.y.unwrap_or(current.y),
        ));
    }

    let state = session.state();
    tracing::info!(scale = state.scale, x = state.position.x, y = state.position.y, "compose");

    let decoder = twibbon::FsLayerDecoder::new(&frame.root);
    let compositor = twibbon::Compositor::with_threads(decoder, cfg.render_threads)?;
    let out = compositor.composite(&twibbon::CompositeRequest {
        frame,
        photo: Some(photo),
        state,
    })?;

    twibbon::write_png(&args.out, &out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;
    let frame = read_frame(&args.frame)?;
    let photo = twibbon::load_photo(&args.photo, &cfg)?;
    let controller =
        twibbon::ControllerBox::for_frame(cfg.controller_width, frame.width, frame.height);

    let fit = plan(&photo, args.face, &controller, &cfg);
    let json = serde_json::to_string_pretty(&fit).context("serialize face fit")?;
    println!("{json}");
    Ok(())
}

fn cmd_manifest(args: ManifestArgs) -> anyhow::Result<()> {
    let spec = twibbon::FrameSpec::discover_dir(&args.dir, |p| {
        eprintln!("[{}/{}] {}", p.fetched, p.total, p.status);
    })?;
    let json = serde_json::to_string_pretty(&spec).context("serialize frame manifest")?;
    println!("{json}");
    Ok(())
}
