use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use frame_source as fsrc;
use frame_source::{CaptureDriver, CaptureMetrics, Frame, SourceConfig, WebcamSource};

#[derive(Parser, Debug)]
#[command(
    name = "gazecap",
    version,
    about = "Webcam frame source for eye tracking",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Backend {
    Mock,
    Opencv,
    Still,
}

impl From<Backend> for fsrc::BackendKind {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Mock => fsrc::BackendKind::Mock,
            Backend::Opencv => fsrc::BackendKind::Opencv,
            Backend::Still => fsrc::BackendKind::Still,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List capture backends compiled into this binary
    Backends,
    /// Connect to a camera, read frames, print a summary per frame
    Grab {
        /// YAML config file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Camera index
        #[arg(long)]
        device: Option<u32>,
        /// Frame mode: R, G, B or RGB (greyscale)
        #[arg(long)]
        mode: Option<String>,
        /// Capture backend
        #[arg(long, value_enum)]
        backend: Option<Backend>,
        /// Image directory for the still backend
        #[arg(long)]
        still_dir: Option<PathBuf>,
        /// Number of frames to read
        #[arg(long, default_value_t = 1u32)]
        count: u32,
        /// Consecutive empty reads tolerated per frame
        #[arg(long, default_value_t = 10u32)]
        retries: u32,
        /// Write frames as PNG into this directory (image-io builds)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Print one JSON object per frame
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
        /// Dump Prometheus metrics when done
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
    /// Print the effective config as JSON
    ConfigShow {
        /// YAML config file
        #[arg(long)]
        file: PathBuf,
    },
}

struct GrabOptions {
    count: u32,
    retries: u32,
    out_dir: Option<PathBuf>,
    json: bool,
    metrics: bool,
}

#[derive(Serialize)]
struct FrameSummary {
    index: u32,
    width: u32,
    height: u32,
    mode: String,
    mean: f64,
    empty_reads: u32,
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Backends => list_backends(),
        Commands::Grab {
            config,
            device,
            mode,
            backend,
            still_dir,
            count,
            retries,
            out_dir,
            json,
            metrics,
        } => {
            let mut cfg = match config {
                Some(path) => fsrc::load_config_file(&path)?,
                None => SourceConfig::default(),
            };
            if let Some(d) = device {
                cfg.camera_index = d;
            }
            if let Some(m) = mode {
                cfg.mode = m;
            }
            if let Some(b) = backend {
                cfg.backend = b.into();
            }
            if still_dir.is_some() {
                cfg.still_dir = still_dir;
            }
            let opts = GrabOptions {
                count,
                retries,
                out_dir,
                json,
                metrics,
            };
            grab(&cfg, &opts)
        }
        Commands::ConfigShow { file } => {
            let cfg = fsrc::load_config_file(&file)?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn list_backends() -> Result<()> {
    println!("mock\tsynthetic BGR frames");
    if cfg!(feature = "opencv") {
        println!("opencv\tOpenCV VideoCapture");
    } else {
        println!("opencv\t(not compiled; rebuild with --features opencv)");
    }
    if cfg!(feature = "image-io") {
        println!("still\timages replayed from a directory");
    } else {
        println!("still\t(not compiled; rebuild with --features image-io)");
    }
    Ok(())
}

fn grab(cfg: &SourceConfig, opts: &GrabOptions) -> Result<()> {
    match cfg.backend {
        fsrc::BackendKind::Mock => run_grab(cfg.mock.driver(), cfg, opts),
        fsrc::BackendKind::Opencv => {
            #[cfg(feature = "opencv")]
            {
                run_grab(fsrc::OpenCvDriver::new(), cfg, opts)
            }
            #[cfg(not(feature = "opencv"))]
            {
                Err(anyhow!(
                    "OpenCV backend not enabled at compile time; rebuild with --features opencv"
                ))
            }
        }
        fsrc::BackendKind::Still => {
            #[cfg(feature = "image-io")]
            {
                let dir = cfg
                    .still_dir
                    .as_ref()
                    .ok_or_else(|| anyhow!("still backend needs --still-dir or still_dir"))?;
                let driver = fsrc::StillImageDriver::from_dir(dir)
                    .with_context(|| format!("listing {}", dir.display()))?;
                run_grab(driver, cfg, opts)
            }
            #[cfg(not(feature = "image-io"))]
            {
                Err(anyhow!(
                    "still backend not enabled at compile time; rebuild with --features image-io"
                ))
            }
        }
    }
}

fn run_grab<D: CaptureDriver>(driver: D, cfg: &SourceConfig, opts: &GrabOptions) -> Result<()> {
    let metrics = CaptureMetrics::new().map_err(|e| anyhow!(e))?;
    let backend = driver.name();
    let mut source = WebcamSource::new(driver);
    source
        .connect(cfg.camera_index, &cfg.mode)
        .with_context(|| format!("{backend} camera {}", cfg.camera_index))?;
    metrics.set_connected(true);
    info!(backend, camera = cfg.camera_index, mode = %cfg.mode, "connected");

    if let Some(dir) = &opts.out_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let result = grab_frames(&mut source, cfg, opts, &metrics);

    let closed = source.close();
    metrics.set_connected(false);
    if opts.metrics {
        print!("{}", metrics.encode_text());
    }
    match (result, closed) {
        (Err(e), Err(close_err)) => {
            // The read failure is the one worth reporting.
            warn!(error = %close_err, "closing camera failed after an earlier error");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), closed) => closed.context("closing camera"),
    }
}

fn grab_frames<D: CaptureDriver>(
    source: &mut WebcamSource<D>,
    cfg: &SourceConfig,
    opts: &GrabOptions,
    metrics: &CaptureMetrics,
) -> Result<()> {
    for i in 0..opts.count {
        let mut empty_reads = 0u32;
        let frame = loop {
            let outcome = source.read_frame();
            metrics.observe(&outcome);
            match outcome? {
                Some(f) => break f,
                None if empty_reads < opts.retries => {
                    empty_reads += 1;
                    warn!(frame = i, empty_reads, "no frame available; retrying");
                }
                None => {
                    return Err(anyhow!(
                        "no frame after {} attempts (frame {i})",
                        empty_reads + 1
                    ))
                }
            }
        };
        report(i, &frame, &cfg.mode, empty_reads, opts.json)?;
        if let Some(dir) = &opts.out_dir {
            save_frame(dir, i, &frame)?;
        }
    }
    Ok(())
}

fn report(index: u32, frame: &Frame, mode: &str, empty_reads: u32, json: bool) -> Result<()> {
    if json {
        let summary = FrameSummary {
            index,
            width: frame.width,
            height: frame.height,
            mode: mode.to_string(),
            mean: frame.mean(),
            empty_reads,
        };
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "frame {index}: {}x{} {:?} mode={mode} mean={:.1} ts={:?}",
            frame.width,
            frame.height,
            frame.pixel_format,
            frame.mean(),
            frame.ts
        );
    }
    Ok(())
}

#[cfg(feature = "image-io")]
fn save_frame(dir: &std::path::Path, index: u32, frame: &Frame) -> Result<()> {
    let path = dir.join(format!("{index:05}.png"));
    fsrc::io::write_png(&path, frame).map_err(|e| anyhow!("write failed: {e}"))?;
    println!("saved {}", path.display());
    Ok(())
}

#[cfg(not(feature = "image-io"))]
fn save_frame(_dir: &std::path::Path, index: u32, _frame: &Frame) -> Result<()> {
    if index == 0 {
        println!("PNG export not enabled at compile time; rebuild with --features image-io");
    }
    Ok(())
}
