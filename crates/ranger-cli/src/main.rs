mod config;
mod pipeline;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use ranger_link::gate::DispatchGate;
use ranger_link::link::ActuatorLink;
use ranger_range::hfov::compute_hfov;
use ranger_vision::camera::FrameSource;
use ranger_vision::color::Segmenter;
use ranger_vision::overlay;

use crate::config::{load_config, refresh_interval, validate, Config};
use crate::pipeline::{dispatch, Pipeline};

#[derive(Debug, Parser)]
#[command(name = "ranger", version, about = "ballranger - colored ball ranging for actuator controllers")]
struct Cli {
    #[arg(long, default_value = "ranger.toml")]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate config and calibration constants.
    Doctor,
    /// Detect, range and dispatch until stopped or the frame source fails.
    Run,
    /// Compute the camera HFOV from a reference of known width at a known distance.
    Calibrate {
        /// Camera to reference distance.
        #[arg(long)]
        distance_cm: f64,
        /// Real width between the two points.
        #[arg(long)]
        real_width_cm: f64,
        /// First screen point as X,Y.
        #[arg(long, value_parser = parse_point)]
        point_a: (f64, f64),
        /// Second screen point as X,Y.
        #[arg(long, value_parser = parse_point)]
        point_b: (f64, f64),
        /// Frame width in pixels; captured from [camera] when omitted.
        #[arg(long)]
        frame_width: Option<u32>,
    },
}

fn parse_point(s: &str) -> std::result::Result<(f64, f64), String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y, got {:?}", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad X in {:?}: {}", s, e))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad Y in {:?}: {}", s, e))?;
    Ok((x, y))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Doctor => doctor(&load_config(&cli.config)?)?,
        Command::Run => run(&load_config(&cli.config)?).await?,
        Command::Calibrate { distance_cm, real_width_cm, point_a, point_b, frame_width } => {
            let frame_width = match frame_width {
                Some(w) => w,
                None => {
                    let cfg = load_config(&cli.config)?;
                    let mut src = FrameSource::open(&cfg.camera)?;
                    src.next_frame().await.context("capture calibration frame")?.width()
                }
            };
            calibrate(distance_cm, real_width_cm, point_a, point_b, frame_width)?;
        }
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    validate(cfg)?;

    if cfg.link.enable {
        if let Some(dev) = &cfg.link.serial_dev {
            if !Path::new(dev).exists() {
                warn!("doctor: link.serial_dev {} does not exist (messages will be logged)", dev);
            }
        }
    } else {
        info!("doctor: link disabled");
    }
    if cfg.camera.mode == "replay" {
        let dir = cfg.camera.replay_dir.as_deref().context("camera.replay_dir missing (mode=replay)")?;
        anyhow::ensure!(Path::new(dir).is_dir(), "camera.replay_dir {} is not a directory", dir);
    }

    info!("doctor: OK (model={})", cfg.ranging.model);
    Ok(())
}

fn calibrate(
    distance_cm: f64,
    real_width_cm: f64,
    a: (f64, f64),
    b: (f64, f64),
    frame_width: u32,
) -> Result<()> {
    let cal = compute_hfov(distance_cm, real_width_cm, a, b, frame_width).context("hfov calibration")?;
    println!("target width (pixel): {:.3}", cal.pixel_width);
    println!("frame width (pixel): {}", frame_width);
    println!("frame real width (cm): {:.3}", cal.frame_real_width_cm);
    println!("HFOV (exact): {:.3}", cal.hfov_exact_deg);
    println!();
    println!("Paste into [ranging.angular] (or export HFOV={}):", cal.hfov_deg);
    println!("hfov_deg = {}", cal.hfov_deg);
    Ok(())
}

async fn run(cfg: &Config) -> Result<()> {
    validate(cfg)?;
    let model = cfg.ranging.build()?;
    info!("run: starting (model={}, refresh={}s)", model.name(), cfg.dispatch.refresh_s);

    let pipeline = Pipeline::new(Segmenter::with_defaults(), cfg.vision.limits(), model);
    let mut gate = DispatchGate::new(refresh_interval(cfg)?);
    let mut link = ActuatorLink::open(&cfg.link)?;
    let mut src = FrameSource::open(&cfg.camera)?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut frames: u64 = 0;
    loop {
        let frame = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("run: stop requested after {} frames", frames);
                break;
            }
            f = src.next_frame() => f.context("frame source failed")?,
        };
        let now = Instant::now();
        frames += 1;

        let report = pipeline.process(&frame);
        debug!(
            "frame {}: candidates={} detections={} selected={:?}",
            frames,
            report.candidates.len(),
            report.detections.len(),
            report.selected.map(|d| (d.candidate.class, d.distance_cm, d.angle_deg)),
        );

        if let Some(delivery) = dispatch(&mut gate, &mut link, report.selected.as_ref(), now).await {
            info!("run: dispatched {:?} ({:?})", report.selected.map(|d| d.to_message()), delivery);
        }

        if let Some(ov) = &cfg.overlay {
            if let Err(e) = overlay::annotate(&frame, &report.ranged_candidates()).save(&ov.path) {
                warn!("overlay: write {} failed: {}", ov.path, e);
            }
        }
    }
    Ok(())
}
