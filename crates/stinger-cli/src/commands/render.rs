// crates/stinger-cli/src/commands/render.rs
//
// `stinger render <path>`: simulate one or more scene switches.
//
// Progress ramps 0 → 1 over `--ticks` ticks per run, the way a host's
// transition clock would. Scene A is solid blue, scene B solid green, so
// the cut is visible in the PNGs written to `--out`.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use stinger_core::properties;
use stinger_core::settings::{StingerConfig, StingerSettings};
use stinger_core::transition::{Background, StingerTransition};
use stinger_media::{FfmpegBackend, PrefetchConfig};

use crate::compose::CpuTexture;
use crate::headless::HeadlessHost;

const SCENE_A: [u8; 4] = [200, 80, 20, 255];
const SCENE_B: [u8; 4] = [40, 180, 60, 255];

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Stinger video file.
    pub path: PathBuf,

    /// 1-based stinger frame at which scene B replaces scene A.
    #[arg(long, default_value_t = 1)]
    pub cut_frame: i64,

    #[arg(long, default_value_t = 640)]
    pub width: u32,

    #[arg(long, default_value_t = 360)]
    pub height: u32,

    /// Render ticks per transition. Defaults to the stinger's frame count.
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Number of back-to-back transitions.
    #[arg(long, default_value_t = 1)]
    pub runs: u32,

    /// Write every composited tick as PNG into this directory.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Directory holding NoStingerVideoLoaded.png.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub hw_decode: bool,

    /// Hand decoder-native formats to the host instead of scaling to BGRA.
    #[arg(long)]
    pub no_force_scale: bool,

    /// Decode on a worker thread.
    #[arg(long)]
    pub prefetch: bool,

    /// Frames the worker decodes ahead.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    pub prefetch_depth: u32,

    /// Longest a tick waits for the worker before holding the current frame.
    #[arg(long, default_value_t = 20)]
    pub prefetch_timeout_ms: u64,

    /// Longest the first tick of a transition waits for frame 0.
    #[arg(long, default_value_t = 100)]
    pub first_frame_timeout_ms: u64,
}

impl RenderArgs {
    fn settings(&self) -> StingerSettings {
        StingerSettings {
            stinger_path: self.path.display().to_string(),
            cut_frame:    self.cut_frame,
            hw_decode:    self.hw_decode,
            force_scale:  !self.no_force_scale,
            prefetch:     self.prefetch,
            ..properties::defaults()
        }
    }

    fn prefetch_config(&self) -> PrefetchConfig {
        PrefetchConfig {
            depth:               self.prefetch_depth as usize,
            poll_timeout:        Duration::from_millis(self.prefetch_timeout_ms),
            first_frame_timeout: Duration::from_millis(self.first_frame_timeout_ms),
        }
    }

    fn backend(&self) -> Result<FfmpegBackend> {
        Ok(FfmpegBackend::new()?.with_prefetch(self.prefetch_config()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSummary {
    pub valid:            bool,
    pub total_frames:     u64,
    pub cut_frame:        u64,
    pub duration_ms:      u32,
    pub restarts:         u64,
    pub frames_presented: u64,
    /// Tick (within the first run) at which scene B first showed.
    pub switch_tick:      Option<u32>,
    pub pngs_written:     usize,
    /// Textures still alive after destroy, scenes excluded.
    pub leaked_textures:  usize,
}

/// Write a BGRA canvas as an RGBA PNG.
fn write_png(canvas: &CpuTexture, dest: &Path) -> Result<()> {
    let file = File::create(dest).with_context(|| format!("create {}", dest.display()))?;
    let w    = &mut BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, canvas.width, canvas.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    let rgba: Vec<u8> = canvas.bgra
        .chunks_exact(4)
        .flat_map(|p| [p[2], p[1], p[0], p[3]])
        .collect();
    writer.write_image_data(&rgba)?;
    Ok(())
}

pub fn simulate(args: &RenderArgs, backend: FfmpegBackend) -> Result<RenderSummary> {
    let mut settings = args.settings();
    let config       = StingerConfig::with_data_dir(&args.data_dir);
    let mut host     = HeadlessHost::new();
    let scene_a      = host.solid_scene(args.width, args.height, SCENE_A);
    let scene_b      = host.solid_scene(args.width, args.height, SCENE_B);

    if let Some(dir) = &args.out {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }

    let mut stinger = StingerTransition::create(&mut settings, config, backend, &mut host)?;
    let ticks = args.ticks.unwrap_or(stinger.total_frames().min(u32::MAX as u64) as u32).max(1);

    let mut summary = RenderSummary {
        valid:            stinger.is_valid(),
        total_frames:     stinger.total_frames(),
        cut_frame:        stinger.cut_frame(),
        duration_ms:      stinger.duration_ms(),
        restarts:         0,
        frames_presented: 0,
        switch_tick:      None,
        pngs_written:     0,
        leaked_textures:  0,
    };

    let mut ts_out = 0u64;
    for run in 0..args.runs {
        for tick in 0..ticks {
            let t = if ticks > 1 { tick as f32 / (ticks - 1) as f32 } else { 1.0 };
            let report = stinger.render(&mut host, scene_a, scene_b, t, args.width, args.height);

            host.audio_progress = t;
            stinger.audio_render(&mut host, &mut ts_out, 1, 2, 48_000);

            if report.advanced {
                summary.frames_presented += 1;
            }
            if run == 0 && summary.switch_tick.is_none() && report.background == Background::B {
                summary.switch_tick = Some(tick);
            }
            if let (Some(dir), Some(canvas)) = (&args.out, &host.canvas) {
                write_png(canvas, &dir.join(format!("run{run}_tick{tick:04}.png")))?;
                summary.pngs_written += 1;
            }
        }
    }
    summary.restarts = stinger.restarts();
    stinger.destroy(&mut host);
    summary.leaked_textures = host.live_textures().saturating_sub(2);
    if host.scope_violations > 0 {
        warn!("[render] {} GPU calls outside a graphics scope", host.scope_violations);
    }
    Ok(summary)
}

pub fn run(args: RenderArgs) -> Result<()> {
    let summary = simulate(&args, args.backend()?)?;

    info!(
        valid = summary.valid,
        frames = summary.total_frames,
        cut = summary.cut_frame,
        duration_ms = summary.duration_ms,
        "[render] done"
    );
    println!("stinger     {}", if summary.valid { "loaded" } else { "placeholder" });
    println!("frames      {} (cut at {})", summary.total_frames, summary.cut_frame);
    println!("duration    {} ms", summary.duration_ms);
    println!("presented   {} frames over {} run(s)", summary.frames_presented, args.runs);
    println!("restarts    {}", summary.restarts);
    match summary.switch_tick {
        Some(tick) => println!("A → B       tick {tick}"),
        None       => println!("A → B       never"),
    }
    if let Some(dir) = &args.out {
        println!("wrote       {} PNGs to {}", summary.pngs_written, dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use stinger_media::fixtures::write_y4m;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RenderArgs,
    }

    fn parse(argv: &[&str]) -> RenderArgs {
        Harness::try_parse_from(std::iter::once("render").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn flags_map_onto_settings() {
        let args = parse(&["s.webm", "--cut-frame", "12", "--no-force-scale", "--prefetch"]);
        let s = args.settings();
        assert_eq!(s.stinger_path, "s.webm");
        assert_eq!(s.cut_frame, 12);
        assert!(!s.force_scale);
        assert!(s.prefetch);
        assert!(!s.hw_decode);
        assert_eq!((args.width, args.height, args.runs), (640, 360, 1));
        assert_eq!(args.prefetch_config(), PrefetchConfig::default());
    }

    #[test]
    fn prefetch_flags_tune_the_worker() {
        let args = parse(&[
            "s.webm", "--prefetch-depth", "2", "--prefetch-timeout-ms", "5",
            "--first-frame-timeout-ms", "250",
        ]);
        let config = args.prefetch_config();
        assert_eq!(config.depth, 2);
        assert_eq!(config.poll_timeout, Duration::from_millis(5));
        assert_eq!(config.first_frame_timeout, Duration::from_millis(250));

        let zero = Harness::try_parse_from(["render", "s.webm", "--prefetch-depth", "0"]);
        assert!(zero.is_err());
    }

    #[test]
    fn two_runs_restart_once_and_cut_on_time() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_y4m(dir.path(), "stinger.y4m", 16, 8, 6);
        let out  = dir.path().join("frames");
        let args = parse(&[
            path.to_str().unwrap(), "--cut-frame", "3", "--width", "32", "--height", "16",
            "--runs", "2", "--out", out.to_str().unwrap(),
        ]);
        let summary = simulate(&args, args.backend().unwrap()).unwrap();

        assert!(summary.valid);
        assert_eq!(summary.total_frames, 6);
        assert_eq!(summary.duration_ms, 240);
        assert_eq!(summary.restarts, 1);
        assert_eq!(summary.frames_presented, 12);
        assert_eq!(summary.switch_tick, Some(2));
        assert_eq!(summary.pngs_written, 12);
        assert_eq!(fs::read_dir(&out).unwrap().count(), 12);
        assert_eq!(summary.leaked_textures, 0);
    }

    #[test]
    fn prefetch_run_matches_inline() {
        let dir  = tempfile::tempdir().unwrap();
        let path = write_y4m(dir.path(), "stinger.y4m", 16, 8, 5);
        let base = [path.to_str().unwrap(), "--cut-frame", "2", "--runs", "2", "--width", "8", "--height", "8"];
        let inline = parse(&base);
        // Generous waits so every tick gets its frame and the runs are comparable.
        let mut argv = base.to_vec();
        argv.extend(["--prefetch", "--prefetch-timeout-ms", "5000", "--first-frame-timeout-ms", "5000"]);
        let prefetch = parse(&argv);

        let expected = simulate(&inline, inline.backend().unwrap()).unwrap();
        let summary  = simulate(&prefetch, prefetch.backend().unwrap()).unwrap();
        assert_eq!(expected.frames_presented, 10);
        assert_eq!(summary, expected);
    }

    #[test]
    fn missing_file_renders_placeholder() {
        let dir  = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.mov");
        let args = parse(&[missing.to_str().unwrap(), "--cut-frame", "9", "--ticks", "4", "--width", "8", "--height", "8"]);
        let summary = simulate(&args, args.backend().unwrap()).unwrap();
        assert!(!summary.valid);
        assert_eq!((summary.total_frames, summary.cut_frame), (1, 1));
        assert_eq!(summary.duration_ms, 3000);
        assert_eq!(summary.frames_presented, 0);
        assert_eq!(summary.switch_tick, Some(0));
        assert_eq!(summary.leaked_textures, 0);
    }
}
