// crates/stinger-cli/src/commands/probe.rs
//
// `stinger probe <path>`: what the property sheet would show for a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use stinger_core::helpers::time::{fixed_duration_ms, format_frame};
use stinger_core::media_types::{FrameRate, ProbeReport};
use stinger_core::properties::{limits_for, SliderLimits};
use stinger_core::settings::INVALID_DURATION_MS;
use stinger_core::MediaProber;
use stinger_media::FfmpegBackend;

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Stinger video file.
    pub path: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Transition length the host would be told for this report.
fn transition_ms(report: &ProbeReport) -> u32 {
    if report.is_valid() {
        fixed_duration_ms(report.frame_count, report.frame_rate.unwrap_or(FrameRate::FPS_30))
    } else {
        INVALID_DURATION_MS
    }
}

pub fn render_text(report: &ProbeReport, limits: SliderLimits) -> String {
    let rate = report.frame_rate.unwrap_or(FrameRate::FPS_30);
    let mut out = String::new();
    out.push_str(&format!("file       {}\n", report.path.display()));
    out.push_str(&format!("codec      {} {}x{}\n", report.codec, report.width, report.height));
    out.push_str(&format!(
        "frames     {} ({} at {:.3} fps)\n",
        report.frame_count,
        format_frame(report.frame_count, rate),
        rate.as_f64(),
    ));
    out.push_str(&format!("transition {} ms\n", transition_ms(report)));
    out.push_str(&format!("cut slider {}..={}\n", limits.min, limits.max));
    if !report.is_valid() {
        out.push_str("status     not playable, placeholder would be shown\n");
    }
    out
}

pub fn render_json(report: &ProbeReport, limits: SliderLimits) -> Result<String> {
    let value = json!({
        "report":        report,
        "valid":         report.is_valid(),
        "duration_secs": report.duration_secs(),
        "transition_ms": transition_ms(report),
        "cut_slider":    { "min": limits.min, "max": limits.max, "step": limits.step },
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn run(args: ProbeArgs) -> Result<()> {
    let backend = FfmpegBackend::new()?;
    let report  = backend.probe(&args.path)
        .with_context(|| format!("probe {}", args.path.display()))?;
    let limits  = limits_for(Some(&report));

    if args.json {
        println!("{}", render_json(&report, limits)?);
    } else {
        print!("{}", render_text(&report, limits));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(frames: u64) -> ProbeReport {
        ProbeReport {
            path:        "s.webm".into(),
            frame_count: frames,
            frame_rate:  FrameRate::new(25, 1),
            width:       1920,
            height:      1080,
            codec:       "vp9".into(),
        }
    }

    #[test]
    fn json_carries_limits_and_duration() {
        let r = report(50);
        let text = render_json(&r, limits_for(Some(&r))).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["valid"], true);
        assert_eq!(v["transition_ms"], 2000);
        assert_eq!(v["cut_slider"]["max"], 50);
        assert_eq!(v["report"]["frame_count"], 50);
    }

    #[test]
    fn single_frame_file_reports_fallback() {
        let r = report(1);
        let text = render_text(&r, limits_for(Some(&r)));
        assert!(text.contains("transition 3000 ms"));
        assert!(text.contains("cut slider 1..=1"));
        assert!(text.contains("not playable"));
    }
}
