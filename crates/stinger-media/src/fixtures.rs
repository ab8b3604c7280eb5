// crates/stinger-media/src/fixtures.rs
//
// Synthetic YUV4MPEG2 clips for tests. FFmpeg demuxes .y4m natively and
// every frame is a keyframe, so frame counts and first-frame content are
// exact without shipping binary assets.
//
// Other crates reach this through the `test-fixtures` feature.

use std::fs;
use std::path::{Path, PathBuf};

pub fn init() {
    let _ = ffmpeg_the_third::init();
}

/// Luma value used for frame `index`, so tests can tell frames apart.
pub fn luma_for(index: u32) -> u8 {
    (16 + index * 8).min(235) as u8
}

/// Write a 25 fps 4:2:0 clip of `frames` frames. `w` and `h` must be even.
pub fn write_y4m(dir: &Path, name: &str, w: u32, h: u32, frames: u32) -> PathBuf {
    init();
    let (w, h) = (w as usize, h as usize);
    let mut bytes = format!("YUV4MPEG2 W{w} H{h} F25:1 Ip A1:1 C420jpeg\n").into_bytes();
    for index in 0..frames {
        bytes.extend_from_slice(b"FRAME\n");
        bytes.extend(std::iter::repeat(luma_for(index)).take(w * h));
        bytes.extend(std::iter::repeat(128u8).take(w * h / 2));
    }
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}
