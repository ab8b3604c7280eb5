// crates/stinger-media/src/helpers/planes.rs
//
// Plane extraction from decoded VideoFrames into upload-ready buffers.
//
// FFmpeg frame rows carry stride padding. Everything handed to the graphics
// host is packed: each row is exactly `row_bytes` long and `stride` in the
// resulting `FramePlane` equals `row_bytes`.
//
// Plane layouts per upload format:
//   Bgra / Rgba / Bgrx : one plane, w*4 bytes per row
//   R8                 : one plane, w bytes per row
//   Nv12               : Y (w × h) + interleaved UV (2*ceil(w/2) × ceil(h/2))
//   I420               : Y (w × h) + U + V (ceil(w/2) × ceil(h/2) each)

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::util::frame::video::Video as VideoFrame;

use stinger_core::media_types::{FramePlane, NormalizedFrame, UploadFormat};

/// Upload format a decoder pixel format can be handed over as without scaling.
pub fn upload_format(pixel: Pixel) -> Option<UploadFormat> {
    match pixel {
        Pixel::BGRA                      => Some(UploadFormat::Bgra),
        Pixel::RGBA                      => Some(UploadFormat::Rgba),
        Pixel::BGRZ                      => Some(UploadFormat::Bgrx),
        Pixel::GRAY8                     => Some(UploadFormat::R8),
        Pixel::NV12                      => Some(UploadFormat::Nv12),
        Pixel::YUV420P | Pixel::YUVJ420P => Some(UploadFormat::I420),
        _                                => None,
    }
}

/// Copy `rows` rows of `row_bytes` out of a strided plane.
///
/// Rows past the end of `src` (a truncated plane) are left zeroed rather
/// than panicking.
pub fn pack_plane(src: &[u8], stride: usize, row_bytes: usize, rows: usize) -> Vec<u8> {
    let mut packed = vec![0u8; row_bytes * rows];
    for row in 0..rows {
        let start = row * stride;
        let Some(line) = src.get(start..start + row_bytes) else { break };
        packed[row * row_bytes..row * row_bytes + row_bytes].copy_from_slice(line);
    }
    packed
}

/// Destripe every plane of `frame` as `format`.
///
/// The frame's pixel format must already match `format`; callers check with
/// `upload_format` first.
pub fn pack_frame(frame: &VideoFrame, format: UploadFormat) -> NormalizedFrame {
    let (w, h) = (frame.width(), frame.height());
    let planes = format
        .plane_geometry(w, h)
        .into_iter()
        .enumerate()
        .map(|(i, (row_bytes, rows))| FramePlane {
            data:   pack_plane(frame.data(i), frame.stride(i), row_bytes, rows),
            stride: row_bytes,
        })
        .collect();
    NormalizedFrame { width: w, height: h, format, planes }
}
