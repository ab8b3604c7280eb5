// crates/stinger-cli/src/yuv.rs
//
// CPU conversion of normalized frames to packed BGRA for the headless host.
//
// YUV → RGB uses BT.601 limited range, which is what swscale assumes for
// untagged SD/HD content and what the scale path would have produced.
//
// Plane layouts (packed, see `UploadFormat::plane_geometry`):
//   I420 : Y (w × h), U and V (cw × ch) each
//   NV12 : Y (w × h), UV interleaved (2*cw × ch)
// where cw = ceil(w/2), ch = ceil(h/2).

use stinger_core::media_types::{NormalizedFrame, UploadFormat};

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// One BT.601 limited-range pixel as `[B, G, R, A]`.
#[inline]
pub fn yuv_to_bgra(y: u8, u: u8, v: u8) -> [u8; 4] {
    let c = (y as i32 - 16).max(0) * 298;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    let r = clamp_u8((c + 409 * e + 128) >> 8);
    let g = clamp_u8((c - 100 * d - 208 * e + 128) >> 8);
    let b = clamp_u8((c + 516 * d + 128) >> 8);
    [b, g, r, 255]
}

/// Convert any upload format to packed BGRA (`w * h * 4` bytes).
///
/// The frame must be complete; callers check `is_complete` first.
pub fn frame_to_bgra(frame: &NormalizedFrame) -> Vec<u8> {
    let (w, h) = (frame.width as usize, frame.height as usize);
    let cw = w.div_ceil(2);
    let mut out = vec![0u8; w * h * 4];

    match frame.format {
        UploadFormat::Bgra => out.copy_from_slice(&frame.planes[0].data[..w * h * 4]),
        UploadFormat::Bgrx => {
            out.copy_from_slice(&frame.planes[0].data[..w * h * 4]);
            out.chunks_exact_mut(4).for_each(|px| px[3] = 255);
        }
        UploadFormat::Rgba => {
            for (dst, src) in out.chunks_exact_mut(4).zip(frame.planes[0].data.chunks_exact(4)) {
                dst.copy_from_slice(&[src[2], src[1], src[0], src[3]]);
            }
        }
        UploadFormat::R8 => {
            for (dst, &l) in out.chunks_exact_mut(4).zip(&frame.planes[0].data) {
                dst.copy_from_slice(&[l, l, l, 255]);
            }
        }
        UploadFormat::I420 => {
            let (yp, up, vp) = (&frame.planes[0].data, &frame.planes[1].data, &frame.planes[2].data);
            for row in 0..h {
                for col in 0..w {
                    let ci = (row / 2) * cw + col / 2;
                    let px = yuv_to_bgra(yp[row * w + col], up[ci], vp[ci]);
                    out[(row * w + col) * 4..(row * w + col) * 4 + 4].copy_from_slice(&px);
                }
            }
        }
        UploadFormat::Nv12 => {
            let (yp, uv) = (&frame.planes[0].data, &frame.planes[1].data);
            for row in 0..h {
                for col in 0..w {
                    let ci = (row / 2) * cw * 2 + (col / 2) * 2;
                    let px = yuv_to_bgra(yp[row * w + col], uv[ci], uv[ci + 1]);
                    out[(row * w + col) * 4..(row * w + col) * 4 + 4].copy_from_slice(&px);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stinger_core::media_types::FramePlane;

    fn plane(data: Vec<u8>, stride: usize) -> FramePlane {
        FramePlane { data, stride }
    }

    #[test]
    fn limited_range_extremes() {
        assert_eq!(yuv_to_bgra(16, 128, 128), [0, 0, 0, 255]);
        assert_eq!(yuv_to_bgra(235, 128, 128), [255, 255, 255, 255]);
    }

    #[test]
    fn i420_and_nv12_agree() {
        let y = vec![16, 80, 160, 235];
        let i420 = NormalizedFrame {
            width: 2, height: 2, format: UploadFormat::I420,
            planes: vec![plane(y.clone(), 2), plane(vec![90], 1), plane(vec![200], 1)],
        };
        let nv12 = NormalizedFrame {
            width: 2, height: 2, format: UploadFormat::Nv12,
            planes: vec![plane(y, 2), plane(vec![90, 200], 2)],
        };
        assert_eq!(frame_to_bgra(&i420), frame_to_bgra(&nv12));
    }

    #[test]
    fn rgba_is_swizzled() {
        let f = NormalizedFrame {
            width: 1, height: 1, format: UploadFormat::Rgba,
            planes: vec![plane(vec![10, 20, 30, 40], 4)],
        };
        assert_eq!(frame_to_bgra(&f), vec![30, 20, 10, 40]);
    }

    #[test]
    fn odd_width_uses_rounded_chroma() {
        let f = NormalizedFrame {
            width: 3, height: 1, format: UploadFormat::I420,
            planes: vec![plane(vec![235; 3], 3), plane(vec![128; 2], 2), plane(vec![128; 2], 2)],
        };
        assert!(f.is_complete());
        assert_eq!(frame_to_bgra(&f), [255, 255, 255, 255].repeat(3));
    }
}
