// crates/stinger-cli/src/compose.rs
//
// Software stand-in for the stinger composite shader: the chosen scene,
// with the stinger frame alpha-blended on top, both stretched to the
// output size. Rows are composited in parallel with rayon.

use rayon::prelude::*;

/// A packed BGRA image (straight alpha).
#[derive(Clone, Debug, PartialEq)]
pub struct CpuTexture {
    pub width:  u32,
    pub height: u32,
    pub bgra:   Vec<u8>,
}

impl CpuTexture {
    pub fn solid(width: u32, height: u32, bgra: [u8; 4]) -> Self {
        Self { width, height, bgra: bgra.repeat((width * height) as usize) }
    }

    /// Nearest-neighbour sample for output pixel `(x, y)` of a `cx`×`cy` target.
    #[inline]
    fn sample(&self, x: usize, y: usize, cx: usize, cy: usize) -> [u8; 4] {
        let sx = (x * self.width as usize / cx).min(self.width as usize - 1);
        let sy = (y * self.height as usize / cy).min(self.height as usize - 1);
        let i  = (sy * self.width as usize + sx) * 4;
        [self.bgra[i], self.bgra[i + 1], self.bgra[i + 2], self.bgra[i + 3]]
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// `src` over `dst`, straight alpha.
#[inline]
pub fn over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as u32;
    if sa == 255 { return src; }
    if sa == 0 { return dst; }
    let da    = dst[3] as u32 * (255 - sa) / 255;
    let out_a = sa + da;
    let mut px = [0u8; 4];
    for c in 0..3 {
        px[c] = ((src[c] as u32 * sa + dst[c] as u32 * da) / out_a) as u8;
    }
    px[3] = out_a as u8;
    px
}

/// Composite `overlay` over `background` into a new `cx`×`cy` image.
///
/// A missing background is opaque black; a missing overlay leaves the
/// background visible.
pub fn composite(
    background: Option<&CpuTexture>,
    overlay:    Option<&CpuTexture>,
    cx:         u32,
    cy:         u32,
) -> CpuTexture {
    let (w, h) = (cx as usize, cy as usize);
    let background = background.filter(|t| !t.is_empty());
    let overlay    = overlay.filter(|t| !t.is_empty());
    let mut bgra = vec![0u8; w * h * 4];

    bgra.par_chunks_mut((w * 4).max(1)).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let mut px = background.map_or([0, 0, 0, 255], |t| t.sample(x, y, w, h));
            if let Some(o) = overlay {
                px = over(o.sample(x, y, w, h), px);
            }
            row[x * 4..x * 4 + 4].copy_from_slice(&px);
        }
    });

    CpuTexture { width: cx, height: cy, bgra }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_respects_alpha() {
        assert_eq!(over([10, 20, 30, 255], [0, 0, 0, 255]), [10, 20, 30, 255]);
        assert_eq!(over([10, 20, 30, 0], [1, 2, 3, 255]), [1, 2, 3, 255]);
        let half = over([200, 200, 200, 128], [0, 0, 0, 255]);
        assert!((99..=101).contains(&half[0]));
        assert_eq!(half[3], 255);
    }

    #[test]
    fn overlay_is_stretched_over_background() {
        let bg = CpuTexture::solid(4, 4, [255, 0, 0, 255]);
        // Left column opaque white, right column transparent.
        let overlay = CpuTexture {
            width: 2, height: 1,
            bgra: vec![255, 255, 255, 255, 0, 0, 0, 0],
        };
        let out = composite(Some(&bg), Some(&overlay), 8, 2);
        assert_eq!((out.width, out.height), (8, 2));
        assert_eq!(&out.bgra[0..4], &[255, 255, 255, 255]);
        assert_eq!(&out.bgra[7 * 4..8 * 4], &[255, 0, 0, 255]);
    }

    #[test]
    fn no_inputs_is_black() {
        let out = composite(None, None, 2, 2);
        assert_eq!(out.bgra, [0, 0, 0, 255].repeat(4));
    }
}
