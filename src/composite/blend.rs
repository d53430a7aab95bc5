use rayon::prelude::*;

use crate::{
    assets::decode::PreparedImage,
    foundation::{
        core::{FrameRGBA, Rect},
        math::mul_div255_u8,
    },
};

pub(crate) type PremulRgba8 = [u8; 4];

/// Premultiplied source-over.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let inv = 255u16 - u16::from(sa);
            let mut out = [0u8; 4];
            for i in 0..4 {
                out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
            }
            out
        }
    }
}

/// Draw `src` stretched to `rect` (frame pixels) over `dst`.
///
/// A destination pixel is covered when its center lies inside `rect`. Sampling
/// is bilinear on premultiplied values with edge clamping. Rows are blended in
/// parallel on the current rayon pool.
pub(crate) fn draw_image(dst: &mut FrameRGBA, src: &PreparedImage, rect: Rect) {
    if src.width == 0 || src.height == 0 || dst.width == 0 || dst.height == 0 {
        return;
    }
    if !(rect.width() > 0.0 && rect.height() > 0.0) {
        return;
    }

    let (xs, xe) = covered_span(rect.x0, rect.x1, dst.width);
    let (ys, ye) = covered_span(rect.y0, rect.y1, dst.height);
    if xs >= xe || ys >= ye {
        return;
    }

    let row_bytes = dst.width as usize * 4;
    let pixels = src.rgba8_premul.as_slice();

    if is_identity(rect, src, dst) {
        dst.data
            .par_chunks_mut(row_bytes)
            .zip(pixels.par_chunks(row_bytes))
            .for_each(|(d_row, s_row)| {
                for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
                    let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                    d.copy_from_slice(&out);
                }
            });
        return;
    }

    let sx = f64::from(src.width) / rect.width();
    let sy = f64::from(src.height) / rect.height();

    dst.data
        .par_chunks_mut(row_bytes)
        .enumerate()
        .skip(ys)
        .take(ye - ys)
        .for_each(|(y, row)| {
            let v = (y as f64 + 0.5 - rect.y0) * sy - 0.5;
            for x in xs..xe {
                let u = (x as f64 + 0.5 - rect.x0) * sx - 0.5;
                let s = sample_bilinear(pixels, src.width, src.height, u, v);
                let d = &mut row[x * 4..x * 4 + 4];
                let out = over([d[0], d[1], d[2], d[3]], s);
                d.copy_from_slice(&out);
            }
        });
}

fn is_identity(rect: Rect, src: &PreparedImage, dst: &FrameRGBA) -> bool {
    src.width == dst.width
        && src.height == dst.height
        && rect == Rect::new(0.0, 0.0, f64::from(dst.width), f64::from(dst.height))
}

// Pixels i with i + 0.5 in [lo, hi), clamped to the canvas.
fn covered_span(lo: f64, hi: f64, extent: u32) -> (usize, usize) {
    let clamp = |v: f64| v.clamp(0.0, f64::from(extent)) as usize;
    (clamp((lo - 0.5).ceil()), clamp((hi - 0.5).ceil()))
}

fn sample_bilinear(pixels: &[u8], w: u32, h: u32, u: f64, v: f64) -> PremulRgba8 {
    let max_x = f64::from(w - 1);
    let max_y = f64::from(h - 1);
    let u = u.clamp(0.0, max_x);
    let v = v.clamp(0.0, max_y);

    let x0 = u.floor() as usize;
    let y0 = v.floor() as usize;
    let x1 = (x0 + 1).min(w as usize - 1);
    let y1 = (y0 + 1).min(h as usize - 1);
    let fx = u - x0 as f64;
    let fy = v - y0 as f64;

    let stride = w as usize * 4;
    let px = |x: usize, y: usize| &pixels[y * stride + x * 4..y * stride + x * 4 + 4];
    let (p00, p10, p01, p11) = (px(x0, y0), px(x1, y0), px(x0, y1), px(x1, y1));

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f64::from(p00[i]) * (1.0 - fx) + f64::from(p10[i]) * fx;
        let bottom = f64::from(p01[i]) * (1.0 - fx) + f64::from(p11[i]) * fx;
        out[i] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    // Keep the premultiplied invariant after rounding.
    let a = out[3];
    for c in &mut out[..3] {
        *c = (*c).min(a);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/composite/blend.rs"]
mod tests;
