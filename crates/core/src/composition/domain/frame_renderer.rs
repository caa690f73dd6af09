use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::shared::frame::Frame;

use super::motion::Viewport;

/// Scales `image` to cover `width` x `height` and centre-crops the overflow.
pub fn cover_resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (iw, ih) = image.dimensions();
    if (iw, ih) == (width, height) {
        return image.clone();
    }
    let scale = (width as f64 / iw.max(1) as f64).max(height as f64 / ih.max(1) as f64);
    let nw = ((iw as f64 * scale).ceil() as u32).max(width);
    let nh = ((ih as f64 * scale).ceil() as u32).max(height);
    let resized = imageops::resize(image, nw, nh, FilterType::Triangle);
    imageops::crop_imm(&resized, (nw - width) / 2, (nh - height) / 2, width, height).to_image()
}

/// Source sample positions for one axis: left index, right index and the
/// weight of the right sample.
fn axis_samples(len: u32, zoom: f64, center: f64) -> Vec<(usize, usize, f32)> {
    let size = len as f64;
    let origin = center * size - size / (2.0 * zoom);
    let max = len.saturating_sub(1) as f64;
    (0..len)
        .map(|i| {
            let pos = (origin + (i as f64 + 0.5) / zoom - 0.5).clamp(0.0, max);
            let lo = pos.floor();
            let hi = (lo + 1.0).min(max);
            (lo as usize, hi as usize, (pos - lo) as f32)
        })
        .collect()
}

/// Renders the part of `base` selected by `viewport` at the base's size,
/// using bilinear sampling.
pub fn render_viewport(base: &Frame, viewport: Viewport, index: usize) -> Frame {
    let (w, h) = (base.width(), base.height());
    if viewport.is_identity() {
        let mut frame = base.clone();
        frame.set_index(index);
        return frame;
    }

    let cols = axis_samples(w, viewport.zoom, viewport.center_x);
    let rows = axis_samples(h, viewport.zoom, viewport.center_y);
    let src = base.as_ndarray();
    let mut frame = Frame::blank(w, h, index);
    let mut dst = frame.as_ndarray_mut();

    for (y, &(y0, y1, wy)) in rows.iter().enumerate() {
        for (x, &(x0, x1, wx)) in cols.iter().enumerate() {
            for c in 0..Frame::CHANNELS as usize {
                let tl = src[[y0, x0, c]] as f32;
                let tr = src[[y0, x1, c]] as f32;
                let bl = src[[y1, x0, c]] as f32;
                let br = src[[y1, x1, c]] as f32;
                let t = tl + (tr - tl) * wx;
                let b = bl + (br - bl) * wx;
                dst[[y, x, c]] = (t + (b - t) * wy).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    drop(dst);
    frame
}
