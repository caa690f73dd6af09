use crate::shared::frame::Frame;

use super::caption_style::{CaptionStyle, Rgb};

/// Which configured font produced a caption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontFace {
    Preferred,
    /// At least one word needed the fallback font.
    Fallback,
}

/// Rasterised caption as two coverage masks, fill drawn over stroke.
#[derive(Clone, Debug)]
pub struct CaptionBitmap {
    width: u32,
    height: u32,
    fill: Vec<u8>,
    stroke: Vec<u8>,
    face: FontFace,
}

impl CaptionBitmap {
    pub fn new(width: u32, height: u32, fill: Vec<u8>, stroke: Vec<u8>, face: FontFace) -> Self {
        debug_assert_eq!(fill.len(), (width * height) as usize);
        debug_assert_eq!(stroke.len(), fill.len());
        Self {
            width,
            height,
            fill,
            stroke,
            face,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn face(&self) -> FontFace {
        self.face
    }

    pub fn fill(&self) -> &[u8] {
        &self.fill
    }

    pub fn stroke(&self) -> &[u8] {
        &self.stroke
    }

    /// Blends the caption centred on `frame`. Parts falling outside the
    /// frame are clipped.
    pub fn overlay_centered(&self, frame: &mut Frame, fill_color: Rgb, stroke_color: Rgb) {
        let (fw, fh) = (frame.width() as i64, frame.height() as i64);
        let x0 = (fw - self.width as i64) / 2;
        let y0 = (fh - self.height as i64) / 2;
        let stride = frame.width() as usize * Frame::CHANNELS as usize;
        let data = frame.data_mut();

        for by in 0..self.height as i64 {
            let y = y0 + by;
            if y < 0 || y >= fh {
                continue;
            }
            for bx in 0..self.width as i64 {
                let x = x0 + bx;
                if x < 0 || x >= fw {
                    continue;
                }
                let mask_idx = (by * self.width as i64 + bx) as usize;
                let stroke = self.stroke[mask_idx];
                let fill = self.fill[mask_idx];
                if stroke == 0 && fill == 0 {
                    continue;
                }
                let offset = y as usize * stride + x as usize * Frame::CHANNELS as usize;
                let pixel = &mut data[offset..offset + Frame::CHANNELS as usize];
                blend_pixel(pixel, stroke_color, stroke);
                blend_pixel(pixel, fill_color, fill);
            }
        }
    }
}

fn blend_pixel(pixel: &mut [u8], color: Rgb, alpha: u8) {
    if alpha == 0 {
        return;
    }
    let a = alpha as u32;
    for (dst, src) in pixel.iter_mut().zip(color.0) {
        *dst = ((src as u32 * a + *dst as u32 * (255 - a) + 127) / 255) as u8;
    }
}

/// Grows a coverage mask by `radius` pixels using a disc-shaped max filter.
pub fn dilate(mask: &[u8], width: u32, height: u32, radius: u32) -> Vec<u8> {
    if radius == 0 {
        return mask.to_vec();
    }
    let (w, h, r) = (width as i64, height as i64, radius as i64);
    let offsets: Vec<(i64, i64)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
        .collect();

    let mut out = vec![0u8; mask.len()];
    for y in 0..h {
        for x in 0..w {
            let mut best = 0u8;
            for &(dx, dy) in &offsets {
                let (sx, sy) = (x + dx, y + dy);
                if sx < 0 || sy < 0 || sx >= w || sy >= h {
                    continue;
                }
                best = best.max(mask[(sy * w + sx) as usize]);
                if best == 255 {
                    break;
                }
            }
            out[(y * w + x) as usize] = best;
        }
    }
    out
}

/// Turns caption text into a bitmap.
///
/// Font substitution is part of normal operation and is reported through
/// [`CaptionBitmap::face`]. `None` means no font could render the text and
/// the caption layer should be left out.
pub trait CaptionRenderer: Send {
    fn render(&mut self, text: &str, style: &CaptionStyle) -> Option<CaptionBitmap>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, fill: u8, stroke: u8) -> CaptionBitmap {
        let n = (width * height) as usize;
        CaptionBitmap::new(width, height, vec![fill; n], vec![stroke; n], FontFace::Preferred)
    }

    #[test]
    fn test_overlay_is_centred() {
        let mut frame = Frame::blank(6, 4, 0);
        solid(2, 2, 255, 0).overlay_centered(&mut frame, Rgb::WHITE, Rgb::BLACK);
        assert_eq!(frame.pixel(2, 1), [255, 255, 255]);
        assert_eq!(frame.pixel(3, 2), [255, 255, 255]);
        assert_eq!(frame.pixel(1, 1), [0, 0, 0]);
        assert_eq!(frame.pixel(4, 2), [0, 0, 0]);
        assert_eq!(frame.pixel(2, 0), [0, 0, 0]);
    }

    #[test]
    fn test_fill_draws_over_stroke() {
        let mut frame = Frame::blank(2, 2, 0);
        solid(2, 2, 255, 255).overlay_centered(&mut frame, Rgb([200, 10, 10]), Rgb::WHITE);
        assert_eq!(frame.pixel(0, 0), [200, 10, 10]);
    }

    #[test]
    fn test_stroke_visible_where_fill_is_empty() {
        let mut frame = Frame::blank(2, 2, 0);
        solid(2, 2, 0, 255).overlay_centered(&mut frame, Rgb::WHITE, Rgb([0, 0, 255]));
        assert_eq!(frame.pixel(1, 1), [0, 0, 255]);
    }

    #[test]
    fn test_partial_alpha_blends() {
        let mut frame = Frame::blank(1, 1, 0);
        solid(1, 1, 128, 0).overlay_centered(&mut frame, Rgb::WHITE, Rgb::BLACK);
        let [r, g, b] = frame.pixel(0, 0);
        assert!((127..=129).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_oversized_bitmap_is_clipped() {
        let mut frame = Frame::blank(2, 2, 0);
        solid(6, 6, 255, 0).overlay_centered(&mut frame, Rgb::WHITE, Rgb::BLACK);
        assert!(frame.data().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_dilate_grows_single_pixel_into_disc() {
        let mut mask = vec![0u8; 25];
        mask[12] = 255;
        let grown = dilate(&mask, 5, 5, 1);
        assert_eq!(grown[12], 255);
        assert_eq!(grown[7], 255);
        assert_eq!(grown[11], 255);
        // Diagonal lies outside a radius-1 disc
        assert_eq!(grown[6], 0);
        assert_eq!(grown[0], 0);
    }

    #[test]
    fn test_dilate_zero_radius_is_identity() {
        let mask = vec![0, 10, 200, 0];
        assert_eq!(dilate(&mask, 2, 2, 0), mask);
    }
}
