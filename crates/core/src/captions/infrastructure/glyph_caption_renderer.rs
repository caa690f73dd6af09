use std::fs;
use std::path::{Path, PathBuf};

use fontdue::layout::{
    CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign, WrapStyle,
};
use fontdue::{Font, FontSettings};

use crate::captions::domain::caption_renderer::{dilate, CaptionBitmap, CaptionRenderer, FontFace};
use crate::captions::domain::caption_style::CaptionStyle;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];
const MAX_SEARCH_DEPTH: usize = 4;

/// Caption rasteriser backed by `fontdue`.
///
/// Words the preferred font cannot draw are set in the fallback font. When
/// the preferred font is missing entirely, the fallback serves every word.
pub struct GlyphCaptionRenderer {
    preferred: Option<Font>,
    fallback: Option<Font>,
    warned_fallback: bool,
}

impl GlyphCaptionRenderer {
    pub fn new(preferred: Option<Font>, fallback: Option<Font>) -> Self {
        Self {
            preferred,
            fallback,
            warned_fallback: false,
        }
    }

    /// Locates and parses both fonts named in `style`. Never fails; a font
    /// that cannot be found or parsed is logged and left out.
    pub fn load(style: &CaptionStyle, search_dirs: &[PathBuf]) -> Self {
        let preferred = load_font(&style.font_name, search_dirs, style.font_size);
        let fallback = load_font(&style.fallback_font_name, search_dirs, style.font_size);
        if preferred.is_none() && fallback.is_none() {
            log::warn!(
                "Neither '{}' nor '{}' could be loaded, captions will be omitted",
                style.font_name,
                style.fallback_font_name
            );
        } else if preferred.is_none() {
            log::warn!(
                "Font '{}' not found, using '{}' for captions",
                style.font_name,
                style.fallback_font_name
            );
        }
        Self::new(preferred, fallback)
    }

    pub fn has_font(&self) -> bool {
        self.preferred.is_some() || self.fallback.is_some()
    }

    /// Fonts in layout order with the slot of each face.
    fn faces(&self) -> (Vec<&Font>, Option<usize>, Option<usize>) {
        let mut fonts = Vec::with_capacity(2);
        let preferred = self.preferred.as_ref().map(|f| {
            fonts.push(f);
            fonts.len() - 1
        });
        let fallback = self.fallback.as_ref().map(|f| {
            fonts.push(f);
            fonts.len() - 1
        });
        (fonts, preferred, fallback)
    }
}

impl CaptionRenderer for GlyphCaptionRenderer {
    fn render(&mut self, text: &str, style: &CaptionStyle) -> Option<CaptionBitmap> {
        if text.trim().is_empty() {
            return None;
        }
        let (fonts, preferred, fallback) = self.faces();
        let primary = preferred.or(fallback)?;

        // Split into (segment, font slot) runs, choosing a face per word.
        let mut runs: Vec<(String, usize)> = Vec::new();
        let mut used_fallback = preferred.is_none();
        for (line_no, line) in text.lines().enumerate() {
            if line_no > 0 {
                runs.push(("\n".to_string(), primary));
            }
            for (word_no, word) in line.split_whitespace().enumerate() {
                let slot = match (preferred, fallback) {
                    (Some(p), Some(f)) if !covers(fonts[p], word) => {
                        used_fallback = true;
                        f
                    }
                    _ => primary,
                };
                let segment = if word_no > 0 {
                    format!(" {word}")
                } else {
                    word.to_string()
                };
                runs.push((segment, slot));
            }
        }

        let size = style.font_size;
        let pad = style.stroke_width + 1;

        // Measure once left-aligned, then lay out again centred in that width.
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&layout_settings(None, HorizontalAlign::Left));
        for (segment, slot) in &runs {
            layout.append(&fonts, &TextStyle::new(segment, size, *slot));
        }
        let text_width = layout
            .glyphs()
            .iter()
            .map(|g| g.x + g.width as f32)
            .fold(0.0f32, f32::max)
            .ceil();
        if text_width <= 0.0 {
            return None;
        }

        layout.reset(&layout_settings(
            Some(text_width + 1.0),
            HorizontalAlign::Center,
        ));
        for (segment, slot) in &runs {
            layout.append(&fonts, &TextStyle::new(segment, size, *slot));
        }

        let width = text_width as u32 + 1 + 2 * pad;
        let height = layout.height().ceil().max(1.0) as u32 + 2 * pad;
        let mut fill = vec![0u8; (width * height) as usize];
        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (_, coverage) = fonts[glyph.font_index].rasterize_config(glyph.key);
            blend_glyph(
                &mut fill,
                width,
                height,
                glyph.x.round() as i64 + pad as i64,
                glyph.y.round() as i64 + pad as i64,
                glyph.width,
                &coverage,
            );
        }
        let stroke = dilate(&fill, width, height, style.stroke_width);

        let face = if used_fallback {
            if !self.warned_fallback {
                log::warn!(
                    "Caption '{text}' uses fallback font '{}'",
                    style.fallback_font_name
                );
                self.warned_fallback = true;
            }
            FontFace::Fallback
        } else {
            FontFace::Preferred
        };
        Some(CaptionBitmap::new(width, height, fill, stroke, face))
    }
}

fn layout_settings(max_width: Option<f32>, align: HorizontalAlign) -> LayoutSettings {
    LayoutSettings {
        x: 0.0,
        y: 0.0,
        max_width,
        max_height: None,
        horizontal_align: align,
        vertical_align: VerticalAlign::Top,
        line_height: 1.0,
        wrap_style: WrapStyle::Word,
        wrap_hard_breaks: true,
    }
}

fn covers(font: &Font, word: &str) -> bool {
    word.chars()
        .filter(|c| !c.is_whitespace())
        .all(|c| font.lookup_glyph_index(c) != 0)
}

fn blend_glyph(
    mask: &mut [u8],
    width: u32,
    height: u32,
    x: i64,
    y: i64,
    glyph_width: usize,
    coverage: &[u8],
) {
    for (row, line) in coverage.chunks(glyph_width.max(1)).enumerate() {
        let ty = y + row as i64;
        if ty < 0 || ty >= height as i64 {
            continue;
        }
        for (col, &value) in line.iter().enumerate() {
            let tx = x + col as i64;
            if tx < 0 || tx >= width as i64 || value == 0 {
                continue;
            }
            let idx = (ty * width as i64 + tx) as usize;
            mask[idx] = mask[idx].max(value);
        }
    }
}

fn load_font(name: &str, search_dirs: &[PathBuf], size: f32) -> Option<Font> {
    let path = find_font(name, search_dirs)?;
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to read font {}: {e}", path.display());
            return None;
        }
    };
    let settings = FontSettings {
        scale: size,
        ..FontSettings::default()
    };
    match Font::from_bytes(bytes, settings) {
        Ok(font) => {
            log::debug!("Loaded caption font {}", path.display());
            Some(font)
        }
        Err(e) => {
            log::warn!("Failed to parse font {}: {e}", path.display());
            None
        }
    }
}

/// Resolves a font given either as a file path or as a file stem such as
/// `Montserrat-Bold`, searched case-insensitively under `search_dirs`.
pub fn find_font(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }
    let wanted = name.to_lowercase();
    search_dirs
        .iter()
        .find_map(|dir| search_dir(dir, &wanted, MAX_SEARCH_DEPTH))
}

fn search_dir(dir: &Path, wanted: &str, depth: usize) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let matched = entries.iter().find(|p| {
        p.is_file()
            && has_font_extension(p)
            && p.file_stem()
                .map(|s| s.to_string_lossy().to_lowercase() == wanted)
                .unwrap_or(false)
    });
    if let Some(path) = matched {
        return Some(path.clone());
    }
    if depth == 0 {
        return None;
    }
    entries
        .iter()
        .filter(|p| p.is_dir())
        .find_map(|p| search_dir(p, wanted, depth - 1))
}

fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            FONT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Local `fonts/` folder first, then the usual system locations.
pub fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs_list = vec![PathBuf::from("fonts")];
    if let Some(user_fonts) = dirs::font_dir() {
        dirs_list.push(user_fonts);
    }
    for system in [
        "/usr/share/fonts",
        "/usr/local/share/fonts",
        "/Library/Fonts",
        "/System/Library/Fonts",
        "C:\\Windows\\Fonts",
    ] {
        dirs_list.push(PathBuf::from(system));
    }
    dirs_list
}
