use serde::{Deserialize, Serialize};

use crate::shared::settings::CaptionSettings;

/// How caption words are revealed over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// One word at a time, blank during the gaps between words.
    #[default]
    SingleWordPop,
    /// Words accumulate into a growing sentence.
    Progressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    /// Parses a CSS-style colour name or `#rrggbb` / `#rgb` hex string.
    pub fn parse(value: &str) -> Option<Rgb> {
        let value = value.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        let rgb = match value.as_str() {
            "white" => [255, 255, 255],
            "black" => [0, 0, 0],
            "red" => [255, 0, 0],
            "green" => [0, 128, 0],
            "blue" => [0, 0, 255],
            "yellow" => [255, 255, 0],
            "orange" => [255, 165, 0],
            "cyan" => [0, 255, 255],
            "magenta" => [255, 0, 255],
            "gray" | "grey" => [128, 128, 128],
            _ => return None,
        };
        Some(Rgb(rgb))
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.is_ascii() {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Immutable caption appearance, read by the compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub font_size: f32,
    pub font_color: Rgb,
    pub stroke_color: Rgb,
    pub stroke_width: u32,
    pub font_name: String,
    pub fallback_font_name: String,
    pub max_chars_per_line: usize,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self::from_settings(&CaptionSettings::default())
    }
}

impl CaptionStyle {
    pub fn from_settings(settings: &CaptionSettings) -> Self {
        Self {
            font_size: settings.font_size,
            font_color: parse_or(&settings.font_color, Rgb::WHITE),
            stroke_color: parse_or(&settings.stroke_color, Rgb::BLACK),
            stroke_width: settings.stroke_width,
            font_name: settings.font_name.clone(),
            fallback_font_name: settings.fallback_font_name.clone(),
            max_chars_per_line: settings.max_chars_per_line.max(1),
        }
    }
}

fn parse_or(value: &str, default: Rgb) -> Rgb {
    Rgb::parse(value).unwrap_or_else(|| {
        log::warn!("Unrecognized caption colour '{value}', using {default:?}");
        default
    })
}
