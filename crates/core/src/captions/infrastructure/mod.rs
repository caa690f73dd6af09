pub mod glyph_caption_renderer;
