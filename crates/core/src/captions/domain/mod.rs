pub mod caption_renderer;
pub mod caption_style;
pub mod caption_track;
pub mod word_event;
pub mod word_timing_resolver;
