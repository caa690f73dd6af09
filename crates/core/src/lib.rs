//! Caption timing, scene composition and sequence assembly for short
//! vertical narrative videos.
//!
//! Each bounded context is split into a `domain` layer (pure types, traits
//! and algorithms) and an `infrastructure` layer (ffmpeg, fontdue, whisper
//! and filesystem adapters). Use cases in [`pipeline`] wire them together.

pub mod assembly;
pub mod audio;
pub mod captions;
pub mod composition;
pub mod generation;
pub mod pipeline;
pub mod shared;
pub mod video;
