use std::path::{Path, PathBuf};

/// Joins rendered scene clips end to end into one file.
///
/// Clips share size, frame rate and codecs. Implementations must place
/// each clip exactly where the previous one ends.
pub trait ClipConcatenator: Send {
    fn concatenate(
        &self,
        clips: &[PathBuf],
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
