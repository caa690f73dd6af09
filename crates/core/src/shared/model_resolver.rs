use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

const APP_DIR: &str = "Synthesium";

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create model directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a speech model by file name, downloading it on first use.
///
/// An explicit `override_dir` (e.g. a models folder shipped next to the
/// binary) wins over the per-user cache.
pub fn resolve(
    name: &str,
    url: &str,
    override_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(dir) = override_dir {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    resolve_in(&model_cache_dir()?, name, url, progress)
}

/// Resolve `name` inside `cache_dir`, downloading from `url` when absent.
pub fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        log::debug!("Using cached model {}", cached_path.display());
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} to {}", cache_dir.display());
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Synthesium/models/`
/// - Linux: `$XDG_CACHE_HOME/Synthesium/models/` or `~/.cache/Synthesium/models/`
/// - Windows: `%LOCALAPPDATA%/Synthesium/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(APP_DIR).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_error = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_error)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(download_error)?;

    // Write next to the destination, then rename, so a failed download
    // never leaves a truncated model behind.
    let temp_path = dest.with_extension("part");
    let write_error = |source| ModelResolveError::Write {
        path: temp_path.clone(),
        source,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_error)?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        if let Err(e) = file.write_all(chunk) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_error(e));
        }
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_error)?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_in_returns_cached_file_without_download() {
        let tmp = TempDir::new().unwrap();
        let model_path = tmp.path().join("ggml-test.bin");
        fs::write(&model_path, b"fake model data").unwrap();

        let resolved = resolve_in(
            tmp.path(),
            "ggml-test.bin",
            "http://invalid.nonexistent.example.com/model",
            None,
        )
        .unwrap();
        assert_eq!(resolved, model_path);
    }

    #[test]
    fn test_resolve_prefers_override_dir() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("ggml-bundled.bin");
        fs::write(&bundled, b"bundled model").unwrap();

        let resolved = resolve(
            "ggml-bundled.bin",
            "http://invalid.nonexistent.example.com/model",
            Some(tmp.path()),
            None,
        )
        .unwrap();
        assert_eq!(resolved, bundled);
    }

    #[test]
    fn test_model_cache_dir_is_app_scoped() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains(APP_DIR));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_failed_download_leaves_no_files() {
        let tmp = TempDir::new().unwrap();
        let result = resolve_in(
            tmp.path(),
            "model.bin",
            "http://invalid.nonexistent.example.com/model",
            None,
        );
        assert!(result.is_err());
        assert!(!tmp.path().join("model.bin").exists());
        assert!(!tmp.path().join("model.part").exists());
    }
}
