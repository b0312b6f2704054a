use crate::fetcher::{ImageBounds, ImageId};
use crate::PagerError;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

/// Expands a name pattern by replacing its `{}` with the image id
pub fn format_name(pattern: &str, id: &ImageId) -> String {
    pattern.replacen("{}", id.as_str(), 1)
}

/// Writes `image` as `<directory>/<name>.png`, shrunk to `bounds`
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(PagerError::Save)` - Encoding or writing failed
pub fn save_image(
    image: &DynamicImage,
    directory: &Path,
    name: &str,
    bounds: &ImageBounds,
) -> Result<PathBuf, PagerError> {
    let path = directory.join(format!("{}.png", name));
    bounds
        .shrink(image)
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|source| PagerError::Save {
            path: path.clone(),
            source,
        })?;

    tracing::debug!("Saved {}", path.display());
    Ok(path)
}
