/// Image decoding for the viewer
///
/// Decoding a large JPEG/PNG takes long enough to stall the UI, so the work
/// runs on tokio's blocking pool and the result comes back as a message.

use std::path::{Path, PathBuf};

use iced::widget::image::Handle;
use iced::Size;

use crate::error::{Error, Result};

/// A decoded image ready to be drawn
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub handle: Handle,
    /// Pixel dimensions
    pub size: Size,
}

/// Decode the image at `path` into RGBA pixels
pub async fn load_image(path: PathBuf) -> Result<LoadedImage> {
    let fallback = path.clone();
    tokio::task::spawn_blocking(move || load_image_blocking(&path))
        .await
        .map_err(|e| Error::Io {
            path: fallback,
            kind: std::io::ErrorKind::Other,
            message: format!("Task join error: {}", e),
        })?
}

/// Blocking implementation of image decoding
fn load_image_blocking(path: &Path) -> Result<LoadedImage> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| Error::from_io(path, &e))?
        .with_guessed_format()
        .map_err(|e| Error::from_io(path, &e))?;

    let decoded = reader.decode().map_err(|e| {
        log::warn!("Failed to decode {}: {}", path.display(), e);
        Error::Decode(path.to_path_buf())
    })?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("Decoded {} ({}x{})", path.display(), width, height);

    Ok(LoadedImage {
        handle: Handle::from_rgba(width, height, rgba.into_raw()),
        size: Size::new(width as f32, height as f32),
    })
}
