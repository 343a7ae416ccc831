/// Folder scanning: pair every image with its caption file
///
/// Only the immediate entries of the folder are considered (no recursion)
/// and hidden files are skipped. Extensions are matched case-insensitively;
/// base names are matched case-sensitively.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::caption::read_caption;
use crate::error::{Error, Result};
use crate::state::data::Pair;

/// Supported image file extensions
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "bmp", "tiff"];

/// Supported caption file extensions, in pairing priority order
pub const CAPTION_EXTENSIONS: [&str; 2] = ["txt", "caption"];

/// Extension used for captions that don't exist yet
const DEFAULT_CAPTION_EXTENSION: &str = "txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Image,
    /// Caption, with its priority (lower wins)
    Caption(usize),
}

fn classify(path: &Path) -> Option<Kind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Some(Kind::Image);
    }
    CAPTION_EXTENSIONS
        .iter()
        .position(|c| *c == ext)
        .map(Kind::Caption)
}

fn base_name(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Scan `directory` and return one pair per image, sorted by image filename
///
/// Fails when the folder itself can't be listed. Entries that fail
/// individually are logged and skipped. Caption files that can't be
/// decoded still produce a pair, with empty text and `load_error` set.
pub fn scan(directory: &Path) -> Result<Vec<Pair>> {
    let meta = fs::metadata(directory).map_err(|e| Error::from_io(directory, &e))?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory(directory.to_path_buf()));
    }

    log::info!("Scanning folder: {}", directory.display());

    let mut images: Vec<(String, PathBuf)> = Vec::new();
    // base name -> (priority, file name, path)
    let mut captions: HashMap<String, (usize, String, PathBuf)> = HashMap::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(match err.io_error() {
                    Some(io) => Error::from_io(directory, io),
                    None => Error::Io {
                        path: directory.to_path_buf(),
                        kind: std::io::ErrorKind::Other,
                        message: err.to_string(),
                    },
                });
            }
            Err(err) => {
                log::warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&name) || !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        match classify(path) {
            Some(Kind::Image) => images.push((name, path.to_path_buf())),
            Some(Kind::Caption(priority)) => {
                let candidate = (priority, name, path.to_path_buf());
                let base = base_name(path);
                let replace = captions
                    .get(&base)
                    .map_or(true, |current| (candidate.0, &candidate.1) < (current.0, &current.1));
                if replace {
                    captions.insert(base, candidate);
                }
            }
            None => {}
        }
    }

    images.sort_by(|a, b| a.0.cmp(&b.0));

    let mut pairs = Vec::with_capacity(images.len());
    for (_, image_path) in images {
        let base = base_name(&image_path);
        let caption_path = match captions.get(&base) {
            Some((_, _, path)) => path.clone(),
            None => directory.join(format!("{}.{}", base, DEFAULT_CAPTION_EXTENSION)),
        };

        let (on_disk, load_error) = match read_caption(&caption_path) {
            Ok(text) => (text, None),
            Err(err) => {
                log::warn!("Could not load caption: {}", err);
                (None, Some(err))
            }
        };

        let mut pair = Pair::new(image_path, caption_path, on_disk);
        pair.load_error = load_error;
        pairs.push(pair);
    }

    log::info!(
        "Scan complete: {} images, {} caption files",
        pairs.len(),
        captions.len()
    );

    Ok(pairs)
}
