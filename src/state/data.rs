/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the dataset layer (scanner, caption store) and the UI layer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

static NEXT_PAIR_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a pair, assigned once at discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(u64);

impl PairId {
    /// Allocate a fresh id. Ids are never reused within a process.
    pub fn next() -> Self {
        PairId(NEXT_PAIR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One dataset sample: an image and its (possibly not yet created) caption file
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    /// Unique id, used for selection
    pub id: PairId,
    /// Absolute path to the image file
    image_path: PathBuf,
    /// Absolute path to the caption file; may not exist until the first save
    pub caption_path: PathBuf,
    /// Caption text being edited
    pub caption_text: String,
    /// What is on disk right now (`None` when the caption file does not exist)
    on_disk: Option<String>,
    /// Why the caption could not be loaded during the scan, if it could not
    pub load_error: Option<Error>,
}

impl Pair {
    /// Create a pair whose caption file content is `on_disk` (or absent)
    pub fn new(image_path: PathBuf, caption_path: PathBuf, on_disk: Option<String>) -> Self {
        Self {
            id: PairId::next(),
            image_path,
            caption_path,
            caption_text: on_disk.clone().unwrap_or_default(),
            on_disk,
            load_error: None,
        }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Image filename only (e.g. "cat.png")
    pub fn file_name(&self) -> String {
        self.image_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// False when the caption is empty or whitespace only
    pub fn has_caption(&self) -> bool {
        !self.caption_text.trim().is_empty()
    }

    /// True when the text was edited since it was last read or written
    pub fn has_edits(&self) -> bool {
        self.caption_text != self.on_disk.as_deref().unwrap_or("")
    }

    /// True when the text shown differs from the caption file on disk
    ///
    /// A caption file that could not be read never matches.
    pub fn is_dirty(&self) -> bool {
        self.has_edits() || self.load_error.is_some()
    }

    /// Record that `text` is now the content of the caption file
    pub(crate) fn mark_synced(&mut self, text: String) {
        self.on_disk = Some(text);
        self.load_error = None;
    }
}
