use std::path::{Path, PathBuf};

use super::data::{Pair, PairId};
use crate::dataset::caption::{self, Reload};
use crate::dataset::scanner;
use crate::error::Result;

/// The active dataset folder, its pairs and the current selection
///
/// A session is created when a folder is opened and its pair list is
/// rebuilt on every rescan. Unsaved edits survive a rescan.
#[derive(Debug)]
pub struct Session {
    directory: PathBuf,
    /// Sorted by image filename
    pairs: Vec<Pair>,
    selected: Option<PairId>,
}

impl Session {
    /// Scan `directory` and select its first pair
    pub fn open(directory: PathBuf) -> Result<Self> {
        let pairs = scanner::scan(&directory)?;
        let selected = pairs.first().map(|p| p.id);
        Ok(Session {
            directory,
            pairs,
            selected,
        })
    }

    /// Scan the folder again
    ///
    /// The selection follows the previously selected image when it still
    /// exists, otherwise it moves to the first pair. A pair that still has
    /// the same image and caption paths keeps its unsaved text. On failure
    /// the session is left as it was.
    pub fn rescan(&mut self) -> Result<()> {
        let mut pairs = scanner::scan(&self.directory)?;
        for pair in &mut pairs {
            let edited = self.pairs.iter().find(|old| {
                old.has_edits()
                    && old.image_path() == pair.image_path()
                    && old.caption_path == pair.caption_path
            });
            if let Some(old) = edited {
                pair.caption_text = old.caption_text.clone();
            }
        }

        let previous = self.selected().map(|p| p.image_path().to_path_buf());

        self.selected = previous
            .and_then(|path| pairs.iter().find(|p| p.image_path() == path.as_path()))
            .or_else(|| pairs.first())
            .map(|p| p.id);
        self.pairs = pairs;
        Ok(())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Last path component of the folder, for display
    pub fn directory_name(&self) -> String {
        self.directory
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.directory.display().to_string())
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn pair(&self, id: PairId) -> Option<&Pair> {
        self.pairs.iter().find(|p| p.id == id)
    }

    pub fn selected_id(&self) -> Option<PairId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Pair> {
        self.selected.and_then(|id| self.pair(id))
    }

    fn selected_mut(&mut self) -> Option<&mut Pair> {
        let id = self.selected?;
        self.pairs.iter_mut().find(|p| p.id == id)
    }

    /// Select a pair by id. Returns false if no such pair exists.
    pub fn select(&mut self, id: PairId) -> bool {
        if self.pair(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    /// Replace the caption text of the selected pair
    pub fn set_selected_caption(&mut self, text: String) {
        if let Some(pair) = self.selected_mut() {
            pair.caption_text = text;
        }
    }

    /// Save the selected pair's caption. `Ok(None)` when nothing is selected.
    pub fn save_selected(&mut self) -> Result<Option<&Pair>> {
        match self.selected_mut() {
            Some(pair) => {
                caption::save(pair)?;
                Ok(Some(&*pair))
            }
            None => Ok(None),
        }
    }

    /// Reload the selected pair's caption from disk
    pub fn reload_selected(&mut self) -> Result<Option<Reload>> {
        match self.selected_mut() {
            Some(pair) => caption::reload(pair).map(Some),
            None => Ok(None),
        }
    }

    /// Pairs whose caption differs from the file on disk
    pub fn unsaved_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_dirty()).count()
    }

    /// Pairs whose caption could not be read during the scan
    pub fn unreadable_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.load_error.is_some()).count()
    }
}
