/// Caption file persistence
///
/// Captions are plain UTF-8 text files next to the images. Saves go through
/// a temp file in the same directory which is then renamed over the target,
/// and the result is read back and compared before the save is reported as
/// successful.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::Builder;

use crate::error::{Error, Result};
use crate::state::data::Pair;

/// Outcome of a caption reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// The caption text was replaced with the file content
    Updated,
    /// The caption file does not exist; the in-memory text was kept
    Missing,
}

/// Read a caption file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_caption(path: &Path) -> Result<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::from_io(path, &e)),
    };

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| Error::Decode(path.to_path_buf()))
}

/// Write the pair's caption text to its caption file
///
/// Creates missing parent directories. An existing caption file keeps its
/// permissions; a new one gets the same mode as any other new file. Fails
/// with `Error::VerifyMismatch` if the file content read back after the
/// write is not byte-identical.
///
/// A caption that could not be read is never overwritten with unedited
/// text. The stored load error is returned instead.
pub fn save(pair: &mut Pair) -> Result<()> {
    if let Some(err) = &pair.load_error {
        if !pair.has_edits() {
            log::warn!("Not overwriting unreadable caption {}", pair.caption_path.display());
            return Err(err.clone());
        }
    }

    let path = pair.caption_path.clone();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, &e))?;

    let mut builder = Builder::new();
    builder.prefix(".caption-").suffix(".tmp");
    // Mode before the umask, as for a plain create
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut temp = builder
        .tempfile_in(parent)
        .map_err(|e| Error::from_io(parent, &e))?;

    if let Some(existing) = fs::metadata(&path).ok().filter(|m| m.is_file()) {
        temp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| Error::from_io(temp.path(), &e))?;
    }

    temp.write_all(pair.caption_text.as_bytes())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| Error::from_io(temp.path(), &e))?;
    temp.persist(&path).map_err(|e| Error::from_io(&path, &e.error))?;

    let written = fs::read(&path).map_err(|e| Error::from_io(&path, &e))?;
    if written != pair.caption_text.as_bytes() {
        log::warn!("Read-back mismatch after saving {}", path.display());
        return Err(Error::VerifyMismatch(path));
    }

    log::info!("Saved caption {} ({} bytes)", path.display(), written.len());
    pair.mark_synced(pair.caption_text.clone());
    Ok(())
}

/// Re-read the pair's caption file, replacing the in-memory text
///
/// A missing file leaves the pair untouched. So does a read or decode
/// error, which is returned to the caller.
pub fn reload(pair: &mut Pair) -> Result<Reload> {
    match read_caption(&pair.caption_path)? {
        Some(text) => {
            pair.caption_text = text.clone();
            pair.mark_synced(text);
            Ok(Reload::Updated)
        }
        None => Ok(Reload::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pair_in(dir: &Path, caption: &str) -> Pair {
        let on_disk = read_caption(&dir.join(caption)).unwrap();
        Pair::new(dir.join("img.png"), dir.join(caption), on_disk)
    }

    #[test]
    fn test_read_missing_caption() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_caption(&dir.path().join("nope.txt")).unwrap(), None);
    }

    #[test]
    fn test_read_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        assert_eq!(read_caption(&path), Err(Error::Decode(path)));
    }

    #[test]
    fn test_save_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut pair = pair_in(dir.path(), "img.txt");
        pair.caption_text = "a dog".to_string();
        assert!(pair.is_dirty());

        save(&mut pair).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("img.txt")).unwrap(), "a dog");
        assert!(!pair.is_dirty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut pair = Pair::new(
            dir.path().join("img.png"),
            dir.path().join("captions").join("nested").join("img.txt"),
            None,
        );
        pair.caption_text = "nested".to_string();

        save(&mut pair).unwrap();

        assert_eq!(fs::read_to_string(&pair.caption_path).unwrap(), "nested");
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("img.txt"), "old caption that is longer").unwrap();
        let mut pair = pair_in(dir.path(), "img.txt");
        pair.caption_text = "new".to_string();

        save(&mut pair).unwrap();

        let names: Vec<PathBuf> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(names, vec![dir.path().join("img.txt")]);
        assert_eq!(fs::read_to_string(dir.path().join("img.txt")).unwrap(), "new");
    }

    #[test]
    fn test_failed_save_keeps_pair_dirty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blocker"), "a file, not a directory").unwrap();
        let mut pair = Pair::new(
            dir.path().join("img.png"),
            dir.path().join("blocker").join("img.txt"),
            None,
        );
        pair.caption_text = "a dog".to_string();

        assert!(matches!(save(&mut pair), Err(Error::Io { .. })));
        assert!(pair.is_dirty());
        assert_eq!(pair.caption_text, "a dog");
    }

    #[test]
    fn test_unreadable_caption_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.txt");
        let bytes = [0xffu8, 0xfe, 0x41];
        fs::write(&path, bytes).unwrap();
        let mut pair = Pair::new(dir.path().join("img.png"), path.clone(), None);
        pair.load_error = Some(Error::Decode(path.clone()));

        assert_eq!(save(&mut pair), Err(Error::Decode(path.clone())));
        assert_eq!(fs::read(&path).unwrap(), bytes);
        assert!(pair.is_dirty());

        pair.caption_text = "a cat".to_string();
        save(&mut pair).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a cat");
        assert!(!pair.is_dirty());
        assert_eq!(pair.load_error, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.txt");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        let mut pair = pair_in(dir.path(), "img.txt");
        pair.caption_text = "new".to_string();

        save(&mut pair).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_caption_gets_default_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        fs::write(&reference, "").unwrap();
        let mut pair = pair_in(dir.path(), "img.txt");
        pair.caption_text = "a dog".to_string();

        save(&mut pair).unwrap();

        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&pair.caption_path), mode(&reference));
    }

    #[test]
    fn test_save_then_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut pair = pair_in(dir.path(), "img.caption");
        let text = "a photo of sks person, smiling\nsecond line ✓".to_string();
        pair.caption_text = text.clone();
        save(&mut pair).unwrap();

        pair.caption_text = "scratch edit".to_string();
        assert_eq!(reload(&mut pair).unwrap(), Reload::Updated);

        assert_eq!(pair.caption_text, text);
        assert!(!pair.is_dirty());
    }

    #[test]
    fn test_reload_missing_file_keeps_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut pair = pair_in(dir.path(), "img.txt");
        pair.caption_text = "unsaved".to_string();

        assert_eq!(reload(&mut pair).unwrap(), Reload::Missing);
        assert_eq!(pair.caption_text, "unsaved");
    }

    #[test]
    fn test_reload_decode_error_keeps_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut pair = pair_in(dir.path(), "img.txt");
        pair.caption_text = "unsaved".to_string();
        fs::write(&pair.caption_path, [0xff, 0xff]).unwrap();

        assert!(matches!(reload(&mut pair), Err(Error::Decode(_))));
        assert_eq!(pair.caption_text, "unsaved");
    }
}
