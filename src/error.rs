/// Error types shared by the scanner, caption store and preferences
///
/// Every failure the dataset layer can hit is reported as one of these
/// variants so the UI can show it in the status line. The enum is `Clone`
/// because errors travel inside iced messages.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Caption is not valid UTF-8, or image data could not be decoded
    #[error("could not decode {}", .0.display())]
    Decode(PathBuf),

    /// The bytes read back after a save differ from the bytes written
    #[error("read-back of {} does not match what was written", .0.display())]
    VerifyMismatch(PathBuf),

    #[error("I/O error on {}: {message}", .path.display())]
    Io {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },

    #[error("preferences at {}: {message}", .path.display())]
    Preferences { path: PathBuf, message: String },
}

impl Error {
    /// Classify an I/O error that happened while touching `path`
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
            kind => Error::Io {
                path: path.to_path_buf(),
                kind,
                message: err.to_string(),
            },
        }
    }

    pub fn preferences(path: &Path, message: impl fmt::Display) -> Self {
        Error::Preferences {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_kinds_are_classified() {
        let path = Path::new("/data/cat.txt");

        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(Error::from_io(path, &not_found), Error::NotFound(path.into()));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(Error::from_io(path, &denied), Error::PermissionDenied(path.into()));

        let other = io::Error::new(io::ErrorKind::Other, "disk full");
        match Error::from_io(path, &other) {
            Error::Io { kind, message, .. } => {
                assert_eq!(kind, io::ErrorKind::Other);
                assert!(message.contains("disk full"));
            }
            e => panic!("unexpected variant: {:?}", e),
        }
    }
}
