use super::{BackendError, Note, NoteBackend, NoteValidationError, Result};
use log::{trace, warn};
use std::{
    fs::{self, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

// Longest file name most filesystems accept
const MAX_NAME_LEN: usize = 255;

/// Stores every note as a file named after the note, inside one directory
#[derive(Debug)]
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Creates a new `FilesystemBackend` rooted at `path`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns `BackendError::DirectoryCreationError` if the directory cannot be created
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        if !base_path.is_dir() {
            warn!(
                "Cache directory {} does not exist. Creating it...",
                base_path.display()
            );
            fs::create_dir_all(&base_path).map_err(BackendError::DirectoryCreationError)?;
        }
        trace!("Using directory for notes: {}", base_path.display());
        Ok(Self { base_path })
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a note name to its file path after checking the name is safe to use as one
    fn note_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.base_path.join(name))
    }

    /// Like `note_path`, but the note file must already exist
    fn existing_note_path(&self, name: &str) -> Result<PathBuf> {
        let path = self.note_path(name)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(NoteValidationError::NoteNotFound(name.to_string()).into())
        }
    }

    /// Lists all regular files in the base directory as `(name, path)` pairs
    ///
    /// # Errors
    ///
    /// Returns `BackendError::DirectoryReadError` if the directory or an entry cannot be read
    fn list_note_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(&self.base_path).map_err(BackendError::DirectoryReadError)?;

        let mut files = Vec::new();
        for entry_result in entries {
            let entry = entry_result.map_err(BackendError::DirectoryReadError)?;
            let file_type = entry
                .file_type()
                .map_err(BackendError::DirectoryReadError)?;
            if !file_type.is_file() {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => files.push((name, entry.path())),
                Err(raw) => warn!("Skipping note file with a non UTF-8 name: {raw:?}"),
            }
        }
        trace!("Found notes: {:?}", &files);
        Ok(files)
    }
}

/// Checks that a note name can be used as a single file name inside the notes directory
///
/// # Errors
///
/// Returns `NoteValidationError::UnsafeName` for empty or overlong names, `.` and `..`,
/// and names containing path separators or control characters
pub fn validate_name(name: &str) -> Result<()> {
    let unsafe_name = name.is_empty()
        || name.len() > MAX_NAME_LEN
        || name == "."
        || name == ".."
        || name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());

    if unsafe_name {
        Err(NoteValidationError::UnsafeName(name.to_string()).into())
    } else {
        Ok(())
    }
}

// Permission problems get their own variant, everything else keeps the io error
fn map_io_error(e: io::Error, fallback: fn(io::Error) -> BackendError) -> BackendError {
    if e.kind() == ErrorKind::PermissionDenied {
        BackendError::PermissionDenied
    } else {
        fallback(e)
    }
}

// Invalid UTF-8 is replaced rather than failing the read
fn read_note_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| map_io_error(e, BackendError::FileReadError))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl NoteBackend for FilesystemBackend {
    /// Reads a note file by name
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `NoteValidationError::UnsafeName` if the name cannot be a file name
    /// - `NoteValidationError::NoteNotFound` if the file does not exist
    /// - `BackendError::FileReadError` if the file cannot be read
    fn get(&self, name: &str) -> Result<Note> {
        let path = self.existing_note_path(name)?;
        let text = read_note_text(&path)?;
        trace!("Read note file: {}", path.display());
        Ok(Note::new(name, text))
    }

    /// Reads every note file in the directory, in directory enumeration order
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any note file cannot be read
    fn list(&self) -> Result<Vec<Note>> {
        self.list_note_files()?
            .into_iter()
            .map(|(name, path)| read_note_text(&path).map(|text| Note::new(name, text)))
            .collect()
    }

    /// Creates a new note file
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `NoteValidationError::AlreadyExists` if a file with that name already exists
    /// - `BackendError::FileCreationError` if the file cannot be created
    /// - `BackendError::FileWriteError` if writing to the file fails
    fn create(&mut self, note: Note) -> Result<()> {
        let path = self.note_path(&note.name)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(NoteValidationError::AlreadyExists(note.name).into());
            }
            Err(e) => return Err(map_io_error(e, BackendError::FileCreationError).into()),
        };
        trace!("Created file: {}", path.display());

        file.write_all(note.text_or_empty().as_bytes())
            .map_err(|e| map_io_error(e, BackendError::FileWriteError))?;
        trace!("Wrote {} bytes to {}", note.text_or_empty().len(), path.display());
        Ok(())
    }

    /// Overwrites an existing note file. Missing text is written as an empty file
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `NoteValidationError::NoteNotFound` if the file does not exist
    /// - `BackendError::FileWriteError` if writing to the file fails
    fn update(&mut self, name: &str, text: Option<String>) -> Result<()> {
        let path = self.existing_note_path(name)?;
        fs::write(&path, text.unwrap_or_default())
            .map_err(|e| map_io_error(e, BackendError::FileWriteError))?;
        trace!("Overwrote note file: {}", path.display());
        Ok(())
    }

    /// Deletes a note file
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `NoteValidationError::NoteNotFound` if the file does not exist or the path is a directory
    /// - `BackendError::PermissionDenied` if the file can't be deleted due to missing privileges
    /// - `BackendError::FileDeleteError` for other filesystem failures
    fn delete(&mut self, name: &str) -> Result<()> {
        let path = self.existing_note_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                trace!("Deleted note file: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(NoteValidationError::NoteNotFound(name.to_string()).into())
            }
            Err(e) => Err(map_io_error(e, BackendError::FileDeleteError).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteError;

    fn backend() -> (tempfile::TempDir, FilesystemBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path()).unwrap();
        (dir, backend)
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("cache");
        let backend = FilesystemBackend::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(backend.base_path(), nested.as_path());
    }

    #[test]
    fn note_is_stored_as_raw_file() {
        let (dir, mut backend) = backend();
        backend.create(Note::new("todo", "buy milk")).unwrap();

        let raw = fs::read_to_string(dir.path().join("todo")).unwrap();
        assert_eq!(raw, "buy milk");
        assert_eq!(backend.get("todo").unwrap(), Note::new("todo", "buy milk"));
    }

    #[test]
    fn create_twice_keeps_first_text() {
        let (_dir, mut backend) = backend();
        backend.create(Note::new("n", "first")).unwrap();

        let err = backend.create(Note::new("n", "second")).unwrap_err();
        assert!(matches!(
            err,
            NoteError::Validation(NoteValidationError::AlreadyExists(ref name)) if name == "n"
        ));
        assert_eq!(backend.get("n").unwrap().text_or_empty(), "first");
    }

    #[test]
    fn missing_note_is_not_found_everywhere() {
        let (_dir, mut backend) = backend();
        let is_not_found =
            |e: NoteError| matches!(e, NoteError::Validation(NoteValidationError::NoteNotFound(_)));

        assert!(is_not_found(backend.get("ghost").unwrap_err()));
        assert!(is_not_found(backend.update("ghost", Some("x".into())).unwrap_err()));
        assert!(is_not_found(backend.delete("ghost").unwrap_err()));
    }

    #[test]
    fn update_without_text_empties_file() {
        let (dir, mut backend) = backend();
        backend.create(Note::new("n", "something")).unwrap();
        backend.update("n", None).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("n")).unwrap(), "");
    }

    #[test]
    fn delete_twice_is_not_found() {
        let (_dir, mut backend) = backend();
        backend.create(Note::new("n", "t")).unwrap();
        backend.delete("n").unwrap();
        assert!(matches!(
            backend.delete("n").unwrap_err(),
            NoteError::Validation(NoteValidationError::NoteNotFound(_))
        ));
        assert!(backend.get("n").is_err());
    }

    #[test]
    fn list_skips_directories() {
        let (dir, mut backend) = backend();
        backend.create(Note::new("a", "1")).unwrap();
        backend.create(Note::new("b", "2")).unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let mut notes = backend.list().unwrap();
        notes.sort_by(|x, y| x.name.cmp(&y.name));
        assert_eq!(notes, vec![Note::new("a", "1"), Note::new("b", "2")]);
    }

    #[test]
    fn directory_is_not_a_note() {
        let (dir, mut backend) = backend();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        assert!(backend.get("subdir").is_err());
        assert!(backend.delete("subdir").is_err());
        assert!(dir.path().join("subdir").is_dir());
    }

    #[test]
    fn non_utf8_files_are_read_lossily() {
        let (dir, backend) = backend();
        fs::write(dir.path().join("latin1"), [0x63, 0x61, 0x66, 0xE9]).unwrap();
        fs::write(dir.path().join("good"), "fine").unwrap();

        assert_eq!(backend.get("latin1").unwrap().text_or_empty(), "caf\u{FFFD}");
        assert_eq!(backend.list().unwrap().len(), 2);
    }

    #[test]
    fn rejects_names_that_escape_the_directory() {
        let (_dir, mut backend) = backend();
        for name in ["", ".", "..", "../etc", "a/b", "a\\b", "nul\0byte", "tab\tname"] {
            let err = backend.create(Note::new(name, "x")).unwrap_err();
            assert!(
                matches!(err, NoteError::Validation(NoteValidationError::UnsafeName(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(backend.get("..").is_err());
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
        assert!(validate_name("notes-2024_v1.txt").is_ok());
        assert!(validate_name("нотатка").is_ok());
    }
}
