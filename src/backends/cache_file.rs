use super::{BackendError, Note, NoteBackend, NoteValidationError, Result};
use log::{debug, info};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Keeps every note in memory and mirrors them to a single JSON cache file.
///
/// The cache file holds a JSON array of `{name, text}` objects and is rewritten
/// in full after every mutation. Notes keep their insertion order.
#[derive(Debug)]
pub struct CacheFileBackend {
    cache_path: PathBuf,
    notes: Vec<Note>,
    // name -> position in `notes`
    index: HashMap<String, usize>,
}

impl CacheFileBackend {
    /// Loads notes from the cache file at `path`, or creates the file holding `[]`
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `BackendError::CacheRead` if an existing cache file cannot be read
    /// - `BackendError::CacheParse` if an existing cache file is not a JSON array of notes
    /// - `BackendError::DirectoryCreationError` or `BackendError::CacheWrite` if a new cache file cannot be created
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let cache_path = path.as_ref().to_path_buf();

        if cache_path.exists() {
            let data = fs::read(&cache_path).map_err(BackendError::CacheRead)?;
            let stored: Vec<Note> =
                serde_json::from_slice(&data).map_err(BackendError::CacheParse)?;
            let (notes, index) = merge_duplicates(stored);
            info!(
                "Cache file loaded from {} ({} notes)",
                cache_path.display(),
                notes.len()
            );
            return Ok(Self {
                cache_path,
                notes,
                index,
            });
        }

        if let Some(parent) = cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(BackendError::DirectoryCreationError)?;
        }
        let backend = Self {
            cache_path,
            notes: Vec::new(),
            index: HashMap::new(),
        };
        backend.save()?;
        info!("Cache file created at {}", backend.cache_path.display());
        Ok(backend)
    }

    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn position_or_not_found(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| NoteValidationError::NoteNotFound(name.to_string()).into())
    }

    /// Rewrites the whole cache file from memory, pretty printed with 2-space indentation
    fn save(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.notes)
            .map_err(|e| BackendError::Other(anyhow::Error::new(e)))?;
        fs::write(&self.cache_path, data).map_err(BackendError::CacheWrite)?;
        debug!("Cache saved to {}", self.cache_path.display());
        Ok(())
    }
}

// A name listed twice keeps its first position and its last text
fn merge_duplicates(stored: Vec<Note>) -> (Vec<Note>, HashMap<String, usize>) {
    let mut notes: Vec<Note> = Vec::with_capacity(stored.len());
    let mut index = HashMap::with_capacity(stored.len());
    for note in stored {
        match index.get(&note.name) {
            Some(&idx) => notes[idx] = note,
            None => {
                index.insert(note.name.clone(), notes.len());
                notes.push(note);
            }
        }
    }
    (notes, index)
}

impl NoteBackend for CacheFileBackend {
    fn get(&self, name: &str) -> Result<Note> {
        let idx = self.position_or_not_found(name)?;
        Ok(self.notes[idx].clone())
    }

    fn list(&self) -> Result<Vec<Note>> {
        Ok(self.notes.clone())
    }

    fn create(&mut self, note: Note) -> Result<()> {
        if self.position(&note.name).is_some() {
            return Err(NoteValidationError::AlreadyExists(note.name).into());
        }
        self.index.insert(note.name.clone(), self.notes.len());
        self.notes.push(note);
        self.save()
    }

    /// Replaces the text of a note and persists. A missing text is stored as absent
    fn update(&mut self, name: &str, text: Option<String>) -> Result<()> {
        let idx = self.position_or_not_found(name)?;
        self.notes[idx].text = text;
        self.save()
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        let idx = self.position_or_not_found(name)?;
        self.notes.remove(idx);
        self.index.remove(name);
        for note in &self.notes[idx..] {
            if let Some(pos) = self.index.get_mut(&note.name) {
                *pos -= 1;
            }
        }
        self.save()
    }

    fn flush(&mut self) -> Result<()> {
        self.save()
    }
}
