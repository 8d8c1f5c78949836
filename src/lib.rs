#![deny(clippy::cargo)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::nursery)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![deny(clippy::suspicious)]
#![deny(clippy::pedantic)]

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

pub mod app;
pub mod backends;
pub mod http;
pub mod setup;

// More convenient Result type
pub type Result<T> = std::result::Result<T, NoteError>;

/// A named piece of text.
///
/// `text` is `None` when a note was stored without any text field. Such notes
/// serialize without a `text` key, and read back as an empty body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Note {
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
        }
    }

    /// The note text, or an empty string when none was stored
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Trait to be implemented by all backends that manage storing and retrieving notes
pub trait NoteBackend {
    /// Fetches a note by name
    ///
    /// # Errors
    ///
    /// Returns `NoteValidationError::NoteNotFound` if no note has that name
    fn get(&self, name: &str) -> Result<Note>;

    /// Returns every stored note, in the backend's natural order
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn list(&self) -> Result<Vec<Note>>;

    /// Stores a new note
    ///
    /// # Errors
    ///
    /// Returns `NoteValidationError::AlreadyExists` if the name is taken
    fn create(&mut self, note: Note) -> Result<()>;

    /// Replaces the text of an existing note
    ///
    /// # Errors
    ///
    /// Returns `NoteValidationError::NoteNotFound` if no note has that name
    fn update(&mut self, name: &str, text: Option<String>) -> Result<()>;

    /// Removes a note by name
    ///
    /// # Errors
    ///
    /// Returns `NoteValidationError::NoteNotFound` if no note has that name
    fn delete(&mut self, name: &str) -> Result<()>;

    /// Writes out anything the backend only holds in memory
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

// Enum for all possible validation, backend and startup errors
#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Validation(#[from] NoteValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

// Enum for all possible request validation errors
#[derive(Debug, Error)]
pub enum NoteValidationError {
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Note already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input")]
    InvalidInput,

    #[error("Note name is not allowed: {0:?}")]
    UnsafeName(String),
}

// Enum for all possible repository/backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed creating directory for notes")]
    DirectoryCreationError(#[source] io::Error),

    #[error("Failed reading directory contents")]
    DirectoryReadError(#[source] io::Error),

    #[error("Failed creating file for note data")]
    FileCreationError(#[source] io::Error),

    #[error("Failed writing note data to file")]
    FileWriteError(#[source] io::Error),

    #[error("Failed reading note data from file")]
    FileReadError(#[source] io::Error),

    #[error("Failed deleting note file")]
    FileDeleteError(#[source] io::Error),

    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error("Failed reading cache file")]
    CacheRead(#[source] io::Error),

    #[error("Cache file is not a valid JSON array of notes")]
    CacheParse(#[source] serde_json::Error),

    #[error("Failed writing cache file")]
    CacheWrite(#[source] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error), // Used as fallback
}

// Enum for all possible server startup errors
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Could not resolve listen address {0}")]
    InvalidAddress(String, #[source] io::Error),

    #[error("Failed binding to {0}")]
    Bind(String, #[source] io::Error),

    #[error("Server stopped unexpectedly")]
    Serve(#[source] io::Error),
}
