use crate::{Note, NoteBackend, NoteValidationError, Result};
use log::{trace, warn};
use std::sync::{Mutex, MutexGuard};

/// How strictly `create_note` checks its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePolicy {
    /// Both the name and the text must be present and non-empty
    RequireFields,
    /// Only the name must be present, and it may be empty. A missing text is stored as absent
    Lenient,
}

pub struct NoteService {
    repo: Mutex<Box<dyn NoteBackend + Send>>,
    policy: CreatePolicy,
}

impl NoteService {
    pub fn new(repo: Box<dyn NoteBackend + Send>, policy: CreatePolicy) -> Self {
        Self {
            repo: Mutex::new(repo),
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> CreatePolicy {
        self.policy
    }

    // Every operation holds the lock for its whole read/modify/persist sequence
    fn repo(&self) -> MutexGuard<'_, Box<dyn NoteBackend + Send>> {
        self.repo.lock().unwrap_or_else(|poisoned| {
            // Backends only change state after a step succeeds, so the data is still usable
            warn!("Note storage lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // Retrieve a single note by name
    pub fn read_note(&self, name: &str) -> Result<Note> {
        self.repo().get(name)
    }

    // Retrieve all notes with their text
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        self.repo().list()
    }

    // Create a new note after checking the input against the create policy
    pub fn create_note(&self, name: Option<String>, text: Option<String>) -> Result<()> {
        let note = Self::build_note(self.policy, name, text)?;
        trace!("Creating note: {}", note.name);
        self.repo().create(note)
    }

    // Replace the text of an existing note
    pub fn update_note(&self, name: &str, text: Option<String>) -> Result<()> {
        trace!("Updating note: {name}");
        self.repo().update(name, text)
    }

    // Delete note by name
    pub fn delete_note(&self, name: &str) -> Result<()> {
        trace!("Deleting note: {name}");
        self.repo().delete(name)
    }

    // Persist anything the backend only holds in memory
    pub fn flush(&self) -> Result<()> {
        self.repo().flush()
    }

    // --- small helpers ---

    // Validate create input according to policy and assemble the note
    pub fn build_note(
        policy: CreatePolicy,
        name: Option<String>,
        text: Option<String>,
    ) -> Result<Note> {
        let Some(name) = name else {
            return Err(NoteValidationError::InvalidInput.into());
        };

        match policy {
            CreatePolicy::RequireFields => match text {
                Some(text) if !name.is_empty() && !text.is_empty() => Ok(Note::new(name, text)),
                _ => Err(NoteValidationError::InvalidInput.into()),
            },
            CreatePolicy::Lenient => Ok(Note { name, text }),
        }
    }
}
