pub mod cache_file;
pub mod filesystem;

pub use cache_file::CacheFileBackend;
pub use filesystem::FilesystemBackend;

pub use crate::{BackendError, Note, NoteBackend, NoteError, NoteValidationError, Result};
