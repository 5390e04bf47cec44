pub mod note;
pub mod store;

pub use note::{Note, NoteId, PROVISIONAL_PREFIX};
pub use store::{NoteStore, Upsert, RETENTION_MS};
