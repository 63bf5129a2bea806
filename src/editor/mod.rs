//! The edit surface: a rope-backed text buffer with cursor management.
//!
//! The buffer is the single writer of the content store — after every
//! mutating message the app flushes its text into the store, which is
//! what triggers a preview re-render.

mod buffer;

pub use buffer::{Cursor, Direction, EditorBuffer};
