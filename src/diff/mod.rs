pub mod file;
pub mod full;
pub mod hunk;
pub mod lex;

pub use file::{Changes, Entry};
pub use full::{Document, split_files};
pub use hunk::{Hunk, HunkHeader};
pub use lex::{Line, LineBreak, LineKind};
