//! Local drafts of the open project's two files

mod buffer;
mod encoding;
mod surface;

pub use buffer::{DraftBuffer, DraftBufferStore, LoadTicket, Slot, LOAD_ERROR_TEXT};
pub use encoding::{decode_files, decode_text, encode_files, encode_text};
pub use surface::{EditorSurface, FileSurface, MemorySurface};
