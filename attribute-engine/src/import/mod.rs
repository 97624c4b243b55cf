//! Bulk import: file preview and the import session

mod preview;
mod session;

pub use preview::{PREVIEW_ROWS, SpreadsheetDecoder, detect_format, read_preview};
pub use session::{ImportSession, ImportStep};
