//! Best-effort interpretation of captured backend output.
//!
//! Nothing in here fails a task: every extractor degrades to a fallback
//! value, because partial information is more useful than none.

mod coverage;
mod session_id;
mod stream;
mod summary;

pub use coverage::extract_coverage;
pub use session_id::{extract_session_id, fallback_session_id};
pub use stream::{assistant_text_in_line, touched_files_in_line};
pub use summary::{extract_key_output, extract_message_summary};

/// Default maximum length for summary lines in reports.
pub const SUMMARY_MAX_CHARS: usize = 200;
