//! Import formats for the question bank.
//!
//! Two formats are accepted: a JSON array of question records, and a
//! plain-text transcript of `Q:`/`A:`-`D:`/`Correct:` blocks separated by
//! lines of three or more dashes.

mod json;
mod text;

pub use json::{FormatError, parse_json_array};
pub use text::{TextImport, parse_transcript};
