use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::QuestionRecord;

// A line of three or more dashes separates blocks.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*-{3,}[ \t]*$").expect("separator pattern should compile")
});

// Q:, A: through D:, Correct: <letter>, then an optional multi-line Explanation:.
static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\A\s*Q:[ \t]*([^\n]*)\n",
        r"[ \t]*A:[ \t]*([^\n]*)\n",
        r"[ \t]*B:[ \t]*([^\n]*)\n",
        r"[ \t]*C:[ \t]*([^\n]*)\n",
        r"[ \t]*D:[ \t]*([^\n]*)\n",
        r"[ \t]*Correct:[ \t]*([A-D])[ \t]*",
        r"(?:\n[ \t]*Explanation:[ \t]*((?s:.*)))?",
        r"\s*\z",
    ))
    .expect("block pattern should compile")
});

/// Outcome of parsing a plain-text transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextImport {
    pub records: Vec<QuestionRecord>,
    /// Non-blank blocks that did not match the grammar.
    pub skipped: usize,
}

impl TextImport {
    #[must_use]
    pub fn added(&self) -> usize {
        self.records.len()
    }
}

/// Parse a transcript of question blocks.
///
/// Every record has exactly four options. Blocks that do not match are
/// dropped and counted in `skipped`; this never fails.
#[must_use]
pub fn parse_transcript(text: &str) -> TextImport {
    let normalized = text.replace("\r\n", "\n");
    let mut import = TextImport::default();

    for chunk in SEPARATOR.split(&normalized) {
        if chunk.trim().is_empty() {
            continue;
        }
        match BLOCK.captures(chunk).and_then(|caps| record_from(&caps)) {
            Some(record) => import.records.push(record),
            None => import.skipped += 1,
        }
    }

    import
}

fn record_from(caps: &Captures<'_>) -> Option<QuestionRecord> {
    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str().trim());

    let options: Vec<String> = (2..=5).map(|i| field(i).to_owned()).collect();
    if options.iter().any(String::is_empty) {
        return None;
    }

    let letter = field(6).bytes().next()?.to_ascii_uppercase();
    let correct_index = usize::from(letter.checked_sub(b'A')?);

    let explanation = Some(field(7).to_owned());
    QuestionRecord::new(field(1), options, correct_index, explanation).ok()
}
