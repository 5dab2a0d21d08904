//! Blank-filling for dictation templates.
//!
//! A blank is any run of three or more underscores. Answers are consumed left
//! to right; blanks past the last answer stay in the text verbatim.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{3,}").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Fill the blanks in `template` with `answers`, in order, then collapse
/// whitespace runs to a single space and trim.
///
/// Never fails: surplus answers are ignored and surplus blanks are kept.
pub fn fill_blanks<S: AsRef<str>>(template: &str, answers: &[S]) -> String {
    let mut cursor = 0;
    let filled = PLACEHOLDER.replace_all(template, |caps: &Captures| match answers.get(cursor) {
        Some(answer) => {
            cursor += 1;
            answer.as_ref().to_string()
        }
        None => caps[0].to_string(),
    });
    normalize_whitespace(&filled)
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Number of blanks in a template.
pub fn count_blanks(template: &str) -> usize {
    PLACEHOLDER.find_iter(template).count()
}
