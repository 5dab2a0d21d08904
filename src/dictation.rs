//! Dictation lessons: question variants and the text each clip speaks.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::blanks::{count_blanks, fill_blanks};

/// Shown when a dictation file has no `lessonId`.
pub const UNKNOWN_LESSON: &str = "UNKNOWN";

#[derive(Debug, Error, PartialEq)]
pub enum DictationError {
    #[error("unsupported question variant: {0}")]
    UnsupportedVariant(String),
    #[error("question {question} has no `{field}` field")]
    MissingField { question: String, field: &'static str },
}

/// Shape of a dictation question, deciding which fields feed the blanks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// One `sentence` with its blanks.
    SingleSentence,
    /// `sentence1` and `sentence2`, read as one passage.
    TwoSentence,
}

impl Variant {
    /// Resolve a variant from its name or from a dictation part label
    /// (`A` and `C` are single-sentence parts, `B` is two-sentence).
    pub fn from_label(label: &str) -> Result<Self, DictationError> {
        match label {
            "single-sentence" | "A" | "C" => Ok(Variant::SingleSentence),
            "two-sentence" | "B" => Ok(Variant::TwoSentence),
            other => Err(DictationError::UnsupportedVariant(other.to_string())),
        }
    }
}

/// One question as stored in `dictation.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub sentence: Option<String>,
    #[serde(default)]
    pub sentence1: Option<String>,
    #[serde(default)]
    pub sentence2: Option<String>,
    #[serde(default)]
    pub answers: Vec<String>,
}

impl Question {
    fn field<'a>(&'a self, value: &'a Option<String>, field: &'static str) -> Result<&'a str, DictationError> {
        value.as_deref().ok_or_else(|| DictationError::MissingField {
            question: self.id.clone(),
            field,
        })
    }
}

/// Build the fully resolved sentence spoken for a question.
///
/// Two-sentence questions are joined with a space before filling, so the
/// answer cursor runs across both sentences.
pub fn build_question_text(label: &str, question: &Question) -> Result<String, DictationError> {
    match Variant::from_label(label)? {
        Variant::SingleSentence => {
            let sentence = question.field(&question.sentence, "sentence")?;
            Ok(fill_blanks(sentence, &question.answers))
        }
        Variant::TwoSentence => {
            let first = question.field(&question.sentence1, "sentence1")?;
            let second = question.field(&question.sentence2, "sentence2")?;
            Ok(fill_blanks(&format!("{first} {second}"), &question.answers))
        }
    }
}

/// A dictation file: questions grouped by part, in document order.
#[derive(Debug, Clone, Deserialize)]
pub struct DictationFile {
    #[serde(rename = "lessonId", default)]
    pub lesson_id: Option<String>,
    #[serde(deserialize_with = "parts_in_order")]
    pub parts: Vec<(String, Vec<Question>)>,
}

fn parts_in_order<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<Question>)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
    map.into_iter()
        .map(|(label, questions)| {
            let questions = Vec::<Question>::deserialize(questions).map_err(serde::de::Error::custom)?;
            Ok((label, questions))
        })
        .collect()
}

impl DictationFile {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn lesson_id(&self) -> &str {
        self.lesson_id.as_deref().unwrap_or(UNKNOWN_LESSON)
    }
}

/// A resolved clip ready for synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub part: String,
    pub question_id: String,
    pub text: String,
    pub out_path: PathBuf,
}

/// Resolve every question to its clip (`<out_dir>/<part>/<id>.wav`).
///
/// Runs over the whole file before anything is synthesized, so a bad part
/// label fails the job without writing a single file.
pub fn plan_clips(file: &DictationFile, out_dir: &Path) -> Result<Vec<Clip>, DictationError> {
    let mut clips = Vec::new();
    for (part, questions) in &file.parts {
        for question in questions {
            let text = build_question_text(part, question)?;
            let unfilled = count_blanks(&text);
            if unfilled > 0 {
                debug!(
                    part = %part,
                    question = %question.id,
                    unfilled,
                    "more blanks than answers"
                );
            }
            clips.push(Clip {
                part: part.clone(),
                question_id: question.id.clone(),
                text,
                out_path: out_dir.join(part).join(format!("{}.wav", question.id)),
            });
        }
    }
    Ok(clips)
}
