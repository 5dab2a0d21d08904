//! SSML documents for the speech endpoint.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::consts::{DEFAULT_LANG, DEFAULT_VOICE};

/// Pause between the label line and the body of an evaluation script.
pub const LABEL_PAUSE: &str = "2s";

/// Pause after every dialogue line.
pub const DIALOGUE_PAUSE: &str = "150ms";

/// Speaker key used when a dialogue line names no speaker.
pub const DEFAULT_SPEAKER: &str = "__default";

const NAMED_RATES: &[&str] = &["x-slow", "slow", "medium", "fast", "x-fast", "default"];

static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?\d+%$").unwrap());
static SPEAKER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]{1,40}?)\s*:\s*(.+)$").unwrap());
static LEVEL_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)/Level([1-6])/").unwrap());

/// Escape text for use inside an SSML element or attribute.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// A prosody rate.
#[derive(Debug, Clone, PartialEq)]
pub enum Rate {
    /// Relative speed, `1.0` is normal.
    Multiplier(f32),
    /// Signed percentage such as `-10%`.
    Percent(String),
    /// One of the named SSML rates.
    Named(String),
}

impl Rate {
    /// Normalize a user-supplied rate. Percentages and named rates pass
    /// through, positive numbers are multipliers, anything else is `default`.
    pub fn parse(input: &str) -> Self {
        let s = input.trim();
        if PERCENT.is_match(s) {
            return Rate::Percent(s.to_string());
        }
        if NAMED_RATES.contains(&s) {
            return Rate::Named(s.to_string());
        }
        match s.parse::<f32>() {
            Ok(n) if n.is_finite() && n > 0.0 => Rate::Multiplier(n),
            _ => Rate::Named("default".to_string()),
        }
    }

    /// Render a multiplier as a signed percentage (`0.9` → `-10%`).
    pub fn as_percent(&self) -> Rate {
        match self {
            Rate::Multiplier(n) => {
                let pct = ((n - 1.0) * 100.0).round() as i32;
                if pct >= 0 {
                    Rate::Percent(format!("+{pct}%"))
                } else {
                    Rate::Percent(format!("{pct}%"))
                }
            }
            other => other.clone(),
        }
    }

    /// True when the rate does not change the voice's speed.
    pub fn is_neutral(&self) -> bool {
        match self {
            Rate::Multiplier(n) => (*n - 1.0).abs() < f32::EPSILON,
            Rate::Percent(p) => matches!(p.as_str(), "0%" | "+0%" | "-0%"),
            Rate::Named(n) => n == "default",
        }
    }

    fn attr(&self) -> String {
        match self {
            Rate::Multiplier(n) => n.to_string(),
            Rate::Percent(p) | Rate::Named(p) => p.clone(),
        }
    }
}

/// A synthesis voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub name: String,
    pub lang: String,
    pub gender: Option<String>,
}

impl Voice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: DEFAULT_LANG.to_string(),
            gender: None,
        }
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }
}

impl Default for Voice {
    fn default() -> Self {
        Voice::new(DEFAULT_VOICE).with_gender("Female")
    }
}

/// Inline content of a voice block.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Break(String),
}

#[derive(Debug, Clone, PartialEq)]
struct VoiceBlock {
    voice: Voice,
    rate: Option<Rate>,
    segments: Vec<Segment>,
}

/// An SSML `speak` document made of voice blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Ssml {
    lang: String,
    blocks: Vec<VoiceBlock>,
}

impl Default for Ssml {
    fn default() -> Self {
        Self::new(DEFAULT_LANG)
    }
}

impl Ssml {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            blocks: Vec::new(),
        }
    }

    /// Append a voice block. A neutral rate emits no `prosody` element.
    pub fn voice(mut self, voice: &Voice, rate: &Rate, segments: Vec<Segment>) -> Self {
        self.blocks.push(VoiceBlock {
            voice: voice.clone(),
            rate: (!rate.is_neutral()).then(|| rate.clone()),
            segments,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"{}\">\n",
            escape_xml(&self.lang)
        );
        for block in &self.blocks {
            let voice = &block.voice;
            out.push_str(&format!(r#"<voice xml:lang="{}""#, escape_xml(&voice.lang)));
            if let Some(gender) = &voice.gender {
                out.push_str(&format!(r#" xml:gender="{}""#, escape_xml(gender)));
            }
            out.push_str(&format!(r#" name="{}">"#, escape_xml(&voice.name)));

            let body: String = block
                .segments
                .iter()
                .map(|segment| match segment {
                    Segment::Text(text) => escape_xml(text),
                    Segment::Break(time) => format!(r#"<break time="{}"/>"#, escape_xml(time)),
                })
                .collect();
            match &block.rate {
                Some(rate) => out.push_str(&format!(
                    r#"<prosody rate="{}">{body}</prosody>"#,
                    escape_xml(&rate.attr())
                )),
                None => out.push_str(&body),
            }
            out.push_str("</voice>\n");
        }
        out.push_str("</speak>");
        out
    }
}

/// Plain narration of `text` by one voice.
pub fn narration(text: &str, voice: &Voice, rate: &Rate) -> Ssml {
    Ssml::default().voice(voice, rate, vec![Segment::Text(text.trim().to_string())])
}

/// Narration where the first line is a label (e.g. `Question 1.`), read
/// before a pause of `pause`. Single-line text is read as plain narration.
pub fn labelled_narration(text: &str, voice: &Voice, rate: &Rate, pause: &str) -> Ssml {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return narration(text, voice, rate);
    }
    let label = lines[0].trim().to_string();
    let body = lines[1..].join("\n").trim().to_string();
    Ssml::default().voice(
        voice,
        rate,
        vec![
            Segment::Text(label),
            Segment::Break(pause.to_string()),
            Segment::Text(body),
        ],
    )
}

/// Split a dialogue line into `(speaker, text)`. Lines with no speaker
/// prefix are attributed to [`DEFAULT_SPEAKER`]. Blank lines yield `None`.
pub fn parse_dialogue_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match SPEAKER_LINE.captures(line) {
        Some(caps) => {
            let speaker = caps.get(1).map_or("", |m| m.as_str()).trim();
            let text = caps.get(2).map_or("", |m| m.as_str()).trim();
            Some((speaker, text))
        }
        None => Some((DEFAULT_SPEAKER, line)),
    }
}

/// Build a multi-voice dialogue. Each speaker's voice comes from `voices`,
/// falling back to the [`DEFAULT_SPEAKER`] entry and then to the default
/// narrator.
pub fn dialogue<'a, I>(lines: I, voices: &HashMap<String, String>, rate: &Rate) -> Ssml
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ssml = Ssml::default();
    for (speaker, text) in lines.into_iter().filter_map(parse_dialogue_line) {
        let name = voices
            .get(speaker)
            .or_else(|| voices.get(DEFAULT_SPEAKER))
            .map(String::as_str)
            .unwrap_or(DEFAULT_VOICE);
        ssml = ssml.voice(
            &Voice::new(name),
            rate,
            vec![
                Segment::Text(text.to_string()),
                Segment::Break(DIALOGUE_PAUSE.to_string()),
            ],
        );
    }
    ssml
}

/// Course level from a `/Level<n>/` path segment (1 to 6).
pub fn infer_level(path: &Path) -> Option<u8> {
    let path = path.to_string_lossy().replace('\\', "/");
    LEVEL_SEGMENT
        .captures(&path)
        .and_then(|caps| caps[1].parse().ok())
}

/// Speaking rate tuned to the target words-per-minute of each level.
pub fn rate_for_level(level: Option<u8>) -> Rate {
    let pct = match level {
        Some(1) => "-30%",
        Some(2) => "-27%",
        Some(3) => "-21%",
        Some(4) => "-15%",
        Some(5) => "-12%",
        Some(6) => "-3%",
        _ => "0%",
    };
    Rate::Percent(pct.to_string())
}
