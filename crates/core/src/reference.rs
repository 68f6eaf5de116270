//! Heuristic extraction of chunk keys and display topics from freeform
//! source-reference strings (e.g. `"Chunk 3 - EXACT quote: '...'"`).
//!
//! Everything here is pure and deterministic: string in, string out, no
//! persistence interaction.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ChunkKey, ChunkNumber, FileId};

/// Default cap for formatted topic labels.
pub const TOPIC_MAX_LENGTH: usize = 60;

/// Labels shorter than this fall back to a generic section name.
const TOPIC_MIN_LENGTH: usize = 5;

static CHUNK_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chunk\s*(\d+)").expect("valid chunk number pattern"));
static EXACT_QUOTE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:exact)\s+quote\s*:").expect("valid quote marker pattern"));
static QUOTE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"quote\s*:").expect("valid quote marker pattern"));
static CHUNK_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chunk\s*\d+\s*-\s*").expect("valid chunk prefix pattern"));
static QUOTED_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^'"]{10,})['"]"#).expect("valid quoted span pattern"));
static EDGE_PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\W+|\W+$").expect("valid edge trim pattern"));

/// Finds the first integer following a case-insensitive `chunk` token.
#[must_use]
pub fn chunk_number_in(reference: &str) -> ChunkNumber {
    CHUNK_NUMBER_RE
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map_or(ChunkNumber::Unknown, ChunkNumber::Numbered)
}

/// Derives the ledger key for a source reference.
///
/// With a filename the key is `{file_id}_chunk_{number}` (number `unknown`
/// when the reference names none). Without one, the key degrades to a slug of
/// the reference text, which aggregates under the synthetic `unknown` bucket.
#[must_use]
pub fn extract_key(source_reference: &str, filename: Option<&str>) -> ChunkKey {
    match filename {
        Some(name) => ChunkKey::indexed(
            &FileId::from_filename(name),
            chunk_number_in(source_reference),
        ),
        None => ChunkKey::slug_of(source_reference),
    }
}

/// Turns a machine-generated source reference into a user-presentable topic
/// label of at most `max_length` characters (plus a trailing ellipsis when
/// truncated).
///
/// Best-effort pipeline: strip quote markers, pull out the chunk number,
/// prefer quoted content over surrounding scaffolding, fix casing
/// conservatively, reattach the number as a `Section N:` prefix when there is
/// headroom, and truncate at a word boundary where possible. Falls back to
/// `Section {n}` / `Content Area` when nothing presentable remains.
#[must_use]
pub fn format_topic(source_reference: &str, max_length: usize) -> String {
    if source_reference.is_empty() {
        return "Unknown Topic".to_string();
    }

    let mut text = EXACT_QUOTE_MARKER_RE
        .replace_all(source_reference, "")
        .into_owned();
    text = QUOTE_MARKER_RE.replace_all(&text, "").into_owned();

    // Capture the number before stripping the "Chunk N -" scaffolding so it
    // can be reattached as a section prefix later.
    let chunk_num = match chunk_number_in(&text) {
        ChunkNumber::Numbered(n) => Some(n),
        ChunkNumber::Unknown => None,
    };
    text = CHUNK_PREFIX_RE.replace_all(&text, "").into_owned();

    // A substantial quoted span beats whatever surrounds it.
    if let Some(span) = QUOTED_SPAN_RE
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
    {
        text = span;
    }

    text = text.trim().to_string();
    text = EDGE_PUNCTUATION_RE.replace_all(&text, "").into_owned();

    let mut words: Vec<&str> = text.split_whitespace().collect();
    let first_word;
    if !words.is_empty() && words.iter().take(3).all(|w| is_lower_or_nonalpha(w)) {
        first_word = capitalize(words[0]);
        words[0] = &first_word;
    }
    let mut result = words.join(" ");

    if let Some(n) = chunk_num {
        if result.chars().count() < max_length.saturating_sub(10) {
            result = format!("Section {n}: {result}");
        }
    }

    if result.chars().count() > max_length {
        let head: String = result.chars().take(max_length).collect();
        let truncated = match head.rsplit_once(' ') {
            Some((left, _)) => left.to_string(),
            None => head.clone(),
        };
        #[allow(clippy::cast_precision_loss)]
        let keeps_most = truncated.chars().count() as f64 > max_length as f64 * 0.7;
        result = if keeps_most {
            format!("{truncated}...")
        } else {
            format!("{head}...")
        };
    }

    if result.trim().chars().count() < TOPIC_MIN_LENGTH {
        return match chunk_num {
            Some(n) => format!("Section {n}"),
            None => "Content Area".to_string(),
        };
    }

    result
}

/// Mirrors the conservative-casing test: a word qualifies when it is entirely
/// lowercase, or when it is not purely alphabetic.
fn is_lower_or_nonalpha(word: &str) -> bool {
    let has_cased = word
        .chars()
        .any(|c| c.is_lowercase() || c.is_uppercase());
    let is_lower = has_cased && !word.chars().any(char::is_uppercase);
    let is_alpha = !word.is_empty() && word.chars().all(char::is_alphabetic);
    is_lower || !is_alpha
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
