use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// At most this many question entries are retained per chunk; oldest first out.
pub const QUESTION_HISTORY_LIMIT: usize = 10;

/// Stored question text is truncated to this many characters.
pub const QUESTION_TEXT_LIMIT: usize = 200;

/// Legacy placeholder meaning "no real filename known yet". Written by older
/// snapshots; never treated as a resolved filename.
pub const UNKNOWN_FILE_SENTINEL: &str = "unknown_file";

/// Filters a filename candidate down to a genuinely resolved value.
///
/// Empty strings and the legacy placeholder both read as absent.
#[must_use]
pub fn resolved_filename(candidate: Option<&str>) -> Option<&str> {
    candidate.filter(|name| !name.is_empty() && *name != UNKNOWN_FILE_SENTINEL)
}

//
// ─── QUESTION RECORD ───────────────────────────────────────────────────────────
//

/// One answered question kept for reference in a chunk's bounded history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
}

impl QuestionRecord {
    #[must_use]
    pub fn new(text: &str, correct: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            question: text.chars().take(QUESTION_TEXT_LIMIT).collect(),
            correct,
            timestamp,
        }
    }
}

//
// ─── CHUNK RECORD ──────────────────────────────────────────────────────────────
//

/// Per-chunk quiz performance counters and recent-question history.
///
/// Invariant: `attempts == correct + incorrect`. Every field defaults so
/// snapshots written before a field existed still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub incorrect: u32,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_attempt: Option<DateTime<Utc>>,
    /// Freeform description of the chunk's content location, set once at creation.
    #[serde(default)]
    pub source_reference: String,
    /// Display filename; may be backfilled later, never overwritten once set.
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

impl ChunkRecord {
    /// Creates a fresh record for a chunk first seen through an answer.
    #[must_use]
    pub fn new(source_reference: impl Into<String>, filename: Option<&str>) -> Self {
        Self {
            source_reference: source_reference.into(),
            filename: resolved_filename(filename).map(str::to_string),
            ..Self::default()
        }
    }

    /// Counts one answer and stamps the attempt time.
    pub fn record(&mut self, is_correct: bool, at: DateTime<Utc>) {
        self.attempts = self.attempts.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        } else {
            self.incorrect = self.incorrect.saturating_add(1);
        }
        self.last_attempt = Some(at);
    }

    /// Appends a question to the bounded history, evicting the oldest entries.
    pub fn push_question(&mut self, text: &str, correct: bool, at: DateTime<Utc>) {
        self.questions.push(QuestionRecord::new(text, correct, at));
        if self.questions.len() > QUESTION_HISTORY_LIMIT {
            let excess = self.questions.len() - QUESTION_HISTORY_LIMIT;
            self.questions.drain(..excess);
        }
    }

    /// Backfills the display filename if none is set yet. Placeholder and
    /// empty candidates are ignored; an existing filename is never replaced.
    pub fn fill_filename(&mut self, candidate: Option<&str>) {
        if self.filename.is_none() {
            self.filename = resolved_filename(candidate).map(str::to_string);
        }
    }

    /// Percentage of correct answers, `0.0` when never attempted.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        super::metrics::accuracy(self.correct, self.attempts)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
