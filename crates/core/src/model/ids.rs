use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Separator embedded in indexed chunk keys. Every parse of the key format
/// goes through `ChunkKey::file_bucket` / `ChunkKey::chunk_number`.
pub const CHUNK_KEY_SEPARATOR: &str = "_chunk_";

/// Slug fallback keys keep at most this many characters of the reference.
const SLUG_MAX_CHARS: usize = 50;

//
// ─── FILE ID ───────────────────────────────────────────────────────────────────
//

/// Short content-derived identifier standing in for a filename.
///
/// Derived identifiers are the first 8 hex characters of a SHA-256 digest of
/// the filename: a collision-tolerant shortening, not a cryptographic
/// commitment. The identifier is not reversible; the file registry is the
/// only authoritative reverse lookup.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Derives the identifier for a filename.
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        let digest = Sha256::digest(filename.as_bytes());
        let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        Self(format!("{word:08x}"))
    }

    /// Wraps an identifier recovered from a persisted key prefix.
    ///
    /// No shape is enforced here: ledger keys written by older versions may
    /// carry prefixes that are not 8-hex digests, and they still bucket by
    /// that prefix.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── CHUNK NUMBER ──────────────────────────────────────────────────────────────
//

/// Position of a chunk within its file, when the source reference named one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkNumber {
    Numbered(u32),
    Unknown,
}

impl ChunkNumber {
    /// Parses the suffix of an indexed key. Anything that is not a plain
    /// integer reads as `Unknown`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u32>() {
            Ok(n) => Self::Numbered(n),
            Err(_) => Self::Unknown,
        }
    }
}

impl fmt::Display for ChunkNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkNumber::Numbered(n) => write!(f, "{n}"),
            ChunkNumber::Unknown => write!(f, "unknown"),
        }
    }
}

//
// ─── CHUNK KEY ─────────────────────────────────────────────────────────────────
//

/// Stable identifier indexing the chunk performance ledger.
///
/// The canonical form is the persisted string, so keys written by any prior
/// version round-trip byte-for-byte. Keys built from a known filename encode
/// `{file_id}_chunk_{number}`; without a filename the key is a lowercased,
/// space-folded slug of the reference text, which aggregates under the
/// synthetic `unknown` bucket.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkKey(String);

impl ChunkKey {
    /// Wraps a key read back from persisted state.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Builds the indexed key for a chunk of a known file.
    #[must_use]
    pub fn indexed(file: &FileId, chunk: ChunkNumber) -> Self {
        Self(format!("{file}{CHUNK_KEY_SEPARATOR}{chunk}"))
    }

    /// Builds the slug fallback key from a raw source reference.
    #[must_use]
    pub fn slug_of(reference: &str) -> Self {
        let head: String = reference.chars().take(SLUG_MAX_CHARS).collect();
        Self(head.replace(' ', "_").to_lowercase())
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the aggregation bucket for this key: the prefix before the
    /// first `_chunk_` occurrence, or `Unknown` when the separator is absent.
    #[must_use]
    pub fn file_bucket(&self) -> FileBucket {
        match self.0.split_once(CHUNK_KEY_SEPARATOR) {
            Some((prefix, _)) => FileBucket::File(FileId::new(prefix)),
            None => FileBucket::Unknown,
        }
    }

    /// Returns the chunk number encoded in the key suffix, if any.
    #[must_use]
    pub fn chunk_number(&self) -> ChunkNumber {
        match self.0.split_once(CHUNK_KEY_SEPARATOR) {
            Some((_, suffix)) => ChunkNumber::parse(suffix),
            None => ChunkNumber::Unknown,
        }
    }
}

impl fmt::Debug for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkKey({})", self.0)
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── FILE BUCKET ───────────────────────────────────────────────────────────────
//

/// Aggregation bucket for per-file rollups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileBucket {
    File(FileId),
    /// Synthetic bucket for keys that carry no file identifier.
    Unknown,
}

impl FileBucket {
    /// Returns the file identifier for real-file buckets.
    #[must_use]
    pub fn file_id(&self) -> Option<&FileId> {
        match self {
            FileBucket::File(id) => Some(id),
            FileBucket::Unknown => None,
        }
    }
}

impl fmt::Display for FileBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileBucket::File(id) => write!(f, "{id}"),
            FileBucket::Unknown => write!(f, "unknown"),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_is_eight_lowercase_hex_chars() {
        let id = FileId::from_filename("doc.pdf");
        assert_eq!(id.as_str().len(), 8);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!id.as_str().chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn file_id_is_deterministic_per_filename() {
        assert_eq!(
            FileId::from_filename("doc.pdf"),
            FileId::from_filename("doc.pdf")
        );
        assert_ne!(
            FileId::from_filename("doc.pdf"),
            FileId::from_filename("other.pdf")
        );
    }

    #[test]
    fn indexed_key_embeds_file_and_number() {
        let id = FileId::new("abc12345");
        let key = ChunkKey::indexed(&id, ChunkNumber::Numbered(3));
        assert_eq!(key.as_str(), "abc12345_chunk_3");
        assert_eq!(key.file_bucket(), FileBucket::File(FileId::new("abc12345")));
        assert_eq!(key.chunk_number(), ChunkNumber::Numbered(3));
    }

    #[test]
    fn indexed_key_without_number_uses_unknown_suffix() {
        let id = FileId::new("abc12345");
        let key = ChunkKey::indexed(&id, ChunkNumber::Unknown);
        assert_eq!(key.as_str(), "abc12345_chunk_unknown");
        assert_eq!(key.chunk_number(), ChunkNumber::Unknown);
        assert_eq!(key.file_bucket(), FileBucket::File(id));
    }

    #[test]
    fn slug_key_is_lowercased_and_bounded() {
        let key = ChunkKey::slug_of("Some Free Text Without Any Marker");
        assert_eq!(key.as_str(), "some_free_text_without_any_marker");
        assert!(!key.as_str().contains(CHUNK_KEY_SEPARATOR));
        assert_eq!(key.file_bucket(), FileBucket::Unknown);

        let long = "x".repeat(80);
        assert_eq!(ChunkKey::slug_of(&long).as_str().len(), 50);
    }

    #[test]
    fn legacy_key_buckets_by_raw_prefix() {
        let key = ChunkKey::new("weird_chunk_xyz");
        assert_eq!(key.file_bucket(), FileBucket::File(FileId::new("weird")));
        assert_eq!(key.chunk_number(), ChunkNumber::Unknown);
    }

    #[test]
    fn keys_serialize_as_plain_strings() {
        let key = ChunkKey::new("abc12345_chunk_1");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"abc12345_chunk_1\"");
        let back: ChunkKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn bucket_displays_unknown_for_unbucketed_keys() {
        assert_eq!(FileBucket::Unknown.to_string(), "unknown");
        assert_eq!(FileBucket::File(FileId::new("abc")).to_string(), "abc");
    }
}
