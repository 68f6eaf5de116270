mod chunk;
mod ids;
mod metrics;
mod rollup;

pub use chunk::{
    ChunkRecord, QUESTION_HISTORY_LIMIT, QUESTION_TEXT_LIMIT, QuestionRecord,
    UNKNOWN_FILE_SENTINEL, resolved_filename,
};
pub use ids::{CHUNK_KEY_SEPARATOR, ChunkKey, ChunkNumber, FileBucket, FileId};
pub use metrics::{AreaReport, ChunkMetrics, PerformanceSummary, accuracy};
pub use rollup::FileRollup;
