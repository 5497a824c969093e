//! Forensics: Interaction Log, Preference Export and Benchmarks
//!
//! Everything that observes the router from the outside lives here. The
//! routing core never calls into this module; callers decide what to record.
//!
//! ```text
//! ask + feedback ──► InteractionLogger ──► routing_events.jsonl
//!                                               │
//!                                               ▼
//!                               export_preference_pairs ──► pairs.jsonl
//! ```

pub mod benchmark;
pub mod dpo;
pub mod logger;

pub use benchmark::{
    percentile, reference_cases, render_markdown, run_benchmark, BenchmarkCase, BenchmarkReport,
};
pub use dpo::{export_preference_pairs, pair_from_record, ExportError, PairSource, PreferencePair};
pub use logger::{
    read_records, Feedback, InteractionLogger, InteractionRecord, LogError, RecordStream,
    DEFAULT_LOG_PATH,
};
