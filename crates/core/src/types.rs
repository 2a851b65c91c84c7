/// Frame indices are parsed from the platform's string-keyed label maps.
pub type FrameIndex = u32;

/// Integer precedence derived from an ontology node's dotted id
/// (`"1.2.3"` -> `123`).
pub type Precedence = u64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
