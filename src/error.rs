use displaydoc::Display;
use thiserror::Error;

/// An error while applying a result map to JSON data.
///
/// These never escape the merge engine, which absorbs and logs them. They are
/// returned as-is to callers of the mapper itself, and to variables mapping,
/// so those callers can tell a failed mapping apart from an empty one.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum MappingError {
    /// Invalid path '{path}': {reason}
    InvalidPath {
        /// The path as written in the map.
        path: String,

        /// The reason the path does not parse.
        reason: String,
    },

    /// Invalid content at '{path}': {reason}
    InvalidContent {
        /// The path whose traversal hit a value of the wrong shape.
        path: String,

        /// What was expected at that point.
        reason: String,
    },

    /// Write conflict at '{path}': {reason}
    WriteConflict {
        /// The destination path that could not be written.
        path: String,

        /// The shape already present at the destination.
        reason: String,
    },

    /// Flattened destination '{path}' requires a flattened source
    FlattenedDestination {
        /// The destination path containing the `[]` segment.
        path: String,
    },
}
