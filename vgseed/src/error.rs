//! Errors raised while indexing, matching or persisting seed-finder state.

use std::fmt::{self, Display, Formatter};
use std::io;

use seqgraph::GraphError;

#[derive(Debug)]
pub enum SeedFinderError {
    /// Propagated from the underlying graph/path layer.
    Graph(GraphError),
    /// A persisted file set failed to open, or didn't match the expected magic/version.
    Io(io::Error),
    /// A starting-loci or path-index file's header didn't match what this build expects.
    BadFormat(String),
    /// A direction/index-kind pairing other than ESA+Forward or FM-index+Reversed was requested.
    IncompatibleIndexKind,
    /// The pairing is valid per `IndexKind::is_compatible_with`, but this build only links an
    /// enhanced-suffix-array backend -- an FM-index-backed (Reversed) path-index was requested.
    IndexKindUnavailable,
    /// An operation that requires a built index was called before `create_index`.
    IndexNotBuilt,
}

impl Display for SeedFinderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::BadFormat(reason) => write!(f, "bad file format: {reason}"),
            Self::IncompatibleIndexKind => {
                write!(f, "index kind is incompatible with the requested direction")
            }
            Self::IndexKindUnavailable => {
                write!(f, "this build has no FM-index backend; only Forward/EnhancedSuffixArray path-indices are supported")
            }
            Self::IndexNotBuilt => write!(f, "operation requires create_index to have run first"),
        }
    }
}

impl std::error::Error for SeedFinderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphError> for SeedFinderError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

impl From<io::Error> for SeedFinderError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, SeedFinderError>;
