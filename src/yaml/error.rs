//! Error types for YAML tree operations.
//!
//! Besides the plain variants, [`Error::Located`] decorates any error with
//! the position of the node it is about (and optionally a file name), so
//! callers get `file.yml:2:8 at "abc": ...` style messages without the
//! core needing to know where a tree came from.

use super::node::NodeRef;
use std::fmt;
use std::io;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for YAML tree operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error while loading a document
    #[error("{0}")]
    Io(#[from] io::Error),
    /// Error from the fyaml decoder/encoder
    #[error("{0}")]
    Parse(String),
    /// Path could not be built or followed
    #[error("{0}")]
    Path(String),
    /// Operation called on a node of the wrong kind
    #[error("{0}")]
    Type(String),
    /// Tree invariant violation (odd mapping content, ...)
    #[error("{0}")]
    Shape(String),
    /// Generic error, typically raised by a caller supplied callback
    #[error("{0}")]
    Base(String),
    /// Returned by a `range_map` callback to stop iterating without error.
    #[error("stop ranging")]
    StopRange,
    /// Any of the above, with the location it relates to.
    #[error("{location}: {source}")]
    Located {
        location: Location,
        source: Box<Error>,
    },
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Base(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Base(e.to_string())
    }
}

// =============================================================================
// Location decoration
// =============================================================================

/// Where in a document an error happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub filename: Option<String>,
    pub line: usize,
    pub column: usize,
    /// Scalar value of the offending node, if any.
    pub context: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            match &self.filename {
                Some(name) => write!(f, "{}:", name)?,
                None => write!(f, "line ")?,
            }
            write!(f, "{}", self.line)?;
            if self.column > 0 {
                write!(f, ":{}", self.column)?;
            }
        } else if let Some(name) = &self.filename {
            write!(f, "{}", name)?;
        }
        if !self.context.is_empty() {
            write!(f, " at {:?}", self.context)?;
        }
        Ok(())
    }
}

impl Error {
    /// Attach the position and value of `node` to this error.
    ///
    /// An already located error keeps its file name and gets its position
    /// replaced. Nodes built in memory (no position, no value) leave the
    /// error untouched, located or not.
    pub fn at(self, node: &NodeRef) -> Error {
        let (line, column, context) = {
            let n = node.borrow();
            (n.line, n.column, n.value.clone())
        };
        if line == 0 && context.is_empty() {
            return self;
        }
        match self {
            Error::Located {
                mut location,
                source,
            } => {
                location.line = line;
                location.column = column;
                location.context = context;
                Error::Located { location, source }
            }
            other => Error::Located {
                location: Location {
                    filename: None,
                    line,
                    column,
                    context,
                },
                source: Box::new(other),
            },
        }
    }

    /// Attach a file name to this error.
    pub fn with_filename(self, filename: &str) -> Error {
        match self {
            Error::Located {
                mut location,
                source,
            } => {
                location.filename = Some(filename.to_string());
                Error::Located { location, source }
            }
            other => Error::Located {
                location: Location {
                    filename: Some(filename.to_string()),
                    ..Default::default()
                },
                source: Box::new(other),
            },
        }
    }

    /// The undecorated error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Located { source, .. } => source.root(),
            other => other,
        }
    }

    /// The location attached by [`Error::at`] or [`Error::with_filename`].
    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::Located { location, .. } => Some(location),
            _ => None,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self.root(), Error::StopRange)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
