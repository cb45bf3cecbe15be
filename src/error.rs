use crate::location::Location;
use std::fmt::{Debug, Display, Formatter};

/// The error taxonomy from spec.md §7.
///
/// Matches the teacher's hand-written `Display`-only error style
/// (`error.rs`'s `ParseError`/`ImplementationError`): no `thiserror`, a
/// manual `Display`, and a manual `std::error::Error` impl so the type
/// still composes with `?` and `Box<dyn Error>` call sites.
#[derive(Debug)]
pub enum CfgError {
    /// A lexical violation: bad number, bad escape, unterminated quote,
    /// unexpected character. Not resumable.
    Tokenizer { message: String, at: Location },
    /// A syntactic violation.
    Parser { message: String, at: Location },
    /// A malformed path string, wrapping the inner cause.
    InvalidPath {
        path: String,
        cause: Option<Box<CfgError>>,
    },
    /// Wrong index type, out-of-range index, or slicing a non-list.
    BadIndex { message: String, at: Option<Location> },
    /// A cycle among `${...}` references.
    CircularReference { message: String },
    /// Any other evaluation failure.
    Config {
        message: String,
        at: Option<Location>,
    },
}

impl CfgError {
    pub fn tokenizer(message: impl Into<String>, at: Location) -> Self {
        CfgError::Tokenizer {
            message: message.into(),
            at,
        }
    }

    pub fn parser(message: impl Into<String>, at: Location) -> Self {
        CfgError::Parser {
            message: message.into(),
            at,
        }
    }

    pub fn invalid_path(path: impl Into<String>, cause: Option<CfgError>) -> Self {
        CfgError::InvalidPath {
            path: path.into(),
            cause: cause.map(Box::new),
        }
    }

    pub fn bad_index(message: impl Into<String>, at: Option<Location>) -> Self {
        CfgError::BadIndex {
            message: message.into(),
            at,
        }
    }

    pub fn circular_reference(message: impl Into<String>) -> Self {
        CfgError::CircularReference {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        CfgError::Config {
            message: message.into(),
            at: None,
        }
    }

    pub fn config_at(message: impl Into<String>, at: Location) -> Self {
        CfgError::Config {
            message: message.into(),
            at: Some(at),
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            CfgError::Tokenizer { at, .. } => Some(*at),
            CfgError::Parser { at, .. } => Some(*at),
            CfgError::InvalidPath { cause, .. } => cause.as_ref().and_then(|c| c.location()),
            CfgError::BadIndex { at, .. } => *at,
            CfgError::CircularReference { .. } => None,
            CfgError::Config { at, .. } => *at,
        }
    }

    /// Whether this error must always propagate out of `get`, even when
    /// a default was supplied (spec.md §7's propagation policy).
    pub fn always_propagates(&self) -> bool {
        matches!(
            self,
            CfgError::InvalidPath { .. }
                | CfgError::BadIndex { .. }
                | CfgError::CircularReference { .. }
        )
    }
}

impl Display for CfgError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CfgError::Tokenizer { message, at } => {
                write!(f, "TokenizerError: {} at {}", message, at)
            }
            CfgError::Parser { message, at } => write!(f, "ParserError: {} at {}", message, at),
            CfgError::InvalidPath { path, .. } => write!(f, "Invalid path: {}", path),
            CfgError::BadIndex { message, at } => match at {
                Some(loc) => write!(f, "{} at {}", message, loc),
                None => write!(f, "{}", message),
            },
            CfgError::CircularReference { message } => {
                write!(f, "Circular reference: {}", message)
            }
            CfgError::Config { message, at } => match at {
                Some(loc) => write!(f, "{} at {}", message, loc),
                None => write!(f, "{}", message),
            },
        }
    }
}

impl std::error::Error for CfgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CfgError::InvalidPath { cause, .. } => {
                cause.as_deref().map(|c| c as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_display_is_literal() {
        let err = CfgError::invalid_path("a..b", None);
        assert_eq!(format!("{}", err), "Invalid path: a..b");
    }

    #[test]
    fn invalid_path_bad_index_and_circular_always_propagate() {
        assert!(CfgError::invalid_path("x", None).always_propagates());
        assert!(CfgError::bad_index("nope", None).always_propagates());
        assert!(CfgError::circular_reference("a, b").always_propagates());
        assert!(!CfgError::config("nope").always_propagates());
    }
}
