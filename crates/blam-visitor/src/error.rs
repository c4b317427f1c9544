//! Error types for visitor dispatch

use std::fmt;

use blam_cache::TagClass;
use thiserror::Error;

/// Error returned by a visitor callback
pub type VisitError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a visitor callback
pub type VisitResult = std::result::Result<(), VisitError>;

/// Result type for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Callback phase of a visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitPhase {
    /// Before any entry is visited
    Begin,
    /// Visiting the matching entries
    Visit,
    /// After all entries were visited
    End,
}

impl fmt::Display for VisitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "begin"),
            Self::Visit => write!(f, "visit"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Dispatcher errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Registering a visitor would close a dependency cycle
    #[error("visitor dependencies form a cycle through {}", class_list(.classes))]
    DependencyCycle {
        /// Visited classes of the visitors that could not be scheduled
        classes: Vec<TagClass>,
    },

    /// A visitor callback failed; the rest of the batch was not run
    #[error("visitor for '{class}' failed in {phase}: {source}")]
    Visitor {
        /// Class the failing visitor processes
        class: TagClass,
        /// Phase that failed
        phase: VisitPhase,
        /// Error returned by the callback
        #[source]
        source: VisitError,
    },
}

impl DispatchError {
    /// Class of the visitor that failed, if a callback failed
    pub fn failed_class(&self) -> Option<TagClass> {
        match self {
            Self::Visitor { class, .. } => Some(*class),
            Self::DependencyCycle { .. } => None,
        }
    }
}

fn class_list(classes: &[TagClass]) -> String {
    classes
        .iter()
        .map(|class| format!("'{class}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let cycle = DispatchError::DependencyCycle {
            classes: vec![TagClass::BITMAP, TagClass::SHADER],
        };
        assert_eq!(
            cycle.to_string(),
            "visitor dependencies form a cycle through 'bitm', 'shdr'"
        );
        assert_eq!(cycle.failed_class(), None);

        let failed = DispatchError::Visitor {
            class: TagClass::SCENARIO,
            phase: VisitPhase::End,
            source: "upload failed".into(),
        };
        assert_eq!(failed.to_string(), "visitor for 'scnr' failed in end: upload failed");
        assert_eq!(failed.failed_class(), Some(TagClass::SCENARIO));
    }
}
