//! Error and warning types.

use crate::schema::ClassId;
use std::fmt;
use thiserror::Error;

/// Errors raised while building a model context or generating a value.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The model context failed validation.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A type variable was referenced with no binding in the effective type map.
    #[error("Unresolved type variable '{variable}'\n\n{path}")]
    UnresolvedTypeVariable { variable: String, path: PathToRoot },

    /// A record node has no usable construction strategy.
    #[error("Cannot construct {class}: {reason}\n\n{path}")]
    UnconstructibleType {
        class: ClassId,
        reason: String,
        path: PathToRoot,
    },

    /// A user producer returned a value that does not fit the target.
    #[error("Error assigning value to: {target}\n\n{path}\n\n{mismatch}", target = path.target())]
    ProducerRejection {
        mismatch: TypeMismatch,
        path: PathToRoot,
    },

    /// A producer reported a domain error.
    #[error("Producer failed: {source}\n\n{path}")]
    Producer {
        #[source]
        source: ProducerError,
        path: PathToRoot,
    },

    /// A class declaration could not be turned into a schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl GenerationError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an unconstructible type error.
    pub fn unconstructible(class: ClassId, reason: impl Into<String>, path: PathToRoot) -> Self {
        Self::UnconstructibleType {
            class,
            reason: reason.into(),
            path,
        }
    }

    /// The path to root carried by the error, if any.
    pub fn path(&self) -> Option<&PathToRoot> {
        match self {
            Self::UnresolvedTypeVariable { path, .. }
            | Self::UnconstructibleType { path, .. }
            | Self::ProducerRejection { path, .. }
            | Self::Producer { path, .. } => Some(path),
            Self::InvalidConfiguration { .. } | Self::Schema(_) => None,
        }
    }
}

/// Domain errors reported by leaf producers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProducerError {
    #[error("invalid {what} hint: min {min} is greater than max {max}")]
    InvalidHint {
        what: &'static str,
        min: String,
        max: String,
    },
}

impl ProducerError {
    pub fn invalid_hint(what: &'static str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::InvalidHint {
            what,
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

/// Errors in class declarations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Invalid type expression '{text}': {message}")]
    Syntax { text: String, message: String },

    #[error("Class '{class}' is declared more than once")]
    DuplicateClass { class: String },

    #[error("Class '{referenced_by}' refers to unknown class '{class}'")]
    UnknownClass { class: String, referenced_by: String },

    #[error("Class '{class}' declares {expected} type parameters but {found} were supplied")]
    ArityMismatch {
        class: String,
        expected: usize,
        found: usize,
    },
}

impl SchemaError {
    pub fn syntax(text: &str, message: impl Into<String>) -> Self {
        Self::Syntax {
            text: text.to_string(),
            message: message.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Diagnostics
// ----------------------------------------------------------------------------

/// One step of a path to root: `<depth:class: field>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub depth: usize,
    pub class: String,
    /// Declared type and name of the field, e.g. `Map<Integer, Item<String>> map1`.
    pub field: Option<String>,
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "<{}:{}: {}>", self.depth, self.class, field),
            None => write!(f, "<{}:{}>", self.depth, self.class),
        }
    }
}

/// Ordered sequence of entries from the failing node up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathToRoot {
    entries: Vec<PathEntry>,
}

impl PathToRoot {
    pub fn new(entries: Vec<PathEntry>) -> Self {
        Self { entries }
    }

    /// Entries, innermost first.
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Human description of the innermost node.
    pub fn target(&self) -> String {
        match self.entries.first() {
            Some(PathEntry {
                depth,
                class,
                field: Some(field),
            }) => format!("field {}.{} (depth={})", class, field_name(field), depth),
            Some(PathEntry { depth, class, .. }) => format!("{} (depth={})", class, depth),
            None => "<unknown>".to_string(),
        }
    }
}

fn field_name(field: &str) -> &str {
    field.rsplit(' ').next().unwrap_or(field)
}

impl fmt::Display for PathToRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " │ Path to root:")?;
        let last = self.entries.len().saturating_sub(1);
        for (i, entry) in self.entries.iter().enumerate() {
            let indent = if i == 0 {
                "   ".to_string()
            } else {
                format!("{}└──", " ".repeat(3 + (i - 1) * 3 + 1))
            };
            if i == last {
                writeln!(f, " │ {}{}   <-- Root", indent, entry)?;
            } else {
                writeln!(f, " │ {}{}", indent, entry)?;
            }
        }
        writeln!(f, " │")?;
        write!(f, " │ Format: <depth:class: field>")
    }
}

/// Details of a rejected producer value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    /// Target field (or type) with its declaring class.
    pub target: String,
    pub provided_type: String,
    pub provided_value: String,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Type mismatch:")?;
        writeln!(f)?;
        writeln!(f, " -> Target field .............: {}", self.target)?;
        writeln!(f, " -> Provided argument type ...: {}", self.provided_type)?;
        write!(f, " -> Provided argument value ..: {}", self.provided_value)
    }
}

/// Non-fatal anomalies observed during generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A set or map stopped short of its target size because of collisions.
    PartiallyFilledContainer {
        path: PathToRoot,
        requested: usize,
        actual: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PartiallyFilledContainer {
                path,
                requested,
                actual,
            } => write!(
                f,
                "container at {} filled to {} of {} requested elements",
                path.target(),
                actual,
                requested
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> PathToRoot {
        PathToRoot::new(vec![
            PathEntry {
                depth: 1,
                class: "Owner".to_string(),
                field: Some("Map<Integer, Item<String>> map1".to_string()),
            },
            PathEntry {
                depth: 0,
                class: "Owner".to_string(),
                field: None,
            },
        ])
    }

    #[test]
    fn test_path_lines() {
        assert_eq!(
            path().lines(),
            vec!["<1:Owner: Map<Integer, Item<String>> map1>", "<0:Owner>"]
        );
        assert_eq!(path().target(), "field Owner.map1 (depth=1)");
    }

    #[test]
    fn test_path_display_marks_root() {
        let rendered = path().to_string();
        assert!(rendered.contains("<1:Owner: Map<Integer, Item<String>> map1>"));
        assert!(rendered.contains("└──<0:Owner>   <-- Root"));
        assert!(rendered.ends_with("Format: <depth:class: field>"));
    }

    #[test]
    fn test_producer_error_message() {
        let err = ProducerError::invalid_hint("size", 5, 2);
        assert_eq!(err.to_string(), "invalid size hint: min 5 is greater than max 2");
    }
}
