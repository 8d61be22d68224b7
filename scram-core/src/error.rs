//! Structured error kinds for the analysis core.

use thiserror::Error;

/// Where in the model an error was raised, when the location is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locus {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub element: Option<String>,
    pub attribute: Option<String>,
    pub offending_value: Option<String>,
}

impl Locus {
    pub fn element(name: impl Into<String>) -> Self {
        Locus { element: Some(name.into()), ..Default::default() }
    }

    pub fn attribute(mut self, attr: impl Into<String>) -> Self {
        self.attribute = Some(attr.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.offending_value = Some(value.into());
        self
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(file) = &self.file {
            parts.push(format!("file={file}"));
        }
        if let Some(line) = self.line {
            parts.push(format!("line={line}"));
        }
        if let Some(element) = &self.element {
            parts.push(format!("element={element}"));
        }
        if let Some(attribute) = &self.attribute {
            parts.push(format!("attribute={attribute}"));
        }
        if let Some(value) = &self.offending_value {
            parts.push(format!("value={value}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// The complete error kind hierarchy of the analysis core.
#[derive(Debug, Error)]
pub enum ScramError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error ({locus}): {message}")]
    Parse { message: String, locus: Locus },

    #[error("validity error ({locus}): {message}")]
    Validity { message: String, locus: Locus },

    #[error("cycle detected ({locus}): {cycle:?}")]
    Cycle { cycle: Vec<String>, locus: Locus },

    #[error("domain error ({locus}): {message}")]
    Domain { message: String, locus: Locus },

    #[error("settings error: {message}")]
    Settings { message: String },

    #[error("internal logic error: {message}")]
    Logic { message: String },

    #[error("analysis cancelled")]
    Cancelled,
}

impl ScramError {
    pub fn parse(message: impl Into<String>) -> Self {
        ScramError::Parse { message: message.into(), locus: Locus::default() }
    }

    pub fn parse_at(message: impl Into<String>, locus: Locus) -> Self {
        ScramError::Parse { message: message.into(), locus }
    }

    pub fn validity(message: impl Into<String>, locus: Locus) -> Self {
        ScramError::Validity { message: message.into(), locus }
    }

    pub fn domain(message: impl Into<String>, locus: Locus) -> Self {
        ScramError::Domain { message: message.into(), locus }
    }

    pub fn logic(message: impl Into<String>) -> Self {
        ScramError::Logic { message: message.into() }
    }

    pub fn settings(message: impl Into<String>) -> Self {
        ScramError::Settings { message: message.into() }
    }

    /// Process exit code for the CLI binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScramError::Io(_) | ScramError::Parse { .. } | ScramError::Validity { .. }
            | ScramError::Cycle { .. } | ScramError::Settings { .. } => 1,
            ScramError::Domain { .. } | ScramError::Logic { .. } => 2,
            ScramError::Cancelled => 3,
        }
    }
}

pub type ScramResult<T> = Result<T, ScramError>;
