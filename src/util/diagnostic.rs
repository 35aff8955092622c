//! User-friendly diagnostic messages.
//!
//! Every error shown to the user names the offending value, says where it
//! came from and, when there is one, suggests a fix.

use std::fmt;
use std::path::PathBuf;

use crate::classify::ClassifyError;
use crate::core::project::ModelError;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a target name is empty.
    pub const EMPTY_TARGET: &str = "Give every [[target]] a non-empty `name`";

    /// Suggestion when a target is not part of the model.
    pub const UNKNOWN_TARGET: &str = "Check the target names declared in the flag description";

    /// Suggestion when a target is declared twice.
    pub const DUPLICATE_TARGET: &str = "Rename or merge the duplicated [[target]] entries";

    /// Suggestion when the back end or variant cannot be determined.
    pub const PICK_BACKEND: &str =
        "Set `backend` in [project] or pass `--backend`; run `idegen backends` for the list";

    /// Suggestion when lines were dropped during generation.
    pub const VERBOSE: &str = "Run again with `--verbose` to see each skipped line";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Build a diagnostic from an error chain.
    ///
    /// The outermost message becomes the headline, every cause a context
    /// line. Contract violations from the model get a matching suggestion.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let mut diag = Diagnostic::error(err.to_string());
        for cause in err.chain().skip(1) {
            diag = diag.with_context(cause.to_string());
        }

        let model_error = err.chain().find_map(|cause| {
            if let Some(ClassifyError::Model(inner)) = cause.downcast_ref::<ClassifyError>() {
                return Some(inner);
            }
            cause.downcast_ref::<ModelError>()
        });
        match model_error {
            Some(ModelError::EmptyTargetName) => diag.with_suggestion(suggestions::EMPTY_TARGET),
            Some(ModelError::UnknownTarget(_)) => diag.with_suggestion(suggestions::UNKNOWN_TARGET),
            Some(ModelError::DuplicateTarget(_)) => {
                diag.with_suggestion(suggestions::DUPLICATE_TARGET)
            }
            None => diag,
        }
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
